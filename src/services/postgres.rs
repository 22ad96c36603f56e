use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;

use crate::models::{Account, SecondaryKey};
use crate::services::store::{AccountPage, AccountStore, StoreError};

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid document for account {0}: {1}")]
    InvalidDocument(String, serde_json::Error),
}

/// Account store keeping each account as a JSONB document
///
/// The `accounts` table mirrors a document collection: the document body is
/// opaque JSON and only the id and device address are lifted into columns
/// for lookups.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout_secs: u64,
        idle_timeout_secs: u64,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(idle_timeout_secs))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL account store");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            acquire_timeout_secs.unwrap_or(5),
            idle_timeout_secs.unwrap_or(600),
        )
        .await
    }

    /// Insert or replace an account document
    ///
    /// Used for seeding; the engine itself never writes accounts.
    pub async fn upsert(&self, account: &Account) -> Result<(), PostgresError> {
        let document = serde_json::to_value(account)
            .map_err(|e| PostgresError::InvalidDocument(account.id.clone(), e))?;

        let query = r#"
            INSERT INTO accounts (id, document, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (id)
            DO UPDATE SET
                document = EXCLUDED.document,
                updated_at = EXCLUDED.updated_at
        "#;

        sqlx::query(query)
            .bind(&account.id)
            .bind(document)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Upserted account document: {}", account.id);

        Ok(())
    }

    async fn fetch_one(&self, query: &str, value: &str) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query(query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(PostgresError::from)?;

        match row {
            Some(row) => decode_document(row.get("id"), row.get("document")).map(Some),
            None => Ok(None),
        }
    }
}

fn decode_document(id: String, document: serde_json::Value) -> Result<Account, StoreError> {
    serde_json::from_value(document).map_err(|e| StoreError::MalformedDocument {
        account_id: id,
        detail: e.to_string(),
    })
}

#[async_trait]
impl AccountStore for PostgresClient {
    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, StoreError> {
        let query = r#"
            SELECT id, document
            FROM accounts
            WHERE id = $1
        "#;

        self.fetch_one(query, id).await
    }

    async fn find_by_secondary_key(
        &self,
        key: SecondaryKey,
        value: &str,
    ) -> Result<Option<Account>, StoreError> {
        let query = match key {
            SecondaryKey::MacAddress => {
                r#"
                SELECT id, document
                FROM accounts
                WHERE mac_address = $1
                LIMIT 1
                "#
            }
        };

        self.fetch_one(query, value).await
    }

    async fn scan_page(
        &self,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<AccountPage, StoreError> {
        let limit = limit.max(1);
        let query = r#"
            SELECT id, document
            FROM accounts
            WHERE $1::TEXT IS NULL OR id > $1
            ORDER BY id
            LIMIT $2
        "#;

        let rows = sqlx::query(query)
            .bind(cursor)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(PostgresError::from)?;

        let next_cursor = if rows.len() == limit {
            rows.last().map(|row| row.get::<String, _>("id"))
        } else {
            None
        };

        let mut accounts = Vec::with_capacity(rows.len());
        let mut unreadable: Vec<String> = Vec::new();
        for row in &rows {
            match decode_document(row.get("id"), row.get("document")) {
                Ok(account) => accounts.push(account),
                Err(e) => {
                    tracing::warn!("{}", e);
                    unreadable.push(row.get("id"));
                }
            }
        }

        Ok(AccountPage {
            accounts,
            unreadable,
            next_cursor,
        })
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(|e| PostgresError::from(e).into())
    }
}
