use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Account, SecondaryKey};
use crate::services::appwrite::AppwriteError;
use crate::services::postgres::PostgresError;

/// Errors surfaced by an account store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Appwrite store error: {0}")]
    Appwrite(#[from] AppwriteError),

    #[error("PostgreSQL store error: {0}")]
    Postgres(#[from] PostgresError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The stored document exists but does not decode as an account
    #[error("Unreadable document for account {account_id}: {detail}")]
    MalformedDocument { account_id: String, detail: String },
}

/// One page of a full-collection scan
#[derive(Debug, Clone, Default)]
pub struct AccountPage {
    pub accounts: Vec<Account>,
    /// Ids of documents in this page that did not decode as accounts
    pub unreadable: Vec<String>,
    /// Opaque cursor for the next page, `None` once the scan is exhausted
    pub next_cursor: Option<String>,
}

/// Read access to the externally owned account collection
///
/// Lookups return `Ok(None)` when the account does not exist; callers decide
/// whether absence is an error.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Point lookup by account id
    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, StoreError>;

    /// Lookup by a secondary identifier such as the device address
    async fn find_by_secondary_key(
        &self,
        key: SecondaryKey,
        value: &str,
    ) -> Result<Option<Account>, StoreError>;

    /// Fetch the page of accounts following `cursor` (or the first page)
    async fn scan_page(
        &self,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<AccountPage, StoreError>;

    /// Backend liveness check
    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}
