use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::models::{Account, SecondaryKey};
use crate::services::store::{AccountPage, AccountStore, StoreError};

/// Errors that can occur when interacting with Appwrite
#[derive(Debug, Error)]
pub enum AppwriteError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: invalid API key or token")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Collection IDs in Appwrite
#[derive(Debug, Clone)]
pub struct AppwriteCollections {
    pub accounts: String,
}

/// Account store backed by the Appwrite documents API
///
/// Account documents carry the legacy account attributes
/// (`id`, `friends`, `likeList`, `matchingList`, ...). Scans page
/// with `cursorAfter` on the document `$id`.
pub struct AppwriteClient {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    client: Client,
    collections: AppwriteCollections,
}

impl AppwriteClient {
    /// Create a new Appwrite client
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        database_id: String,
        collections: AppwriteCollections,
    ) -> Result<Self, AppwriteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            project_id,
            database_id,
            client,
            collections,
        })
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            self.collections.accounts
        )
    }

    /// List raw documents matching the given Appwrite query strings
    async fn list_documents(&self, queries: &[String]) -> Result<Vec<Value>, AppwriteError> {
        let query_string = queries
            .iter()
            .map(|q| format!("queries%5B%5D={}", urlencoding::encode(q)))
            .collect::<Vec<_>>()
            .join("&");

        let url = format!("{}?{}", self.documents_url(), query_string);

        tracing::debug!("Listing account documents with {} queries", queries.len());

        let response = self
            .client
            .get(&url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(AppwriteError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Appwrite document listing failed: {} - {}", status, body);
            return Err(AppwriteError::ApiError(format!(
                "Failed to list account documents: {}",
                status
            )));
        }

        let json: Value = response.json().await?;

        json.get("documents")
            .and_then(|d| d.as_array())
            .cloned()
            .ok_or_else(|| AppwriteError::InvalidResponse("Missing documents array".into()))
    }

    async fn find_one(&self, attribute: &str, value: &str) -> Result<Option<Account>, StoreError> {
        let queries = vec![equal_query(attribute, value), "limit(1)".to_string()];
        let documents = self.list_documents(&queries).await?;

        match documents.first() {
            Some(doc) => parse_account(doc)
                .map(Some)
                .map_err(|e| StoreError::MalformedDocument {
                    account_id: document_label(doc).to_string(),
                    detail: e.to_string(),
                }),
            None => Ok(None),
        }
    }
}

/// Build an Appwrite `equal` query with a JSON-escaped value
fn equal_query(attribute: &str, value: &str) -> String {
    format!("equal(\"{}\", [{}])", attribute, Value::String(value.to_string()))
}

fn document_id(doc: &Value) -> Option<&str> {
    doc.get("$id").and_then(Value::as_str)
}

/// Best available identifier for a document, for reporting
fn document_label(doc: &Value) -> &str {
    document_id(doc)
        .or_else(|| doc.get("id").and_then(Value::as_str))
        .unwrap_or("<unidentified>")
}

fn parse_account(doc: &Value) -> Result<Account, AppwriteError> {
    // Extract account data from Appwrite document format
    let data = doc.get("data").unwrap_or(doc);

    serde_json::from_value(data.clone())
        .map_err(|e| AppwriteError::InvalidResponse(format!("Failed to parse account: {}", e)))
}

#[async_trait]
impl AccountStore for AppwriteClient {
    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, StoreError> {
        tracing::debug!("Fetching account: {}", id);
        self.find_one("id", id).await
    }

    async fn find_by_secondary_key(
        &self,
        key: SecondaryKey,
        value: &str,
    ) -> Result<Option<Account>, StoreError> {
        tracing::debug!("Fetching account by {}", key.field_name());
        self.find_one(key.field_name(), value).await
    }

    async fn scan_page(
        &self,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<AccountPage, StoreError> {
        let limit = limit.max(1);
        let mut queries = vec![format!("limit({})", limit)];
        if let Some(after) = cursor {
            queries.push(format!("cursorAfter({})", Value::String(after.to_string())));
        }

        let documents = self.list_documents(&queries).await?;

        // A full page must end on a document id, or the scan would stop early
        let next_cursor = if documents.len() == limit {
            let last = documents.last().and_then(document_id).ok_or_else(|| {
                AppwriteError::InvalidResponse("Last document of a full page has no $id".into())
            })?;
            Some(last.to_string())
        } else {
            None
        };

        let mut accounts = Vec::with_capacity(documents.len());
        let mut unreadable: Vec<String> = Vec::new();
        for doc in &documents {
            match parse_account(doc) {
                Ok(account) => accounts.push(account),
                Err(e) => {
                    let label = document_label(doc);
                    tracing::warn!("Unreadable account document {}: {}", label, e);
                    unreadable.push(label.to_string());
                }
            }
        }

        tracing::debug!(
            "Scanned {} account documents ({} unreadable)",
            documents.len(),
            unreadable.len()
        );

        Ok(AccountPage {
            accounts,
            unreadable,
            next_cursor,
        })
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        self.list_documents(&["limit(1)".to_string()]).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const DOCUMENTS_PATH: &str = "/databases/test_db/collections/accounts/documents";

    fn client_for(server: &mockito::ServerGuard) -> AppwriteClient {
        AppwriteClient::new(
            server.url(),
            "test_key".to_string(),
            "test_project".to_string(),
            "test_db".to_string(),
            AppwriteCollections {
                accounts: "accounts".to_string(),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_appwrite_client_creation() {
        let client = AppwriteClient::new(
            "https://appwrite.test/v1/".to_string(),
            "test_key".to_string(),
            "test_project".to_string(),
            "test_db".to_string(),
            AppwriteCollections {
                accounts: "accounts".to_string(),
            },
        )
        .unwrap();

        assert_eq!(client.api_key, "test_key");
        assert_eq!(
            client.documents_url(),
            "https://appwrite.test/v1/databases/test_db/collections/accounts/documents"
        );
    }

    #[test]
    fn test_equal_query_escapes_value() {
        assert_eq!(equal_query("id", "alice"), r#"equal("id", ["alice"])"#);
        assert_eq!(equal_query("id", "a\"b"), r#"equal("id", ["a\"b"])"#);
    }

    #[tokio::test]
    async fn test_find_by_id_parses_document() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", DOCUMENTS_PATH)
            .match_query(Matcher::Any)
            .match_header("x-appwrite-project", "test_project")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "total": 1,
                    "documents": [{
                        "$id": "doc1",
                        "id": "alice",
                        "name": "Alice",
                        "phoneNumber": "010",
                        "friends": [{ "friendID": "bob", "contactInfo": [{ "intimacyScore": 2 }] }]
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let account = client.find_by_id("alice").await.unwrap().unwrap();

        assert_eq!(account.name, "Alice");
        assert_eq!(account.relationships.unwrap()[0].counterpart_id, "bob");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_find_by_id_missing_returns_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", DOCUMENTS_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"total":0,"documents":[]}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        assert!(client.find_by_id("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", DOCUMENTS_PATH)
            .match_query(Matcher::Any)
            .with_status(401)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.find_by_id("alice").await.unwrap_err();
        assert!(matches!(err, StoreError::Appwrite(AppwriteError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_scan_page_returns_cursor_when_full() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", DOCUMENTS_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "total": 3,
                    "documents": [
                        { "$id": "d1", "id": "a", "friends": [] },
                        { "$id": "d2", "id": "b" }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let page = client.scan_page(None, 2).await.unwrap();

        assert_eq!(page.accounts.len(), 2);
        assert!(page.accounts[1].relationships.is_none());
        assert_eq!(page.next_cursor.as_deref(), Some("d2"));
    }

    #[tokio::test]
    async fn test_scan_page_reports_unreadable_documents() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", DOCUMENTS_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "total": 2,
                    "documents": [
                        { "$id": "good", "id": "good", "friends": [{ "friendID": "x", "contactInfo": [{ "intimacyScore": 3 }] }] },
                        { "$id": "bad", "id": "bad", "friends": "corrupt" }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let page = client.scan_page(None, 10).await.unwrap();
        assert_eq!(page.accounts.len(), 1);
        assert_eq!(page.unreadable, vec!["bad".to_string()]);
        assert!(page.next_cursor.is_none());

        let report = crate::core::scan_global_intimacy(&client, 10).await.unwrap();
        assert_eq!(report.total_intimacy, 3.0);
        assert_eq!(report.accounts_scanned, 2);
        assert_eq!(report.skipped_accounts, vec!["bad".to_string()]);
    }

    #[tokio::test]
    async fn test_find_by_id_with_corrupt_document_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", DOCUMENTS_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"total":1,"documents":[{"$id":"alice","id":"alice","friends":"corrupt"}]}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.find_by_id("alice").await.unwrap_err();
        assert!(matches!(err, StoreError::MalformedDocument { ref account_id, .. } if account_id == "alice"));
    }

    #[tokio::test]
    async fn test_full_page_without_trailing_id_is_invalid() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", DOCUMENTS_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "total": 5,
                    "documents": [
                        { "$id": "d1", "id": "a", "friends": [] },
                        { "id": "b", "friends": [] }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.scan_page(None, 2).await.unwrap_err();
        assert!(matches!(err, StoreError::Appwrite(AppwriteError::InvalidResponse(_))));
    }
}
