use crate::core::error::{EngineError, Operation};
use crate::core::ledger::LedgerReader;
use crate::models::LikedAccounts;

/// Expand an account's like list into index-aligned ids and display names
///
/// A liked account that no longer exists fails the whole call, so the two
/// lists can never drift out of alignment.
pub async fn resolve_likes(reader: &LedgerReader, account_id: &str) -> Result<LikedAccounts, EngineError> {
    const OP: Operation = Operation::ResolveLikes;

    let account = reader.account(account_id, OP).await?;
    let mut liked = LikedAccounts::default();

    for liked_id in &account.like_list {
        let counterpart = match reader.counterpart(liked_id, OP).await {
            Ok(counterpart) => counterpart,
            Err(EngineError::NotFound { .. }) => {
                return Err(EngineError::inconsistency(
                    &account.id,
                    OP,
                    format!("liked account {} no longer exists", liked_id),
                ));
            }
            Err(e) => return Err(e),
        };

        liked.push(liked_id.clone(), counterpart.name);
    }

    Ok(liked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Account;
    use crate::services::InMemoryAccountStore;
    use std::sync::Arc;

    fn reader_with(accounts: Vec<Account>) -> LedgerReader {
        LedgerReader::new(Arc::new(InMemoryAccountStore::from_accounts(accounts)))
    }

    #[tokio::test]
    async fn test_likes_are_index_aligned() {
        let accounts = vec![
            Account::new("A", "Alice", "1").with_likes(["C", "B"]),
            Account::new("B", "Bob", "2"),
            Account::new("C", "Carol", "3"),
        ];

        let liked = resolve_likes(&reader_with(accounts), "A").await.unwrap();

        assert_eq!(liked.ids, vec!["C", "B"]);
        assert_eq!(liked.names, vec!["Carol", "Bob"]);
        assert_eq!(liked.ids.len(), liked.names.len());
    }

    #[tokio::test]
    async fn test_deleted_like_is_inconsistency() {
        let accounts = vec![
            Account::new("A", "Alice", "1").with_likes(["B", "gone"]),
            Account::new("B", "Bob", "2"),
        ];

        let err = resolve_likes(&reader_with(accounts), "A").await.unwrap_err();
        assert_eq!(err.kind(), "data_inconsistency");
        assert!(err.to_string().contains("gone"));
    }

    #[tokio::test]
    async fn test_unknown_requester_is_not_found() {
        let err = resolve_likes(&reader_with(vec![]), "A").await.unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }
}
