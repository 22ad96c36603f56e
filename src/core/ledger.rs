use std::sync::Arc;

use crate::core::error::{EngineError, Operation};
use crate::models::{Account, Relationship, SecondaryKey};
use crate::services::AccountStore;

/// Read-only access to accounts and their relationship ledgers
///
/// Every call goes to the store; references held in like/matching lists are
/// re-resolved on each read so deleted accounts surface as absent.
#[derive(Clone)]
pub struct LedgerReader {
    store: Arc<dyn AccountStore>,
}

impl LedgerReader {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn AccountStore> {
        &self.store
    }

    /// Resolve an account by id, failing with `NotFound` when absent
    pub async fn account(&self, account_id: &str, operation: Operation) -> Result<Account, EngineError> {
        self.store
            .find_by_id(account_id)
            .await
            .map_err(EngineError::store(operation))?
            .ok_or_else(|| EngineError::not_found(account_id, operation))
    }

    /// Resolve a counterpart referenced from another account's lists
    ///
    /// Same semantics as [`LedgerReader::account`]; kept separate so call
    /// sites read as what they resolve.
    pub async fn counterpart(&self, counterpart_id: &str, operation: Operation) -> Result<Account, EngineError> {
        tracing::debug!("Resolving counterpart {} for {}", counterpart_id, operation);
        self.account(counterpart_id, operation).await
    }

    /// Resolve an account by a secondary key
    pub async fn account_by_secondary_key(
        &self,
        key: SecondaryKey,
        value: &str,
    ) -> Result<Account, EngineError> {
        self.store
            .find_by_secondary_key(key, value)
            .await
            .map_err(EngineError::store(Operation::FindAccount))?
            .ok_or_else(|| EngineError::not_found(value, Operation::FindAccount))
    }

    /// The account's relationship list, untransformed
    pub async fn relationships(&self, account_id: &str) -> Result<Vec<Relationship>, EngineError> {
        let account = self.account(account_id, Operation::ReadLedger).await?;
        let ledger = ledger_of(&account, Operation::ReadLedger)?;
        Ok(ledger.to_vec())
    }
}

/// Borrow an account's ledger, failing with `AggregationError` when the
/// document carries none
pub fn ledger_of(account: &Account, operation: Operation) -> Result<&[Relationship], EngineError> {
    account
        .relationships
        .as_deref()
        .ok_or_else(|| EngineError::malformed(&account.id, operation, "account has no relationship ledger"))
}
