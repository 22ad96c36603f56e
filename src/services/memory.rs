use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ops::Bound;
use tokio::sync::RwLock;

use crate::models::{Account, ContactEvent, Relationship, SecondaryKey};
use crate::services::store::{AccountPage, AccountStore, StoreError};

/// In-process account store
///
/// Backs local development and tests. Accounts are kept ordered by id so
/// scans page deterministically with the last id as cursor.
#[derive(Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<BTreeMap<String, Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_accounts<I>(accounts: I) -> Self
    where
        I: IntoIterator<Item = Account>,
    {
        let map = accounts
            .into_iter()
            .map(|account| (account.id.clone(), account))
            .collect();

        Self {
            accounts: RwLock::new(map),
        }
    }

    /// Insert or replace an account
    pub async fn insert(&self, account: Account) {
        self.accounts.write().await.insert(account.id.clone(), account);
    }

    /// Remove an account, leaving any references to it dangling
    pub async fn remove(&self, id: &str) -> Option<Account> {
        self.accounts.write().await.remove(id)
    }

    /// Append a contact event to `account_id`'s relationship with
    /// `counterpart_id`, creating the relationship if needed.
    ///
    /// Returns `false` when the account does not exist.
    pub async fn append_contact_event(&self, account_id: &str, counterpart_id: &str, delta: f64) -> bool {
        let mut accounts = self.accounts.write().await;
        let Some(account) = accounts.get_mut(account_id) else {
            return false;
        };

        let ledger = account.relationships.get_or_insert_with(Vec::new);
        match ledger.iter_mut().find(|r| r.counterpart_id == counterpart_id) {
            Some(relationship) => relationship.contact_events.push(ContactEvent::new(delta)),
            None => ledger.push(Relationship::new(counterpart_id, [delta])),
        }

        true
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.read().await.get(id).cloned())
    }

    async fn find_by_secondary_key(
        &self,
        key: SecondaryKey,
        value: &str,
    ) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .values()
            .find(|account| key.value_of(account) == Some(value))
            .cloned())
    }

    async fn scan_page(
        &self,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<AccountPage, StoreError> {
        let limit = limit.max(1);
        let accounts = self.accounts.read().await;

        let lower = match cursor {
            Some(after) => Bound::Excluded(after.to_string()),
            None => Bound::Unbounded,
        };

        let page: Vec<Account> = accounts
            .range((lower, Bound::Unbounded))
            .take(limit)
            .map(|(_, account)| account.clone())
            .collect();

        let next_cursor = if page.len() == limit {
            page.last().map(|account| account.id.clone())
        } else {
            None
        };

        Ok(AccountPage {
            accounts: page,
            unreadable: Vec::new(),
            next_cursor,
        })
    }
}
