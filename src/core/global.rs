use crate::core::error::{EngineError, Operation};
use crate::core::intimacy::account_total_intimacy;
use crate::models::{Account, GlobalIntimacyReport};
use crate::services::AccountStore;

/// Running sum over the account population
#[derive(Debug, Clone, Default)]
pub struct GlobalTally {
    pub total_intimacy: f64,
    pub accounts_scanned: usize,
    pub skipped_accounts: Vec<String>,
}

impl GlobalTally {
    /// Fold one account into the tally
    ///
    /// An account with a malformed ledger is recorded as skipped and
    /// contributes nothing.
    pub fn add(&mut self, account: &Account) {
        self.accounts_scanned += 1;
        match account_total_intimacy(account) {
            Ok(total) => self.total_intimacy += total,
            Err(e) => {
                tracing::warn!("Skipping account in global intimacy scan: {}", e);
                self.skipped_accounts.push(account.id.clone());
            }
        }
    }

    /// Record a stored document that could not be decoded at all
    pub fn add_unreadable(&mut self, account_id: String) {
        tracing::warn!("Skipping unreadable account document in global intimacy scan: {}", account_id);
        self.accounts_scanned += 1;
        self.skipped_accounts.push(account_id);
    }

    pub fn extend<'a, I>(&mut self, accounts: I)
    where
        I: IntoIterator<Item = &'a Account>,
    {
        for account in accounts {
            self.add(account);
        }
    }

    pub fn into_report(self) -> GlobalIntimacyReport {
        GlobalIntimacyReport {
            report_id: uuid::Uuid::new_v4(),
            total_intimacy: self.total_intimacy,
            accounts_scanned: self.accounts_scanned,
            skipped_accounts: self.skipped_accounts,
            computed_at: chrono::Utc::now(),
        }
    }
}

/// Sum every account's total intimacy across the whole store
///
/// Walks the store page by page. Malformed accounts are skipped; a store
/// failure aborts the scan. Pages are read without isolation, so ledgers
/// mutated mid-scan may be counted in either state.
pub async fn scan_global_intimacy(
    store: &dyn AccountStore,
    page_size: usize,
) -> Result<GlobalIntimacyReport, EngineError> {
    let mut tally = GlobalTally::default();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = store
            .scan_page(cursor.as_deref(), page_size)
            .await
            .map_err(EngineError::store(Operation::GlobalIntimacy))?;
        pages += 1;

        tally.extend(&page.accounts);
        for account_id in page.unreadable {
            tally.add_unreadable(account_id);
        }

        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    tracing::debug!(
        "Global intimacy scan read {} accounts over {} pages ({} skipped)",
        tally.accounts_scanned,
        pages,
        tally.skipped_accounts.len()
    );

    Ok(tally.into_report())
}
