use serde::Deserialize;
use std::sync::Arc;

use crate::core::error::{EngineError, Operation};
use crate::core::global::scan_global_intimacy;
use crate::core::intimacy::{account_total_intimacy, relationship_intimacy_with};
use crate::core::ledger::LedgerReader;
use crate::core::probability::{intimacy_percentage, ZeroTotalPolicy};
use crate::core::{likes, matcher};
use crate::models::{Account, GlobalIntimacyReport, LikedAccounts, MatchCandidate, SecondaryKey};
use crate::services::{AccountStore, CacheError, CacheKey, CacheManager};

/// Where the probability calculator takes its global denominator from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlobalSource {
    /// Full scan on every request
    #[default]
    Fresh,
    /// Latest cached report, scanning only on a cache miss
    Snapshot,
}

/// Tunables for the intimacy engine
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    pub scan_page_size: usize,
    pub zero_total_policy: ZeroTotalPolicy,
    pub global_source: GlobalSource,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            scan_page_size: 100,
            zero_total_policy: ZeroTotalPolicy::default(),
            global_source: GlobalSource::default(),
        }
    }
}

/// Intimacy & matching engine
///
/// Read-only facade over the account store exposing the operations request
/// handlers call. Holds no account state of its own.
#[derive(Clone)]
pub struct IntimacyEngine {
    reader: LedgerReader,
    settings: EngineSettings,
    snapshot: Option<Arc<CacheManager>>,
}

impl IntimacyEngine {
    pub fn new(store: Arc<dyn AccountStore>, settings: EngineSettings) -> Self {
        Self {
            reader: LedgerReader::new(store),
            settings,
            snapshot: None,
        }
    }

    /// Attach the cache holding published global reports
    pub fn with_snapshot_cache(mut self, cache: Arc<CacheManager>) -> Self {
        self.snapshot = Some(cache);
        self
    }

    /// Total intimacy of one account, computed from its current ledger
    pub async fn total_intimacy(&self, account_id: &str) -> Result<f64, EngineError> {
        let account = self.reader.account(account_id, Operation::TotalIntimacy).await?;
        account_total_intimacy(&account)
    }

    /// Full-population scan; expensive, intended for batch use
    pub async fn global_total_intimacy(&self) -> Result<GlobalIntimacyReport, EngineError> {
        scan_global_intimacy(self.reader.store().as_ref(), self.settings.scan_page_size).await
    }

    /// Store a freshly computed report for snapshot readers
    pub async fn publish_snapshot(&self, report: &GlobalIntimacyReport) -> Result<(), CacheError> {
        match &self.snapshot {
            Some(cache) => cache.set(&CacheKey::global_intimacy(), report).await,
            None => Ok(()),
        }
    }

    /// Latest global report, from the snapshot cache when one is attached
    ///
    /// Falls back to a fresh scan (and publishes it) on a cache miss.
    pub async fn latest_global_report(&self) -> Result<GlobalIntimacyReport, EngineError> {
        if let Some(cache) = &self.snapshot {
            match cache.get::<GlobalIntimacyReport>(&CacheKey::global_intimacy()).await {
                Ok(report) => return Ok(report),
                Err(CacheError::CacheMiss(_)) => {
                    tracing::debug!("No global intimacy snapshot cached, scanning");
                }
                Err(e) => tracing::warn!("Failed to read global intimacy snapshot: {}", e),
            }
        }

        let report = self.global_total_intimacy().await?;
        if let Err(e) = self.publish_snapshot(&report).await {
            tracing::warn!("Failed to publish global intimacy snapshot: {}", e);
        }
        Ok(report)
    }

    /// Global denominator for an account whose total was just read
    ///
    /// A snapshot older than the account's latest contact events can sit below
    /// the account's own total; such a snapshot is replaced by a fresh scan.
    async fn global_denominator(&self, account_id: &str, account_total: f64) -> Result<f64, EngineError> {
        if self.settings.global_source == GlobalSource::Fresh {
            return Ok(self.global_total_intimacy().await?.total_intimacy);
        }

        let cached = self.latest_global_report().await?;
        if account_total <= cached.total_intimacy {
            return Ok(cached.total_intimacy);
        }

        tracing::debug!(
            "Snapshot total {} is behind account {} ({}), rescanning",
            cached.total_intimacy,
            account_id,
            account_total
        );
        let report = self.global_total_intimacy().await?;
        if let Err(e) = self.publish_snapshot(&report).await {
            tracing::warn!("Failed to publish global intimacy snapshot: {}", e);
        }
        Ok(report.total_intimacy)
    }

    /// Percentage of the global intimacy total held by `account_id`
    pub async fn today_probability(&self, account_id: &str) -> Result<f64, EngineError> {
        let account = self.reader.account(account_id, Operation::TodayProbability).await?;
        let account_total = account_total_intimacy(&account)?;
        let global_total = self.global_denominator(account_id, account_total).await?;

        tracing::debug!(
            "Probability for {}: {} of global {}",
            account_id,
            account_total,
            global_total
        );

        intimacy_percentage(account_id, account_total, global_total, self.settings.zero_total_policy)
    }

    pub async fn resolve_matches(&self, account_id: &str) -> Result<Vec<MatchCandidate>, EngineError> {
        matcher::resolve_matches(&self.reader, account_id).await
    }

    pub async fn resolve_likes(&self, account_id: &str) -> Result<LikedAccounts, EngineError> {
        likes::resolve_likes(&self.reader, account_id).await
    }

    /// First entry of the account's scores, `None` when it has none
    pub async fn headline_score(&self, account_id: &str) -> Result<Option<f64>, EngineError> {
        let account = self.reader.account(account_id, Operation::HeadlineScore).await?;
        Ok(account.headline_score())
    }

    /// Intimacy `account_id` has logged toward `friend_id`
    pub async fn relationship_intimacy(&self, account_id: &str, friend_id: &str) -> Result<f64, EngineError> {
        const OP: Operation = Operation::RelationshipIntimacy;

        let account = self.reader.account(account_id, OP).await?;
        let friend = self.reader.counterpart(friend_id, OP).await?;
        relationship_intimacy_with(&account, &friend.id, OP)
    }

    pub async fn find_account(&self, key: SecondaryKey, value: &str) -> Result<Account, EngineError> {
        self.reader.account_by_secondary_key(key, value).await
    }

    pub async fn health_check(&self) -> bool {
        match self.reader.store().health_check().await {
            Ok(healthy) => healthy,
            Err(e) => {
                tracing::warn!("Account store health check failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Relationship;
    use crate::services::InMemoryAccountStore;

    fn engine_over(store: Arc<InMemoryAccountStore>, settings: EngineSettings) -> IntimacyEngine {
        IntimacyEngine::new(store, settings)
    }

    fn population() -> Vec<Account> {
        vec![
            Account::new("a", "A", "0").with_relationship(Relationship::new("b", [4.0, 6.0])),
            Account::new("b", "B", "0").with_relationship(Relationship::new("a", [20.0])),
            Account::new("c", "C", "0").with_relationship(Relationship::new("a", [10.0, 20.0])),
        ]
    }

    #[tokio::test]
    async fn test_today_probability() {
        let store = Arc::new(InMemoryAccountStore::from_accounts(population()));
        let engine = engine_over(store, EngineSettings::default());

        let p = engine.today_probability("a").await.unwrap();
        assert!((p - 100.0 / 6.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_snapshot_source_reuses_cached_total() {
        let store = Arc::new(InMemoryAccountStore::from_accounts(population()));
        let settings = EngineSettings {
            global_source: GlobalSource::Snapshot,
            ..EngineSettings::default()
        };
        let engine = engine_over(store.clone(), settings)
            .with_snapshot_cache(Arc::new(CacheManager::local(10, 60)));

        let first = engine.today_probability("a").await.unwrap();

        // The account's own total is fresh; the denominator comes from the snapshot
        store.append_contact_event("b", "a", 60.0).await;
        let second = engine.today_probability("a").await.unwrap();
        assert_eq!(first, second);

        let report = engine.global_total_intimacy().await.unwrap();
        assert_eq!(report.total_intimacy, 120.0);
    }

    #[tokio::test]
    async fn test_stale_snapshot_is_rescanned_when_account_outgrows_it() {
        let store = Arc::new(InMemoryAccountStore::from_accounts(vec![
            Account::new("a", "A", "0").with_relationship(Relationship::new("b", [5.0])),
            Account::new("b", "B", "0").with_relationship(Relationship::new("a", [5.0])),
        ]));
        let settings = EngineSettings {
            global_source: GlobalSource::Snapshot,
            ..EngineSettings::default()
        };
        let cache = Arc::new(CacheManager::local(10, 60));
        let engine = engine_over(store.clone(), settings).with_snapshot_cache(cache.clone());

        assert_eq!(engine.today_probability("a").await.unwrap(), 50.0);

        store.append_contact_event("a", "b", 100.0).await;
        let second = engine.today_probability("a").await.unwrap();
        assert!((0.0..=100.0).contains(&second));
        assert!((second - 105.0 / 110.0 * 100.0).abs() < 1e-9);

        let snapshot: GlobalIntimacyReport = cache.get(&CacheKey::global_intimacy()).await.unwrap();
        assert_eq!(snapshot.total_intimacy, 110.0);
    }

    #[tokio::test]
    async fn test_total_intimacy_reads_current_ledger() {
        let store = Arc::new(InMemoryAccountStore::from_accounts(population()));
        let engine = engine_over(store.clone(), EngineSettings::default());

        assert_eq!(engine.total_intimacy("c").await.unwrap(), 30.0);
        store.append_contact_event("c", "b", 2.5).await;
        assert_eq!(engine.total_intimacy("c").await.unwrap(), 32.5);
        assert_eq!(engine.total_intimacy("ghost").await.unwrap_err().kind(), "not_found");
    }

    #[tokio::test]
    async fn test_relationship_intimacy_requires_friend_account() {
        let store = Arc::new(InMemoryAccountStore::from_accounts(vec![
            Account::new("a", "A", "0").with_relationship(Relationship::new("gone", [1.0])),
        ]));
        let engine = engine_over(store, EngineSettings::default());

        let err = engine.relationship_intimacy("a", "gone").await.unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn test_headline_score() {
        let mut account = Account::new("a", "A", "0");
        account.scores = vec![3.5, 1.0];
        let store = Arc::new(InMemoryAccountStore::from_accounts(vec![account, Account::new("b", "B", "0")]));
        let engine = engine_over(store, EngineSettings::default());

        assert_eq!(engine.headline_score("a").await.unwrap(), Some(3.5));
        assert_eq!(engine.headline_score("b").await.unwrap(), None);
    }
}
