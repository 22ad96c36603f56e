use std::time::Duration;
use tokio::task::JoinHandle;

use crate::core::{EngineError, IntimacyEngine};
use crate::models::GlobalIntimacyReport;

/// Background task recomputing the global intimacy report
///
/// Keeps the full-population scan off the request path: each tick scans the
/// store and publishes the result to the engine's snapshot cache.
pub struct GlobalIndexRefresher {
    engine: IntimacyEngine,
    interval: Duration,
}

impl GlobalIndexRefresher {
    pub fn new(engine: IntimacyEngine, interval: Duration) -> Self {
        Self { engine, interval }
    }

    /// Run one scan and publish it
    pub async fn refresh_once(&self) -> Result<GlobalIntimacyReport, EngineError> {
        let report = self.engine.global_total_intimacy().await?;

        if let Err(e) = self.engine.publish_snapshot(&report).await {
            tracing::warn!("Failed to publish global intimacy snapshot: {}", e);
        }

        tracing::info!(
            "Refreshed global intimacy: total={} accounts={} skipped={}",
            report.total_intimacy,
            report.accounts_scanned,
            report.skipped_accounts.len()
        );

        Ok(report)
    }

    /// Spawn the refresh loop on the current runtime
    ///
    /// A failed scan is logged and retried on the next tick.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if let Err(e) = self.refresh_once().await {
                    tracing::error!("Global intimacy refresh failed: {}", e);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EngineSettings, GlobalSource};
    use crate::models::{Account, Relationship};
    use crate::services::{CacheManager, InMemoryAccountStore};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_refresh_publishes_snapshot() {
        let store = Arc::new(InMemoryAccountStore::from_accounts(vec![
            Account::new("a", "A", "0").with_relationship(Relationship::new("b", [5.0])),
        ]));
        let settings = EngineSettings {
            global_source: GlobalSource::Snapshot,
            ..EngineSettings::default()
        };
        let engine = IntimacyEngine::new(store.clone(), settings)
            .with_snapshot_cache(Arc::new(CacheManager::local(10, 60)));
        let refresher = GlobalIndexRefresher::new(engine.clone(), Duration::from_secs(60));

        let published = refresher.refresh_once().await.unwrap();
        assert_eq!(published.total_intimacy, 5.0);

        store.append_contact_event("a", "b", 1.0).await;
        let cached = engine.latest_global_report().await.unwrap();
        assert_eq!(cached.report_id, published.report_id);

        let republished = refresher.refresh_once().await.unwrap();
        assert_eq!(republished.total_intimacy, 6.0);
        assert_eq!(engine.latest_global_report().await.unwrap().total_intimacy, 6.0);
    }
}
