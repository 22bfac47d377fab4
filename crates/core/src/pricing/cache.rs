use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::pricing_config::PricingConfig;
use crate::pricing::defaults::fallback_config;
use crate::pricing::source::PricingConfigSource;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotOrigin {
    Store,
    /// The store failed and the built-in defaults were served instead.
    Fallback,
}

#[derive(Clone, Debug)]
pub struct ConfigSnapshot {
    config: Arc<PricingConfig>,
    origin: SnapshotOrigin,
    fetched_at: Instant,
}

impl ConfigSnapshot {
    pub fn config(&self) -> &Arc<PricingConfig> {
        &self.config
    }

    pub fn origin(&self) -> SnapshotOrigin {
        self.origin
    }

    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }
}

/// Process-wide pricing snapshot with a fixed time-to-live.
///
/// Construct one per process and share it behind an `Arc`. Concurrent
/// callers that all observe an expired slot each fetch from the source; the
/// last write wins. Store failures never propagate: the built-in defaults
/// are cached in their place for one TTL window.
pub struct PricingConfigCache<S> {
    source: S,
    ttl: Duration,
    slot: RwLock<Option<ConfigSnapshot>>,
}

impl<S> PricingConfigCache<S>
where
    S: PricingConfigSource,
{
    pub fn new(source: S) -> Self {
        Self::with_ttl(source, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(source: S, ttl: Duration) -> Self {
        Self { source, ttl, slot: RwLock::new(None) }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn get_config(&self) -> Arc<PricingConfig> {
        self.snapshot().await.config
    }

    pub async fn snapshot(&self) -> ConfigSnapshot {
        if let Some(snapshot) = self.fresh_snapshot().await {
            debug!(
                event_name = "pricing.cache.hit",
                age_ms = snapshot.age().as_millis() as u64,
                "serving cached pricing snapshot"
            );
            return snapshot;
        }

        self.refresh().await
    }

    /// Fetches unconditionally and replaces the cached snapshot.
    pub async fn refresh(&self) -> ConfigSnapshot {
        let (config, origin) = match self.source.fetch_config().await {
            Ok(config) => {
                info!(
                    event_name = "pricing.cache.refreshed",
                    seasons = config.seasons().len(),
                    "pricing snapshot refreshed from store"
                );
                (config, SnapshotOrigin::Store)
            }
            Err(error) => {
                warn!(
                    event_name = "pricing.cache.fallback",
                    error = %error,
                    "pricing store unavailable; serving built-in defaults"
                );
                (fallback_config(), SnapshotOrigin::Fallback)
            }
        };

        let snapshot = ConfigSnapshot { config: Arc::new(config), origin, fetched_at: Instant::now() };
        *self.slot.write().await = Some(snapshot.clone());
        snapshot
    }

    /// Drops the cached snapshot so the next read fetches again. Every write
    /// to pricing settings, seasons or rates must call this.
    pub async fn invalidate(&self) {
        let previous = self.slot.write().await.take();
        info!(
            event_name = "pricing.cache.invalidated",
            had_snapshot = previous.is_some(),
            "pricing snapshot invalidated"
        );
    }

    async fn fresh_snapshot(&self) -> Option<ConfigSnapshot> {
        let slot = self.slot.read().await;
        slot.as_ref().filter(|snapshot| snapshot.age() < self.ttl).cloned()
    }
}
