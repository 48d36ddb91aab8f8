//! The cache itself (spec §4.G): `moka::future::Cache` gives us bounded
//! size, per-entry TTL, and single-flight coalescing for free through its
//! `entry(..).or_try_insert_with(..)` API — a hand-rolled waiter-group would
//! just be reimplementing what the crate already does correctly.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use graph_domain::{GraphError, Result};
use moka::future::{Cache, CacheBuilder};

use crate::counters::{CacheCounters, CacheCountersSnapshot};
use crate::fingerprint::Fingerprint;

/// Upper bound on cache TTL enforced regardless of configuration (spec §3):
/// a stale impact result is worse than a cache miss past this point.
pub const MAX_TTL_SECS: u64 = 300;

/// How a `ResultCache::get_or_compute` call was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
    Bypass,
}

/// Process-local, fingerprint-keyed cache of `serde_json::Value` results.
pub struct ResultCache {
    inner: Cache<Fingerprint, Arc<serde_json::Value>>,
    counters: CacheCounters,
}

impl ResultCache {
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        let ttl = ttl.min(Duration::from_secs(MAX_TTL_SECS));
        let inner = CacheBuilder::new(max_entries)
            .time_to_live(ttl)
            .support_invalidation_closures()
            .build();
        Self {
            inner,
            counters: CacheCounters::new(),
        }
    }

    /// Resolve `fingerprint`, computing it via `compute` on a miss. Multiple
    /// concurrent callers with the same fingerprint coalesce onto a single
    /// `compute` invocation. `nocache` bypasses the cache *read* — the
    /// upstream call always runs fresh — but still refreshes the cached
    /// entry afterwards, per spec §4.G, so a subsequent plain read observes
    /// the fresh value instead of a stale one.
    pub async fn get_or_compute<F, Fut>(
        &self,
        fingerprint: Fingerprint,
        nocache: bool,
        compute: F,
    ) -> Result<(Arc<serde_json::Value>, CacheOutcome)>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<serde_json::Value>>,
    {
        if nocache {
            self.counters.record_bypass();
            let value = Arc::new(compute().await?);
            self.inner.insert(fingerprint, value.clone()).await;
            return Ok((value, CacheOutcome::Bypass));
        }

        let result = self
            .inner
            .entry(fingerprint)
            .or_try_insert_with(async { compute().await.map(Arc::new) })
            .await;

        match result {
            Ok(entry) => {
                let outcome = if entry.is_fresh() {
                    self.counters.record_miss();
                    CacheOutcome::Miss
                } else {
                    self.counters.record_hit();
                    CacheOutcome::Hit
                };
                Ok((entry.into_value(), outcome))
            }
            Err(err) => Err(Arc::try_unwrap(err).unwrap_or_else(|shared| {
                GraphError::internal(CacheComputeFailed(shared.to_string()))
            })),
        }
    }

    /// Evict every cached entry for `(engine, database, graph_id)` — called
    /// after any mutation (create/delete graph) so a subsequent read can
    /// never observe stale cached content.
    pub fn invalidate_graph(&self, engine: &str, database: Option<&str>, graph_id: &str) {
        let engine = engine.to_string();
        let database = database.map(str::to_string);
        let graph_id = graph_id.to_string();

        let outcome = self.inner.invalidate_entries_if(move |key, _value| {
            key.belongs_to(&engine, database.as_deref(), &graph_id)
        });

        if outcome.is_ok() {
            self.counters.record_invalidation();
        } else {
            tracing::warn!("cache invalidation predicate rejected; entries will expire via TTL");
        }
    }

    pub fn counters(&self) -> CacheCountersSnapshot {
        self.counters.snapshot()
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("cached computation failed: {0}")]
struct CacheComputeFailed(String);
