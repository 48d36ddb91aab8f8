//! Cache hit/miss/bypass counters, mirroring the `AtomicU64`-per-counter
//! style used for per-server metrics elsewhere in this workspace.

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters for cache introspection (`GET /cache/stats`).
#[derive(Debug, Default)]
pub struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    bypasses: AtomicU64,
    invalidations: AtomicU64,
}

impl CacheCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bypass(&self) {
        self.bypasses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalidation(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheCountersSnapshot {
        CacheCountersSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            bypasses: self.bypasses.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of `CacheCounters`, serializable for the wire.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct CacheCountersSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub bypasses: u64,
    pub invalidations: u64,
}

impl CacheCountersSnapshot {
    /// Hit rate over `hits + misses` only — bypassed requests never entered
    /// the cache's consideration and would otherwise dilute the ratio.
    pub fn hit_rate(&self) -> f64 {
        let considered = self.hits + self.misses;
        if considered == 0 {
            0.0
        } else {
            self.hits as f64 / considered as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let c = CacheCounters::new();
        let snap = c.snapshot();
        assert_eq!(snap.hits, 0);
        assert_eq!(snap.misses, 0);
        assert_eq!(snap.bypasses, 0);
        assert_eq!(snap.invalidations, 0);
    }

    #[test]
    fn hit_rate_ignores_bypasses() {
        let c = CacheCounters::new();
        c.record_hit();
        c.record_hit();
        c.record_hit();
        c.record_miss();
        c.record_bypass();
        c.record_bypass();

        let snap = c.snapshot();
        assert_eq!(snap.hit_rate(), 0.75);
    }

    #[test]
    fn hit_rate_is_zero_with_no_data() {
        let snap = CacheCountersSnapshot::default();
        assert_eq!(snap.hit_rate(), 0.0);
    }
}
