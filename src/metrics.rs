//! Cache metrics for URL resolution.
//!
//! One instance per cache, so tests and separate engines never share
//! counters.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct CacheMetrics {
    /// Hits served from the in-process tier
    local_hits: AtomicUsize,

    /// Hits served from the external store (and copied locally)
    external_hits: AtomicUsize,

    /// Lookups that found nothing in either tier
    misses: AtomicUsize,

    /// Entries written to the external store
    external_writes: AtomicUsize,

    /// Entries kept out of the external store by the query or kind policy
    external_skips: AtomicUsize,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_local_hit(&self) {
        self.local_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_external_hit(&self) {
        self.external_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_external_write(&self) {
        self.external_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_external_skip(&self) {
        self.external_skips.fetch_add(1, Ordering::Relaxed);
    }

    pub fn local_hits(&self) -> usize {
        self.local_hits.load(Ordering::Relaxed)
    }

    pub fn external_hits(&self) -> usize {
        self.external_hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn external_writes(&self) -> usize {
        self.external_writes.load(Ordering::Relaxed)
    }

    pub fn external_skips(&self) -> usize {
        self.external_skips.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let local_hits = self.local_hits();
        let external_hits = self.external_hits();
        let misses = self.misses();
        let lookups = local_hits + external_hits + misses;
        let hit_rate = if lookups > 0 {
            ((local_hits + external_hits) as f64 / lookups as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            local_hits,
            external_hits,
            misses,
            hit_rate,
            external_writes: self.external_writes(),
            external_skips: self.external_skips(),
        }
    }
}

/// Snapshot of cache statistics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub local_hits: usize,
    pub external_hits: usize,
    pub misses: usize,

    /// Hit rate across both tiers as a percentage (0-100)
    pub hit_rate: f64,

    pub external_writes: usize,
    pub external_skips: usize,
}
