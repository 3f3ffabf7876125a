//! Reflection cache metrics tracking

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Hit/miss counters shared by all lookups of one cache.
#[derive(Debug, Default)]
pub(crate) struct LookupMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl LookupMetrics {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, entries: usize, negative_entries: usize) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            hits,
            misses,
            hit_ratio: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
            entries,
            negative_entries,
        }
    }
}

/// Point-in-time view of a [`ReflectionCache`](super::ReflectionCache).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that had to consult the type table
    pub misses: u64,
    /// hits / (hits + misses), 0.0 before any lookup
    pub hit_ratio: f64,
    /// Cached (type, property) pairs across all lookup kinds
    pub entries: usize,
    /// Of those, how many cache a "not found" result
    pub negative_entries: usize,
}
