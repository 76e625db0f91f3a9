use serde::{Deserialize, Serialize};
use crate::error::{CacheError, Result};

/// Access counters owned by a single cache
///
/// `hits + misses == total_accesses` holds until the first [`CacheStats::reset`], which clears the
/// hit and miss counts but keeps the running access total.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub total_accesses: u64,
}

impl CacheStats {
    pub fn record_hit(&mut self) {
        self.hits += 1;
        self.total_accesses += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
        self.total_accesses += 1;
    }

    pub fn reset(&mut self) {
        self.hits = 0;
        self.misses = 0;
    }

    /// Fraction of measured accesses which hit, in `[0, 1]`
    ///
    /// Returns [`CacheError::NoAccesses`] when nothing has been measured since the last reset,
    /// so that an empty window is never mistaken for a 0% hit rate
    pub fn hit_rate(&self) -> Result<f64> {
        hit_rate(self.hits, self.misses)
    }
}

/// `hits / (hits + misses)`, or [`CacheError::NoAccesses`] if both are zero
pub fn hit_rate(hits: u64, misses: u64) -> Result<f64> {
    let measured = hits + misses;
    if measured == 0 {
        return Err(CacheError::NoAccesses);
    }
    Ok(hits as f64 / measured as f64)
}
