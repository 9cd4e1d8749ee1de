use std::sync::{Arc, RwLock};

/// Counters for the aggregation pipeline, surfaced in the status bar and
/// useful when debugging cache warm-up behavior.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AggregationStats {
    /// Queries received by the worker (messages with a selection).
    pub requests: u64,
    /// Replies actually delivered to the UI.
    pub replies: u64,
    /// Cache seed/refresh messages applied by the worker.
    pub cache_refreshes: u64,
    /// Queries answered with a null result because the cache was cold.
    pub cold_misses: u64,
    /// Synchronous fallback computations performed on the UI thread.
    pub fallback_computations: u64,
}

/// Thread-safe wrapper shared between the worker thread and the UI.
#[derive(Debug, Clone, Default)]
pub struct SharedAggregationStats {
    inner: Arc<RwLock<AggregationStats>>,
}

impl SharedAggregationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        if let Ok(mut stats) = self.inner.write() {
            stats.requests += 1;
        }
    }

    pub fn record_reply(&self) {
        if let Ok(mut stats) = self.inner.write() {
            stats.replies += 1;
        }
    }

    pub fn record_cache_refresh(&self) {
        if let Ok(mut stats) = self.inner.write() {
            stats.cache_refreshes += 1;
        }
    }

    pub fn record_cold_miss(&self) {
        if let Ok(mut stats) = self.inner.write() {
            stats.cold_misses += 1;
        }
    }

    pub fn record_fallback(&self) {
        if let Ok(mut stats) = self.inner.write() {
            stats.fallback_computations += 1;
        }
    }

    pub fn snapshot(&self) -> AggregationStats {
        self.inner.read().map(|s| *s).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = SharedAggregationStats::new();
        stats.record_request();
        stats.record_request();
        stats.record_cold_miss();
        stats.record_fallback();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.requests, 2);
        assert_eq!(snapshot.cold_misses, 1);
        assert_eq!(snapshot.fallback_computations, 1);
        assert_eq!(snapshot.replies, 0);
    }
}
