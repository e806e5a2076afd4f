//! Translation metrics and observability module.
//!
//! Counters for cache behaviour and backend traffic of one translation client.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters shared by a translation client and the flights it starts.
#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Lookups answered from a completed cache entry
    cache_hits: AtomicUsize,

    /// Lookups that started a new backend flight
    cache_misses: AtomicUsize,

    /// Lookups that joined a flight already in progress for the same key
    coalesced: AtomicUsize,

    /// Backend requests issued (every retry attempt counts)
    api_calls: AtomicUsize,

    /// Backend requests that failed or timed out (every retry attempt counts)
    api_failures: AtomicUsize,
}

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_api_call(&self) {
        self.api_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_api_failure(&self) {
        self.api_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> usize {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn coalesced(&self) -> usize {
        self.coalesced.load(Ordering::Relaxed)
    }

    pub fn api_calls(&self) -> usize {
        self.api_calls.load(Ordering::Relaxed)
    }

    pub fn api_failures(&self) -> usize {
        self.api_failures.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    ///
    /// Joined flights count as hits for the hit rate: they did not cost a
    /// backend call of their own.
    pub fn report(&self) -> MetricsReport {
        let hits = self.cache_hits();
        let misses = self.cache_misses();
        let coalesced = self.coalesced();
        let total_lookups = hits + misses + coalesced;
        let cache_hit_rate = if total_lookups > 0 {
            ((hits + coalesced) as f64 / total_lookups as f64) * 100.0
        } else {
            0.0
        };

        let calls = self.api_calls();
        let failures = self.api_failures();
        let api_success_rate = if calls > 0 {
            (calls.saturating_sub(failures) as f64 / calls as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            cache_hits: hits,
            cache_misses: misses,
            coalesced,
            cache_hit_rate,
            api_calls: calls,
            api_failures: failures,
            api_success_rate,
        }
    }
}

/// Metrics report containing current translation statistics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub coalesced: usize,

    /// Cache hit rate as a percentage (0-100), joined flights included
    pub cache_hit_rate: f64,

    pub api_calls: usize,
    pub api_failures: usize,

    /// Share of backend requests that succeeded, as a percentage (0-100)
    pub api_success_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Counter Tests ====================

    #[test]
    fn test_counters_start_at_zero() {
        let metrics = TranslationMetrics::new();

        assert_eq!(metrics.cache_hits(), 0);
        assert_eq!(metrics.cache_misses(), 0);
        assert_eq!(metrics.coalesced(), 0);
        assert_eq!(metrics.api_calls(), 0);
        assert_eq!(metrics.api_failures(), 0);
    }

    #[test]
    fn test_record_counters() {
        let metrics = TranslationMetrics::new();

        metrics.record_cache_hit();
        metrics.record_cache_hit();
        metrics.record_cache_miss();
        metrics.record_coalesced();
        metrics.record_api_call();
        metrics.record_api_failure();

        assert_eq!(metrics.cache_hits(), 2);
        assert_eq!(metrics.cache_misses(), 1);
        assert_eq!(metrics.coalesced(), 1);
        assert_eq!(metrics.api_calls(), 1);
        assert_eq!(metrics.api_failures(), 1);
    }

    // ==================== Report Tests ====================

    #[test]
    fn test_report_empty() {
        let report = TranslationMetrics::new().report();

        assert_eq!(report.cache_hit_rate, 0.0);
        assert_eq!(report.api_success_rate, 0.0);
    }

    #[test]
    fn test_report_hit_rate_counts_coalesced_lookups() {
        let metrics = TranslationMetrics::new();

        // 2 hits + 1 joined flight out of 4 lookups = 75%
        metrics.record_cache_hit();
        metrics.record_cache_hit();
        metrics.record_coalesced();
        metrics.record_cache_miss();

        let report = metrics.report();
        assert_eq!(report.cache_hit_rate, 75.0);
    }

    #[test]
    fn test_report_api_success_rate() {
        let metrics = TranslationMetrics::new();

        for _ in 0..4 {
            metrics.record_api_call();
        }
        metrics.record_api_failure();

        let report = metrics.report();
        assert_eq!(report.api_calls, 4);
        assert_eq!(report.api_failures, 1);
        assert_eq!(report.api_success_rate, 75.0);
    }

    #[test]
    fn test_report_all_attempts_failed() {
        let metrics = TranslationMetrics::new();

        // One lookup, three failed attempts
        for _ in 0..3 {
            metrics.record_api_call();
            metrics.record_api_failure();
        }

        let report = metrics.report();
        assert_eq!(report.api_calls, 3);
        assert_eq!(report.api_failures, 3);
        assert_eq!(report.api_success_rate, 0.0);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let metrics = TranslationMetrics::new();
        metrics.record_cache_miss();

        let json = serde_json::to_value(metrics.report()).unwrap();
        assert_eq!(json["cache_misses"], 1);
        assert!(json.get("cache_hit_rate").is_some());
    }
}
