//! Switch metrics and observability.
//!
//! Counters for cache usage and loader activity of one coordinator.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters owned by a single coordinator.
#[derive(Debug, Default)]
pub struct SwitchMetrics {
    /// Switches served from a cached dictionary
    cache_hits: AtomicUsize,

    /// Switches that had to load a dictionary
    cache_misses: AtomicUsize,

    /// Loader invocations, background refreshes included
    loader_calls: AtomicUsize,

    /// Loader invocations that returned an error
    loader_failures: AtomicUsize,

    /// Loads that resolved after a newer switch superseded them
    stale_resolutions: AtomicUsize,

    /// Background refreshes issued on cache hits
    background_refreshes: AtomicUsize,
}

impl SwitchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_loader_call(&self) {
        self.loader_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_loader_failure(&self) {
        self.loader_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_resolution(&self) {
        self.stale_resolutions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_background_refresh(&self) {
        self.background_refreshes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> usize {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn loader_calls(&self) -> usize {
        self.loader_calls.load(Ordering::Relaxed)
    }

    pub fn loader_failures(&self) -> usize {
        self.loader_failures.load(Ordering::Relaxed)
    }

    pub fn stale_resolutions(&self) -> usize {
        self.stale_resolutions.load(Ordering::Relaxed)
    }

    pub fn background_refreshes(&self) -> usize {
        self.background_refreshes.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let hits = self.cache_hits();
        let misses = self.cache_misses();
        let total_switches = hits + misses;
        let cache_hit_rate = if total_switches > 0 {
            (hits as f64 / total_switches as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate,
            loader_calls: self.loader_calls(),
            loader_failures: self.loader_failures(),
            stale_resolutions: self.stale_resolutions(),
            background_refreshes: self.background_refreshes(),
        }
    }
}

/// Point-in-time copy of the switch counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub cache_hits: usize,
    pub cache_misses: usize,

    /// Cache hit rate as a percentage (0-100)
    pub cache_hit_rate: f64,

    pub loader_calls: usize,
    pub loader_failures: usize,
    pub stale_resolutions: usize,
    pub background_refreshes: usize,
}
