//! Target metrics for observability
//!
//! Counters for records collected, filtered out and exported, and for
//! flushes and export failures.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for target observability
///
/// # Example
///
/// ```
/// use json_log_target::TargetMetrics;
///
/// let metrics = TargetMetrics::new();
/// metrics.record_collected(3);
/// metrics.record_exported(3);
///
/// assert_eq!(metrics.collected(), 3);
/// assert_eq!(metrics.pending(), 0);
/// ```
#[derive(Debug)]
pub struct TargetMetrics {
    /// Records that passed filtering and were batched
    collected: AtomicU64,

    /// Records rejected by the filter
    filtered_out: AtomicU64,

    /// Records handed to the exporter in successful flushes
    exported: AtomicU64,

    /// Successful flushes
    flushes: AtomicU64,

    /// Flushes whose export failed
    export_failures: AtomicU64,
}

impl TargetMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            collected: AtomicU64::new(0),
            filtered_out: AtomicU64::new(0),
            exported: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
            export_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn collected(&self) -> u64 {
        self.collected.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered_out(&self) -> u64 {
        self.filtered_out.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn exported(&self) -> u64 {
        self.exported.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn flushes(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn export_failures(&self) -> u64 {
        self.export_failures.load(Ordering::Relaxed)
    }

    /// Records collected but not yet exported
    pub fn pending(&self) -> u64 {
        self.collected().saturating_sub(self.exported())
    }

    #[inline]
    pub fn record_collected(&self, count: u64) -> u64 {
        self.collected.fetch_add(count, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered_out(&self, count: u64) -> u64 {
        self.filtered_out.fetch_add(count, Ordering::Relaxed)
    }

    /// Record a successful flush of `count` records
    #[inline]
    pub fn record_exported(&self, count: u64) -> u64 {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        self.exported.fetch_add(count, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_export_failure(&self) -> u64 {
        self.export_failures.fetch_add(1, Ordering::Relaxed)
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.collected.store(0, Ordering::Relaxed);
        self.filtered_out.store(0, Ordering::Relaxed);
        self.exported.store(0, Ordering::Relaxed);
        self.flushes.store(0, Ordering::Relaxed);
        self.export_failures.store(0, Ordering::Relaxed);
    }
}

impl Default for TargetMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for TargetMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            collected: AtomicU64::new(self.collected()),
            filtered_out: AtomicU64::new(self.filtered_out()),
            exported: AtomicU64::new(self.exported()),
            flushes: AtomicU64::new(self.flushes()),
            export_failures: AtomicU64::new(self.export_failures()),
        }
    }
}
