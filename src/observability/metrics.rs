//! Metrics registry
//!
//! - Counters only (no gauges, no histograms)
//! - Monotonic increase
//! - Reset only on process start
//! - Thread-safe but lock-minimal

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Metrics registry containing all query counters
///
/// # Thread Safety
///
/// All counters use atomic operations with Relaxed ordering.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Successful query count
    queries_executed: AtomicU64,
    /// Rejected query count
    queries_rejected: AtomicU64,
    /// Queries over the row cap
    queries_too_large: AtomicU64,
    /// Rows returned across all queries
    rows_returned: AtomicU64,
    /// Records read across all queries
    records_scanned: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment queries executed
    pub fn increment_queries_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment queries rejected
    pub fn increment_queries_rejected(&self) {
        self.queries_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment queries too large
    pub fn increment_queries_too_large(&self) {
        self.queries_too_large.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_rows_returned(&self, rows: u64) {
        self.rows_returned.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn add_records_scanned(&self, records: u64) {
        self.records_scanned.fetch_add(records, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_rejected: self.queries_rejected.load(Ordering::Relaxed),
            queries_too_large: self.queries_too_large.load(Ordering::Relaxed),
            rows_returned: self.rows_returned.load(Ordering::Relaxed),
            records_scanned: self.records_scanned.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub queries_executed: u64,
    pub queries_rejected: u64,
    pub queries_too_large: u64,
    pub rows_returned: u64,
    pub records_scanned: u64,
}

impl MetricsSnapshot {
    /// Counters as log fields, in declaration order
    pub fn fields(&self) -> [(&'static str, String); 5] {
        [
            ("queries_executed", self.queries_executed.to_string()),
            ("queries_rejected", self.queries_rejected.to_string()),
            ("queries_too_large", self.queries_too_large.to_string()),
            ("rows_returned", self.rows_returned.to_string()),
            ("records_scanned", self.records_scanned.to_string()),
        ]
    }
}
