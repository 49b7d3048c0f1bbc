//! Metrics collection module
//!
//! Tracks dispatched queries, failure categories and backend latency.

use crate::results::{FailureKind, QueryOutcome};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide counters, updated from every dispatched unit
#[derive(Debug, Default)]
pub struct Metrics {
    requests: AtomicU64,
    queries_dispatched: AtomicU64,
    successes: AtomicU64,
    unavailable: AtomicU64,
    timeouts: AtomicU64,
    malformed: AtomicU64,
    cancelled: AtomicU64,
    candidates: AtomicU64,
    /// Sum of resolved query times in ms
    total_time_ms: AtomicU64,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment accepted request count
    pub fn inc_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Record queries handed to the dispatcher
    pub fn record_dispatched(&self, count: usize) {
        self.queries_dispatched
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Record units aborted before they resolved
    pub fn record_cancelled(&self, count: usize) {
        self.cancelled.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Record a resolved unit
    pub fn record_outcome(&self, outcome: &QueryOutcome) {
        self.total_time_ms
            .fetch_add(outcome.elapsed.as_millis() as u64, Ordering::Relaxed);

        match &outcome.result {
            Ok(candidates) => {
                self.successes.fetch_add(1, Ordering::Relaxed);
                self.candidates
                    .fetch_add(candidates.len() as u64, Ordering::Relaxed);
            }
            Err(failure) => {
                let counter = match failure.kind {
                    FailureKind::BackendUnavailable => &self.unavailable,
                    FailureKind::BackendTimeout => &self.timeouts,
                    FailureKind::MalformedBackendResponse => &self.malformed,
                };
                counter.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        let successes = self.successes.load(Ordering::Relaxed);
        let failures = FailureCounts {
            backend_unavailable: self.unavailable.load(Ordering::Relaxed),
            backend_timeout: self.timeouts.load(Ordering::Relaxed),
            malformed_backend_response: self.malformed.load(Ordering::Relaxed),
        };
        let resolved = successes + failures.total();

        let avg_response_time_ms = if resolved == 0 {
            None
        } else {
            Some(self.total_time_ms.load(Ordering::Relaxed) / resolved)
        };

        let reliability = if resolved == 0 {
            100.0
        } else {
            (successes as f64 / resolved as f64) * 100.0
        };

        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            queries_dispatched: self.queries_dispatched.load(Ordering::Relaxed),
            successes,
            failures,
            cancelled: self.cancelled.load(Ordering::Relaxed),
            candidates_returned: self.candidates.load(Ordering::Relaxed),
            avg_response_time_ms,
            reliability,
        }
    }
}

/// Failure counters by category
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FailureCounts {
    pub backend_unavailable: u64,
    pub backend_timeout: u64,
    pub malformed_backend_response: u64,
}

impl FailureCounts {
    pub fn total(&self) -> u64 {
        self.backend_unavailable + self.backend_timeout + self.malformed_backend_response
    }
}

/// Serializable view served by the stats endpoint
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub queries_dispatched: u64,
    pub successes: u64,
    pub failures: FailureCounts,
    pub cancelled: u64,
    pub candidates_returned: u64,
    pub avg_response_time_ms: Option<u64>,
    /// Percentage of resolved queries that succeeded
    pub reliability: f64,
}
