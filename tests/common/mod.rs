//! Deterministic in-process backend for fan-out tests

#![allow(dead_code)]

use async_trait::async_trait;
use multisearch_rs::backend::{BackendError, SearchBackend};
use multisearch_rs::results::Candidate;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Backend whose behavior is keyed by query text
///
/// Every query returns `limit` candidates labeled `"<query>#<i>"` unless it
/// is configured to fail. Call, in-flight and completion counters let tests
/// observe fan-out and cancellation.
#[derive(Default)]
pub struct StubBackend {
    delays: HashMap<String, Duration>,
    failing: HashSet<String>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    completed: AtomicUsize,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, query: &str, ms: u64) -> Self {
        self.delays
            .insert(query.to_string(), Duration::from_millis(ms));
        self
    }

    pub fn failing(mut self, query: &str) -> Self {
        self.failing.insert(query.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Calls that ran to the end instead of being cancelled
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

/// Decrements the in-flight counter even when the call is cancelled
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SearchBackend for StubBackend {
    fn name(&self) -> &str {
        "stub"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Candidate>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        if let Some(delay) = self.delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(query) {
            return Err(BackendError::Unavailable(format!(
                "stub refused '{}'",
                query
            )));
        }

        Ok((0..limit)
            .map(|i| Candidate::labeled(format!("{}#{}", query, i)).with_id(format!("{}", i)))
            .collect())
    }
}

/// Label of a candidate, for assertions
pub fn label(candidate: &Candidate) -> &str {
    candidate.label.as_deref().unwrap_or_default()
}
