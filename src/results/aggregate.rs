//! Batch aggregation of query outcomes

use super::types::*;
use serde::{Deserialize, Serialize};

/// Combined response of a batch search
///
/// Candidates of every successful query are concatenated in completion
/// order; each query's own candidates keep the backend's order. Failed
/// queries contribute no candidates and are listed in `failures`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub candidates: Vec<Candidate>,
    pub failures: Vec<QueryFailure>,
    pub timings: Vec<Timing>,
    /// True when no query failed
    pub complete: bool,
}

impl AggregateResult {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(queries: usize) -> Self {
        Self {
            candidates: Vec::new(),
            failures: Vec::new(),
            timings: Vec::with_capacity(queries),
            complete: true,
        }
    }

    /// Fold one outcome into the aggregate
    pub fn push(&mut self, outcome: QueryOutcome) {
        self.timings.push(outcome.timing());
        match outcome.result {
            Ok(candidates) => self.candidates.extend(candidates),
            Err(failure) => {
                self.failures.push(failure);
                self.complete = false;
            }
        }
    }

    /// Number of queries folded in so far
    pub fn query_count(&self) -> usize {
        self.timings.len()
    }

    pub fn success_count(&self) -> usize {
        self.timings.len() - self.failures.len()
    }
}

impl Default for AggregateResult {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<QueryOutcome> for AggregateResult {
    fn from_iter<I: IntoIterator<Item = QueryOutcome>>(iter: I) -> Self {
        let mut aggregate = Self::new();
        for outcome in iter {
            aggregate.push(outcome);
        }
        aggregate
    }
}
