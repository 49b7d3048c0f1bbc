//! Query fan-out and batch collection

use super::stream::ResultStream;
use crate::backend::{BackendError, SearchBackend};
use crate::config::SearchSettings;
use crate::metrics::Metrics;
use crate::results::{AggregateResult, Candidate, QueryFailure, QueryOutcome};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, warn, Instrument};

/// Starts one independent backend search per query
#[derive(Clone)]
pub struct Dispatcher {
    /// Long-lived backend handle shared by every request
    backend: Arc<dyn SearchBackend>,
    /// Calls in flight per dispatch; None means one per query
    max_concurrency: Option<usize>,
    /// Deadline for a single backend call
    timeout: Duration,
    metrics: Option<Arc<Metrics>>,
}

impl Dispatcher {
    /// Create a dispatcher with default search settings
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self::with_settings(backend, &SearchSettings::default())
    }

    /// Create a dispatcher from configured search settings
    pub fn with_settings(backend: Arc<dyn SearchBackend>, settings: &SearchSettings) -> Self {
        Self {
            backend,
            max_concurrency: settings.max_concurrency,
            timeout: settings.query_timeout(),
            metrics: None,
        }
    }

    /// Set concurrency ceiling
    pub fn with_max_concurrency(mut self, ceiling: Option<usize>) -> Self {
        self.max_concurrency = ceiling;
        self
    }

    /// Set per-call deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Report outcomes to a metrics collector
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn backend(&self) -> &Arc<dyn SearchBackend> {
        &self.backend
    }

    /// Spawn one unit of work per query
    ///
    /// Units start immediately and run independently; a unit waits for a
    /// permit only when the concurrency ceiling is below the query count.
    /// Must be called from within a tokio runtime.
    pub fn dispatch<I, S>(&self, queries: I, limit: usize) -> Dispatch
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let queries: Vec<String> = queries.into_iter().map(Into::into).collect();
        let len = queries.len();

        let ceiling = self
            .max_concurrency
            .unwrap_or(len)
            .clamp(1, Semaphore::MAX_PERMITS);
        let permits = Arc::new(Semaphore::new(ceiling));

        debug!(
            "Dispatching {} queries to {} (limit {}, concurrency {})",
            len,
            self.backend.name(),
            limit,
            ceiling
        );

        let mut tasks = JoinSet::new();
        for (index, query) in queries.into_iter().enumerate() {
            let task = QueryTask {
                index,
                query,
                limit,
                backend: self.backend.clone(),
                permits: permits.clone(),
                timeout: self.timeout,
                metrics: self.metrics.clone(),
            };
            // tasks inherit the caller's request span
            tasks.spawn(task.run().in_current_span());
        }

        if let Some(ref metrics) = self.metrics {
            metrics.record_dispatched(len);
        }

        Dispatch {
            tasks,
            len,
            metrics: self.metrics.clone(),
        }
    }
}

/// One query's unit of work
struct QueryTask {
    index: usize,
    query: String,
    limit: usize,
    backend: Arc<dyn SearchBackend>,
    permits: Arc<Semaphore>,
    timeout: Duration,
    metrics: Option<Arc<Metrics>>,
}

impl QueryTask {
    async fn run(self) -> QueryOutcome {
        let start = Instant::now();
        let result = self.call().await;
        let elapsed = start.elapsed();

        let result = match result {
            Ok(candidates) => {
                debug!(
                    "Query {} '{}' returned {} candidates in {:?}",
                    self.index,
                    self.query,
                    candidates.len(),
                    elapsed
                );
                Ok(candidates)
            }
            Err(e) => {
                warn!("Query {} '{}' failed: {}", self.index, self.query, e);
                Err(QueryFailure {
                    index: self.index,
                    query: self.query.clone(),
                    kind: e.kind(),
                    message: e.to_string(),
                })
            }
        };

        let outcome = QueryOutcome {
            index: self.index,
            query: self.query,
            elapsed,
            result,
        };

        if let Some(ref metrics) = self.metrics {
            metrics.record_outcome(&outcome);
        }

        outcome
    }

    async fn call(&self) -> Result<Vec<Candidate>, BackendError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| BackendError::Unavailable(format!("permit unavailable: {}", e)))?;

        // A panicking backend resolves this unit only
        let search = AssertUnwindSafe(self.backend.search(&self.query, self.limit)).catch_unwind();

        match timeout(self.timeout, search).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(BackendError::Unavailable(
                "backend call panicked".to_string(),
            )),
            Err(_) => Err(BackendError::Timeout),
        }
    }
}

/// Handle to the units started by one dispatch
///
/// Dropping the handle aborts every unit that has not resolved yet.
pub struct Dispatch {
    tasks: JoinSet<QueryOutcome>,
    len: usize,
    metrics: Option<Arc<Metrics>>,
}

impl Dispatch {
    /// Number of dispatched units
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Wait for the next unit to resolve, in completion order
    pub async fn next_outcome(&mut self) -> Option<QueryOutcome> {
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(outcome) => return Some(outcome),
                Err(e) => warn!("Query task ended without an outcome: {}", e),
            }
        }
        None
    }

    /// Wait for every unit and combine their outcomes
    ///
    /// Failed queries are listed in the result instead of failing the batch.
    pub async fn collect_all(mut self) -> AggregateResult {
        let mut aggregate = AggregateResult::with_capacity(self.len);
        while let Some(outcome) = self.next_outcome().await {
            aggregate.push(outcome);
        }
        aggregate
    }

    /// Deliver candidates as each unit resolves
    pub fn into_stream(self) -> ResultStream {
        ResultStream::new(self.tasks, self.metrics)
    }
}
