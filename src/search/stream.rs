//! Incremental delivery of query outcomes

use crate::metrics::Metrics;
use crate::results::{QueryOutcome, StreamedItem};
use futures::Stream;
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Live sequence of stream records in completion order
///
/// A resolved unit's candidates are yielded back to back in the backend's
/// order; a failed unit yields a single failure record. The stream ends once
/// every unit has resolved. Dropping it early aborts the remaining units,
/// which cancels their in-flight backend calls.
pub struct ResultStream {
    tasks: JoinSet<QueryOutcome>,
    pending: VecDeque<StreamedItem>,
    metrics: Option<Arc<Metrics>>,
}

impl ResultStream {
    pub(crate) fn new(tasks: JoinSet<QueryOutcome>, metrics: Option<Arc<Metrics>>) -> Self {
        Self {
            tasks,
            pending: VecDeque::new(),
            metrics,
        }
    }

    /// Units not yet consumed by the stream
    pub fn outstanding(&self) -> usize {
        self.tasks.len()
    }
}

impl Stream for ResultStream {
    type Item = StreamedItem;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(item) = this.pending.pop_front() {
                return Poll::Ready(Some(item));
            }

            match ready!(this.tasks.poll_join_next(cx)) {
                Some(Ok(outcome)) => this.pending.extend(StreamedItem::from_outcome(outcome)),
                Some(Err(e)) => warn!("Query task ended without an outcome: {}", e),
                None => return Poll::Ready(None),
            }
        }
    }
}

impl Drop for ResultStream {
    fn drop(&mut self) {
        let outstanding = self.tasks.len();
        if outstanding == 0 {
            return;
        }

        debug!(
            "Result stream dropped with {} queries outstanding, cancelling",
            outstanding
        );
        self.tasks.abort_all();

        if let Some(ref metrics) = self.metrics {
            metrics.record_cancelled(outstanding);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{Candidate, FailureKind, QueryFailure};
    use futures::StreamExt;
    use std::time::Duration;

    fn spawn_outcome(tasks: &mut JoinSet<QueryOutcome>, index: usize, delay_ms: u64, ok: bool) {
        tasks.spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            let query = format!("q{}", index);
            let result = if ok {
                Ok(vec![
                    Candidate::labeled(format!("{}-0", query)),
                    Candidate::labeled(format!("{}-1", query)),
                ])
            } else {
                Err(QueryFailure {
                    index,
                    query: query.clone(),
                    kind: FailureKind::BackendUnavailable,
                    message: "down".to_string(),
                })
            };
            QueryOutcome {
                index,
                query,
                elapsed: Duration::from_millis(delay_ms),
                result,
            }
        });
    }

    #[tokio::test]
    async fn test_items_arrive_in_completion_order() {
        let mut tasks = JoinSet::new();
        spawn_outcome(&mut tasks, 0, 150, true);
        spawn_outcome(&mut tasks, 1, 10, true);
        spawn_outcome(&mut tasks, 2, 60, false);

        let items: Vec<_> = ResultStream::new(tasks, None).collect().await;
        let indexes: Vec<_> = items.iter().map(|i| i.index()).collect();
        assert_eq!(indexes, vec![1, 1, 2, 0, 0]);
        assert!(items[2].is_failure());
    }

    #[tokio::test]
    async fn test_drop_aborts_outstanding() {
        let metrics = Arc::new(Metrics::new());
        let mut tasks = JoinSet::new();
        spawn_outcome(&mut tasks, 0, 5, true);
        spawn_outcome(&mut tasks, 1, 10_000, true);

        let mut stream = ResultStream::new(tasks, Some(metrics.clone()));
        let first = stream.next().await.unwrap();
        assert_eq!(first.index(), 0);
        assert_eq!(stream.outstanding(), 1);

        drop(stream);
        assert_eq!(metrics.snapshot().cancelled, 1);
    }

    #[tokio::test]
    async fn test_empty_stream_ends() {
        let mut stream = ResultStream::new(JoinSet::new(), None);
        assert!(stream.next().await.is_none());
    }
}
