// Copyright (c) 2025 ADBC Drivers Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Parallel fetch orchestrator.
//!
//! ```text
//! [fetch_chunks] --task_channel--> [Fetch Workers x W] --> [PageTransport]
//!       |                                  |
//!       +-- ChunkHandle (plan order) <-----+ oneshot result
//! ```
//!
//! ## Ordering Invariant
//!
//! Every task is queued before any worker starts, and handles are awaited in
//! plan order. Chunks complete in any order; the returned tables are always
//! in ascending `start_row` order.
//!
//! ## Failures
//!
//! The orchestrator waits for every chunk to reach a terminal state, then
//! reports the first failed chunk in plan order. A [`Error::Cancelled`]
//! outcome is only reported when no chunk has a real failure.
//!
//! Dropping the `fetch_chunks` future cancels the workers: queued chunks are
//! answered without a request and in-flight fetches are abandoned.

use crate::error::{Error, Result};
use crate::reader::chunked::chunk_fetcher::ChunkFetcher;
use crate::reader::chunked::fetch_workers::spawn_fetch_workers;
use crate::reader::chunked::pipeline_types::{create_chunk_pair, ChunkFetchTask, ChunkHandle};
use crate::reader::parser::ChunkTable;
use crate::reader::planner::effective_workers;
use crate::types::dataset::ChunkSpec;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Fetch every chunk in `chunks` with at most `max_workers` concurrent fetches.
///
/// Returns one table per chunk in the order of `chunks`, or the first failure
/// in that order wrapped as [`Error::Chunk`]. No partial result is returned.
pub async fn fetch_chunks(
    chunks: &[ChunkSpec],
    fetcher: Arc<ChunkFetcher>,
    max_workers: usize,
    cancel_on_failure: bool,
) -> Result<Vec<ChunkTable>> {
    if chunks.is_empty() {
        return Ok(Vec::new());
    }

    let (task_tx, task_rx) = mpsc::unbounded_channel::<ChunkFetchTask>();
    let mut handles: Vec<ChunkHandle> = Vec::with_capacity(chunks.len());
    for spec in chunks {
        let (task, handle) = create_chunk_pair(*spec);
        task_tx
            .send(task)
            .map_err(|_| Error::Internal("Task channel closed before dispatch".to_string()))?;
        handles.push(handle);
    }
    // Workers exit once the queue is drained
    drop(task_tx);

    let num_workers = effective_workers(max_workers, chunks.len());
    debug!(
        "Dispatching {} chunks to {} workers",
        chunks.len(),
        num_workers
    );

    let cancel_token = CancellationToken::new();
    // Stops the workers if this future is dropped before they finish
    let _cancel_on_drop = cancel_token.clone().drop_guard();
    let workers = spawn_fetch_workers(
        task_rx,
        num_workers,
        fetcher,
        cancel_token.clone(),
        cancel_on_failure,
    );

    let mut outcomes: Vec<(ChunkSpec, Result<ChunkTable>)> = Vec::with_capacity(handles.len());
    for handle in handles {
        let spec = handle.spec;
        let outcome = handle.result_rx.await.unwrap_or_else(|_| {
            Err(Error::Internal(format!(
                "Worker exited without reporting chunk {}",
                spec
            )))
        });
        outcomes.push((spec, outcome));
    }

    for worker in workers {
        if let Err(e) = worker.await {
            error!("Fetch worker terminated abnormally: {}", e);
        }
    }

    collect_outcomes(outcomes)
}

/// Tables in plan order, or the first real failure in plan order.
fn collect_outcomes(outcomes: Vec<(ChunkSpec, Result<ChunkTable>)>) -> Result<Vec<ChunkTable>> {
    let mut tables = Vec::with_capacity(outcomes.len());
    let mut first_failure: Option<Error> = None;
    let mut first_cancelled: Option<Error> = None;

    for (spec, outcome) in outcomes {
        match outcome {
            Ok(table) => tables.push(table),
            Err(e) if e.is_cancelled() => {
                if first_cancelled.is_none() {
                    first_cancelled = Some(e.in_chunk(spec.start_row, spec.length));
                }
            }
            Err(e) => {
                if first_failure.is_none() {
                    first_failure = Some(e.in_chunk(spec.start_row, spec.length));
                }
            }
        }
    }

    match first_failure.or(first_cancelled) {
        Some(e) => Err(e),
        None => Ok(tables),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{PageTransport, RawPageResponse};
    use crate::reader::planner::plan_chunks;
    use crate::types::dataset::{DatasetSource, DatasetStructure, RowShape};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Serves `{"n": i}` rows, tracking concurrency and optionally failing pages.
    #[derive(Debug, Default)]
    struct MockTransport {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        calls: AtomicUsize,
        fail_at: HashSet<u64>,
        /// Earlier pages wait longer, so completion order is reversed.
        reverse_latency: bool,
        /// Fixed per-page latency, overriding the default.
        latency: Option<Duration>,
        started: Mutex<Vec<u64>>,
    }

    impl MockTransport {
        fn failing(starts: &[u64]) -> Self {
            Self {
                fail_at: starts.iter().copied().collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl PageTransport for MockTransport {
        async fn fetch_page(
            &self,
            _source: &DatasetSource,
            start_row: u64,
            page_size: u64,
        ) -> Result<RawPageResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.started.lock().unwrap().push(start_row);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let delay = match self.latency {
                Some(latency) => latency,
                None if self.reverse_latency => {
                    Duration::from_millis(50u64.saturating_sub(start_row))
                }
                None => Duration::from_millis(5),
            };
            tokio::time::sleep(delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail_at.contains(&start_row) {
                return Err(Error::Transport(format!("HTTP 503 - page {}", start_row)));
            }
            let rows: Vec<_> = (start_row..start_row + page_size)
                .map(|n| json!({ "n": n }))
                .collect();
            Ok(RawPageResponse {
                start_row,
                page_size,
                body: json!({"WUResultResponse": {"Result": {"Row": rows}}}).to_string(),
            })
        }
    }

    fn fetcher(transport: Arc<MockTransport>, row_count: u64) -> Arc<ChunkFetcher> {
        let structure = DatasetStructure {
            column_names: vec!["n".to_string()],
            row_count,
            first_data_row: 0,
        };
        Arc::new(ChunkFetcher::new(
            transport,
            DatasetSource::logical_file("~test::numbers"),
            Arc::new(structure),
            RowShape::Structured,
        ))
    }

    fn flatten(tables: &[ChunkTable]) -> Vec<Option<String>> {
        tables.iter().flat_map(|t| t.columns[0].clone()).collect()
    }

    fn expected(row_count: u64) -> Vec<Option<String>> {
        (0..row_count).map(|n| Some(n.to_string())).collect()
    }

    #[tokio::test]
    async fn test_empty_plan_fetches_nothing() {
        let transport = Arc::new(MockTransport::default());
        let tables = fetch_chunks(&[], fetcher(transport.clone(), 0), 4, false)
            .await
            .unwrap();
        assert!(tables.is_empty());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded_by_max_workers() {
        let transport = Arc::new(MockTransport::default());
        let chunks = plan_chunks(60, 5).unwrap();

        let tables = fetch_chunks(&chunks, fetcher(transport.clone(), 60), 3, false)
            .await
            .unwrap();

        assert_eq!(tables.len(), 12);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 12);
        assert!(transport.max_in_flight.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_results_follow_plan_order_not_completion_order() {
        let transport = Arc::new(MockTransport {
            reverse_latency: true,
            ..Default::default()
        });
        let chunks = plan_chunks(40, 4).unwrap();

        let tables = fetch_chunks(&chunks, fetcher(transport, 40), 10, false)
            .await
            .unwrap();

        assert_eq!(flatten(&tables), expected(40));
    }

    #[tokio::test]
    async fn test_dispatch_order_is_ascending() {
        let transport = Arc::new(MockTransport::default());
        let chunks = plan_chunks(30, 10).unwrap();

        fetch_chunks(&chunks, fetcher(transport.clone(), 30), 1, false)
            .await
            .unwrap();

        assert_eq!(*transport.started.lock().unwrap(), vec![0, 10, 20]);
    }

    #[tokio::test]
    async fn test_first_failure_in_plan_order_is_reported() {
        let transport = Arc::new(MockTransport::failing(&[20, 10]));
        let chunks = plan_chunks(40, 10).unwrap();

        let err = fetch_chunks(&chunks, fetcher(transport.clone(), 40), 4, false)
            .await
            .unwrap_err();

        assert_eq!(err.chunk_range(), Some((10, 10)));
        assert!(err.is_transport());
        // Without cancellation every chunk still runs
        assert_eq!(transport.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_cancel_on_failure_skips_remaining_chunks() {
        let transport = Arc::new(MockTransport::failing(&[0]));
        let chunks = plan_chunks(50, 10).unwrap();

        let err = fetch_chunks(&chunks, fetcher(transport.clone(), 50), 1, true)
            .await
            .unwrap_err();

        // The real failure wins over the cancelled siblings
        assert!(err.is_transport());
        assert_eq!(err.chunk_range(), Some((0, 10)));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropped_retrieval_stops_fetching() {
        let transport = Arc::new(MockTransport {
            latency: Some(Duration::from_millis(20)),
            ..Default::default()
        });
        let chunks = plan_chunks(100, 10).unwrap();

        let result = tokio::time::timeout(
            Duration::from_millis(30),
            fetch_chunks(&chunks, fetcher(transport.clone(), 100), 1, false),
        )
        .await;
        assert!(result.is_err());

        let calls_at_drop = transport.calls.load(Ordering::SeqCst);
        assert!(calls_at_drop < chunks.len());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(transport.calls.load(Ordering::SeqCst), calls_at_drop);
    }

    #[test]
    fn test_collect_prefers_failure_over_earlier_cancellation() {
        let outcomes = vec![
            (ChunkSpec::new(0, 5), Err(Error::Cancelled)),
            (
                ChunkSpec::new(5, 5),
                Err(Error::Parse("bad page".to_string())),
            ),
        ];

        let err = collect_outcomes(outcomes).unwrap_err();
        assert!(err.is_parse());
        assert_eq!(err.chunk_range(), Some((5, 5)));
    }

    #[test]
    fn test_collect_reports_cancellation_when_nothing_else_failed() {
        let outcomes = vec![
            (ChunkSpec::new(0, 5), Ok(ChunkTable::with_columns(1))),
            (ChunkSpec::new(5, 5), Err(Error::Cancelled)),
        ];

        let err = collect_outcomes(outcomes).unwrap_err();
        assert!(err.is_cancelled());
    }
}
