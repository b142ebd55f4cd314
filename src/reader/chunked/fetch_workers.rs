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

//! Fetch workers for the chunked retrieval pool.
//!
//! Workers are short-lived tokio tasks that share a single task channel. Each
//! worker pulls a [`ChunkFetchTask`], runs it through the [`ChunkFetcher`] and
//! sends the outcome through the task's oneshot channel. A worker exits once
//! the channel is drained and closed.
//!
//! ## Failure handling
//!
//! A failed chunk never stops its worker. When `cancel_on_failure` is set the
//! first failure cancels the shared token: in-flight fetches are abandoned
//! and every task still queued is answered with [`Error::Cancelled`] instead
//! of being fetched.

use crate::error::{Error, Result};
use crate::reader::chunked::chunk_fetcher::ChunkFetcher;
use crate::reader::chunked::pipeline_types::ChunkFetchTask;
use crate::reader::parser::ChunkTable;
use crate::types::dataset::ChunkSpec;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

type SharedTaskReceiver = Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<ChunkFetchTask>>>;

/// Spawns `num_workers` workers that drain `task_rx`.
///
/// # Arguments
///
/// * `task_rx` - Receiver for queued chunk tasks
/// * `num_workers` - Number of concurrent fetches, at least 1
/// * `fetcher` - Shared fetch-and-parse logic
/// * `cancel_token` - Token observed by every worker
/// * `cancel_on_failure` - Whether the first failed chunk cancels the rest
pub fn spawn_fetch_workers(
    task_rx: mpsc::UnboundedReceiver<ChunkFetchTask>,
    num_workers: usize,
    fetcher: Arc<ChunkFetcher>,
    cancel_token: CancellationToken,
    cancel_on_failure: bool,
) -> Vec<JoinHandle<()>> {
    let num_workers = num_workers.max(1);

    // Wrap the receiver in Arc<Mutex> so workers can share it
    let task_rx = Arc::new(tokio::sync::Mutex::new(task_rx));

    debug!(
        "Spawning {} fetch workers (cancel_on_failure={})",
        num_workers, cancel_on_failure
    );

    (0..num_workers)
        .map(|worker_id| {
            let rx = Arc::clone(&task_rx);
            let fetcher = Arc::clone(&fetcher);
            let token = cancel_token.clone();
            tokio::spawn(async move {
                worker_task(worker_id, rx, fetcher, token, cancel_on_failure).await;
            })
        })
        .collect()
}

async fn worker_task(
    worker_id: usize,
    task_rx: SharedTaskReceiver,
    fetcher: Arc<ChunkFetcher>,
    cancel_token: CancellationToken,
    cancel_on_failure: bool,
) {
    trace!("Worker {} started", worker_id);

    loop {
        // The lock is held only while receiving, so fetches run concurrently
        let task = {
            let mut rx = task_rx.lock().await;
            rx.recv().await
        };

        let Some(task) = task else {
            trace!("Worker {} finished: task channel closed", worker_id);
            return;
        };

        let spec = task.spec;
        let result = process_task(&fetcher, task.spec, &cancel_token).await;

        if let Err(e) = &result {
            if !e.is_cancelled() {
                warn!("Worker {}: chunk {} failed: {}", worker_id, spec, e);
                if cancel_on_failure && !cancel_token.is_cancelled() {
                    debug!("Worker {}: cancelling remaining chunks", worker_id);
                    cancel_token.cancel();
                }
            }
        }

        // The orchestrator may have stopped listening; nothing to do then
        if task.result_tx.send(result).is_err() {
            trace!("Worker {}: handle for chunk {} dropped", worker_id, spec);
        }
    }
}

async fn process_task(
    fetcher: &ChunkFetcher,
    spec: ChunkSpec,
    cancel_token: &CancellationToken,
) -> Result<ChunkTable> {
    if cancel_token.is_cancelled() {
        return Err(Error::Cancelled);
    }

    tokio::select! {
        _ = cancel_token.cancelled() => {
            trace!("Chunk {} abandoned after cancellation", spec);
            Err(Error::Cancelled)
        }
        result = fetcher.fetch(spec) => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{PageTransport, RawPageResponse};
    use crate::reader::chunked::pipeline_types::{create_chunk_pair, ChunkHandle};
    use crate::types::dataset::{DatasetSource, DatasetStructure, RowShape};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves `{"n": i}` rows; fails the page starting at `fail_at`.
    #[derive(Debug)]
    struct CountingTransport {
        calls: AtomicUsize,
        fail_at: Option<u64>,
    }

    impl CountingTransport {
        fn new(fail_at: Option<u64>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_at,
            }
        }
    }

    #[async_trait]
    impl PageTransport for CountingTransport {
        async fn fetch_page(
            &self,
            _source: &DatasetSource,
            start_row: u64,
            page_size: u64,
        ) -> Result<RawPageResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_at == Some(start_row) {
                return Err(Error::Transport("HTTP 500 - boom".to_string()));
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

    fn fetcher(transport: Arc<CountingTransport>) -> Arc<ChunkFetcher> {
        let structure = DatasetStructure {
            column_names: vec!["n".to_string()],
            row_count: 40,
            first_data_row: 0,
        };
        Arc::new(ChunkFetcher::new(
            transport,
            DatasetSource::logical_file("~test::numbers"),
            Arc::new(structure),
            RowShape::Structured,
        ))
    }

    fn queue(specs: &[ChunkSpec]) -> (mpsc::UnboundedReceiver<ChunkFetchTask>, Vec<ChunkHandle>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handles = specs
            .iter()
            .map(|spec| {
                let (task, handle) = create_chunk_pair(*spec);
                tx.send(task).unwrap();
                handle
            })
            .collect();
        (rx, handles)
    }

    fn specs() -> Vec<ChunkSpec> {
        (0..4).map(|i| ChunkSpec::new(i * 10, 10)).collect()
    }

    #[tokio::test]
    async fn test_workers_answer_every_task() {
        let transport = Arc::new(CountingTransport::new(None));
        let (rx, handles) = queue(&specs());

        let workers = spawn_fetch_workers(
            rx,
            2,
            fetcher(transport.clone()),
            CancellationToken::new(),
            false,
        );

        for (i, handle) in handles.into_iter().enumerate() {
            let table = handle.result_rx.await.unwrap().unwrap();
            assert_eq!(table.columns[0][0], Some((i * 10).to_string()));
        }
        for worker in workers {
            worker.await.unwrap();
        }
        assert_eq!(transport.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_failure_without_cancellation_keeps_going() {
        let transport = Arc::new(CountingTransport::new(Some(10)));
        let (rx, handles) = queue(&specs());

        let workers = spawn_fetch_workers(
            rx,
            1,
            fetcher(transport.clone()),
            CancellationToken::new(),
            false,
        );

        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.result_rx.await.unwrap());
        }
        for worker in workers {
            worker.await.unwrap();
        }

        assert!(outcomes[0].is_ok());
        assert!(outcomes[1].as_ref().unwrap_err().is_transport());
        assert!(outcomes[2].is_ok());
        assert!(outcomes[3].is_ok());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_failure_cancels_queued_tasks() {
        let transport = Arc::new(CountingTransport::new(Some(0)));
        let (rx, handles) = queue(&specs());
        let token = CancellationToken::new();

        // A single worker processes tasks strictly in queue order
        let workers = spawn_fetch_workers(rx, 1, fetcher(transport.clone()), token.clone(), true);

        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.result_rx.await.unwrap());
        }
        for worker in workers {
            worker.await.unwrap();
        }

        assert!(token.is_cancelled());
        assert!(outcomes[0].as_ref().unwrap_err().is_transport());
        for outcome in &outcomes[1..] {
            assert!(outcome.as_ref().unwrap_err().is_cancelled());
        }
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_skips_fetching() {
        let transport = Arc::new(CountingTransport::new(None));
        let (rx, handles) = queue(&specs());
        let token = CancellationToken::new();
        token.cancel();

        let workers = spawn_fetch_workers(rx, 3, fetcher(transport.clone()), token, false);

        for handle in handles {
            assert!(handle.result_rx.await.unwrap().unwrap_err().is_cancelled());
        }
        for worker in workers {
            worker.await.unwrap();
        }
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }
}
