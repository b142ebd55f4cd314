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

//! Task and handle types for the chunk fetch pool.
//!
//! - `ChunkFetchTask` - queued for the workers, owned by one worker while it runs
//! - `ChunkHandle` - kept by the orchestrator in plan order and awaited there
//!
//! ```text
//! [Orchestrator] --task_channel--> [Fetch Workers]
//!       |                                |
//!   ChunkHandle (plan order)   <---- oneshot result
//! ```
//!
//! Each pair shares a oneshot channel, so results are read back in plan
//! order however the workers happen to finish.

use crate::error::Result;
use crate::reader::parser::ChunkTable;
use crate::types::dataset::ChunkSpec;
use tokio::sync::oneshot;

/// A chunk to fetch, with the sender for its result.
#[derive(Debug)]
pub struct ChunkFetchTask {
    pub spec: ChunkSpec,
    /// Consumed by the worker once the chunk reaches a terminal state.
    pub result_tx: oneshot::Sender<Result<ChunkTable>>,
}

/// The orchestrator's side of a chunk.
#[derive(Debug)]
pub struct ChunkHandle {
    pub spec: ChunkSpec,
    pub result_rx: oneshot::Receiver<Result<ChunkTable>>,
}

/// Creates a connected (ChunkFetchTask, ChunkHandle) pair for `spec`.
pub fn create_chunk_pair(spec: ChunkSpec) -> (ChunkFetchTask, ChunkHandle) {
    let (result_tx, result_rx) = oneshot::channel();
    (
        ChunkFetchTask { spec, result_tx },
        ChunkHandle { spec, result_rx },
    )
}
