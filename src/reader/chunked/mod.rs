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

//! Parallel chunked retrieval.
//!
//! The planner's chunks are queued as [`ChunkFetchTask`]s for a bounded pool
//! of fetch workers; results come back through per-chunk oneshot channels
//! and are collected in plan order by [`fetch_chunks`].

mod chunk_fetcher;
mod fetch_workers;
mod orchestrator;
mod pipeline_types;

pub use chunk_fetcher::ChunkFetcher;
pub use fetch_workers::spawn_fetch_workers;
pub use orchestrator::fetch_chunks;
pub use pipeline_types::{create_chunk_pair, ChunkFetchTask, ChunkHandle};
