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

//! Chunk planning.
//!
//! Splits a dataset's row range into contiguous, non-overlapping
//! [`ChunkSpec`]s, and sizes chunks and the worker pool for a retrieval.

use crate::error::{Error, Result};
use crate::types::dataset::ChunkSpec;
use crate::types::fetch::ChunkSize;

/// Partition `[0, row_count)` into chunks of `chunk_size` rows.
///
/// Every chunk but the last is exactly `chunk_size` long; the last holds the
/// remainder. Zero rows yields no chunks.
pub fn plan_chunks(row_count: u64, chunk_size: u64) -> Result<Vec<ChunkSpec>> {
    if chunk_size == 0 {
        return Err(Error::Config("chunk_size must be positive".to_string()));
    }

    let num_chunks = row_count.div_ceil(chunk_size);
    let mut chunks = Vec::with_capacity(num_chunks as usize);
    let mut start_row = 0;
    while start_row < row_count {
        let length = chunk_size.min(row_count - start_row);
        chunks.push(ChunkSpec::new(start_row, length));
        start_row += length;
    }

    Ok(chunks)
}

/// Resolve the configured chunk size against the dataset size.
///
/// `Auto` spreads the rows evenly over `max_workers`, but never below
/// `min_chunk_size` so a large pool does not issue many tiny requests.
pub fn resolve_chunk_size(
    chunk_size: ChunkSize,
    row_count: u64,
    max_workers: usize,
    min_chunk_size: u64,
) -> Result<u64> {
    if max_workers == 0 {
        return Err(Error::Config("max_workers must be at least 1".to_string()));
    }

    match chunk_size {
        ChunkSize::Fixed(0) => Err(Error::Config("chunk_size must be positive".to_string())),
        ChunkSize::Fixed(size) => Ok(size),
        ChunkSize::Auto => {
            let even_split = row_count.div_ceil(max_workers as u64);
            Ok(even_split.max(min_chunk_size).max(1))
        }
    }
}

/// Workers worth spawning for `num_chunks` tasks.
pub fn effective_workers(max_workers: usize, num_chunks: usize) -> usize {
    max_workers.min(num_chunks).max(1)
}
