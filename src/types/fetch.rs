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

//! Configuration for chunked dataset retrieval.

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::str::FromStr;

/// Default number of concurrent chunk fetches.
pub const DEFAULT_MAX_WORKERS: usize = 15;

/// Smallest chunk `ChunkSize::Auto` will produce.
pub const DEFAULT_MIN_CHUNK_SIZE: u64 = 10_000;

/// Rows requested by the structure probe.
pub const DEFAULT_PROBE_ROWS: u64 = 2;

/// Rows per chunk request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkSize {
    /// Spread the dataset over the worker pool, respecting `min_chunk_size`.
    #[default]
    Auto,
    Fixed(u64),
}

impl FromStr for ChunkSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(ChunkSize::Auto);
        }
        s.trim()
            .parse::<u64>()
            .map(ChunkSize::Fixed)
            .map_err(|_| Error::Config(format!("Invalid chunk size '{}'", s)))
    }
}

/// Configuration for [`DatasetReader`](crate::reader::DatasetReader).
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub chunk_size: ChunkSize,
    /// Upper bound on concurrently running chunk fetches.
    pub max_workers: usize,
    /// Floor for automatically sized chunks.
    pub min_chunk_size: u64,
    /// Rows requested when probing the dataset structure.
    pub probe_rows: u64,
    /// Keep the `__fileposition__` column instead of dropping it.
    pub keep_row_position: bool,
    /// Skip chunks that have not started once any chunk fails.
    pub cancel_on_failure: bool,
    /// Write undecodable pages here before failing.
    pub diagnostic_dir: Option<PathBuf>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            chunk_size: ChunkSize::Auto,
            max_workers: DEFAULT_MAX_WORKERS,
            min_chunk_size: DEFAULT_MIN_CHUNK_SIZE,
            probe_rows: DEFAULT_PROBE_ROWS,
            keep_row_position: false,
            cancel_on_failure: false,
            diagnostic_dir: None,
        }
    }
}

impl FetchConfig {
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = ChunkSize::Fixed(chunk_size);
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(Error::Config("max_workers must be at least 1".to_string()));
        }
        if self.probe_rows == 0 {
            return Err(Error::Config("probe_rows must be at least 1".to_string()));
        }
        if self.chunk_size == ChunkSize::Fixed(0) {
            return Err(Error::Config("chunk_size must be positive".to_string()));
        }
        Ok(())
    }
}
