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

//! Blocking connection to a cluster.

use crate::error::{Error, Result};
use crate::reader::{DatasetReader, ResultTable};
use crate::types::dataset::{DatasetSource, DatasetStructure, RowShape};
use crate::types::fetch::ChunkSize;
use tracing::debug;

/// Blocking front end over a [`DatasetReader`].
///
/// A Connection is created by [`Database::connect`](crate::Database::connect)
/// and owns the tokio runtime that drives the reader's fetch pool. Its
/// methods must not be called from inside an async context; use
/// [`Connection::reader`] there instead.
#[derive(Debug)]
pub struct Connection {
    reader: DatasetReader,

    // Tokio runtime for async operations
    runtime: tokio::runtime::Runtime,
}

impl Connection {
    /// Wrap `reader` with a fresh multi-threaded runtime.
    pub fn new(reader: DatasetReader) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("hpcc-client")
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create async runtime: {}", e)))?;
        debug!("Created connection runtime");

        Ok(Self { reader, runtime })
    }

    /// The async reader behind this connection.
    pub fn reader(&self) -> &DatasetReader {
        &self.reader
    }

    pub fn probe_structure(
        &self,
        source: &DatasetSource,
        shape: RowShape,
    ) -> Result<DatasetStructure> {
        self.runtime
            .block_on(self.reader.probe_structure(source, shape))
    }

    /// Fetch all of `source` with the configured chunk size and pool size.
    pub fn fetch_dataset(&self, source: &DatasetSource, shape: RowShape) -> Result<ResultTable> {
        self.runtime.block_on(self.reader.fetch_dataset(source, shape))
    }

    /// Fetch all of `source` with an explicit chunk size and pool size.
    pub fn fetch_dataset_with(
        &self,
        source: &DatasetSource,
        shape: RowShape,
        chunk_size: ChunkSize,
        max_workers: usize,
    ) -> Result<ResultTable> {
        self.runtime.block_on(
            self.reader
                .fetch_dataset_with(source, shape, chunk_size, max_workers),
        )
    }

    pub fn get_logical_file(&self, name: &str, shape: RowShape) -> Result<ResultTable> {
        self.runtime
            .block_on(self.reader.get_logical_file(name, shape))
    }

    pub fn get_workunit_result(&self, wuid: &str, result_name: &str) -> Result<ResultTable> {
        self.runtime
            .block_on(self.reader.get_workunit_result(wuid, result_name))
    }
}
