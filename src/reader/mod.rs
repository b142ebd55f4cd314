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

//! Chunked dataset retrieval.
//!
//! This module provides:
//! - `DatasetReader`: probe, plan, fetch in parallel and assemble one dataset
//! - `probe_structure`: column names and row count from one small request
//! - `plan_chunks`: partition of the row range into chunk requests
//! - `parse_rows`: one page of wire rows laid out by column
//! - `fetch_chunks`: the bounded worker pool returning chunks in plan order
//! - `assemble`: typed [`ResultTable`] from ordered chunks

pub mod assembler;
pub mod chunked;
pub mod diagnostics;
pub mod parser;
pub mod planner;
pub mod probe;

use crate::client::PageTransport;
use crate::error::Result;
use crate::reader::chunked::{fetch_chunks, ChunkFetcher};
use crate::reader::probe::ProbeOptions;
use crate::types::dataset::{DatasetSource, DatasetStructure, RowShape};
use crate::types::fetch::{ChunkSize, FetchConfig};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

pub use assembler::{assemble, InferredType, ResultTable};
pub use diagnostics::{DiagnosticSink, FileDiagnosticSink};
pub use parser::{parse_rows, ChunkTable};
pub use planner::{effective_workers, plan_chunks, resolve_chunk_size};
pub use probe::probe_structure;

/// Retrieves whole datasets through a [`PageTransport`].
///
/// Every call probes the dataset afresh and runs its own worker pool; nothing
/// is shared between calls except the transport.
#[derive(Debug, Clone)]
pub struct DatasetReader {
    transport: Arc<dyn PageTransport>,
    config: FetchConfig,
    diagnostics: Option<Arc<dyn DiagnosticSink>>,
}

impl DatasetReader {
    /// Create a reader, validating `config`.
    ///
    /// A configured `diagnostic_dir` installs a [`FileDiagnosticSink`].
    pub fn new(transport: Arc<dyn PageTransport>, config: FetchConfig) -> Result<Self> {
        config.validate()?;
        let diagnostics = config
            .diagnostic_dir
            .as_ref()
            .map(|dir| Arc::new(FileDiagnosticSink::new(dir)) as Arc<dyn DiagnosticSink>);
        Ok(Self {
            transport,
            config,
            diagnostics,
        })
    }

    /// Replace the diagnostic sink for undecodable pages.
    pub fn with_diagnostic_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn probe_options(&self) -> ProbeOptions {
        ProbeOptions {
            probe_rows: self.config.probe_rows,
            keep_row_position: self.config.keep_row_position,
        }
    }

    /// Column names and row count of `source`.
    pub async fn probe_structure(
        &self,
        source: &DatasetSource,
        shape: RowShape,
    ) -> Result<DatasetStructure> {
        probe::probe_structure(
            self.transport.as_ref(),
            source,
            shape,
            self.probe_options(),
            self.diagnostics.as_deref(),
        )
        .await
    }

    /// Fetch all of `source` using the configured chunk size and pool size.
    pub async fn fetch_dataset(&self, source: &DatasetSource, shape: RowShape) -> Result<ResultTable> {
        self.fetch_dataset_with(
            source,
            shape,
            self.config.chunk_size,
            self.config.max_workers,
        )
        .await
    }

    /// Fetch all of `source` with an explicit chunk size and pool size.
    pub async fn fetch_dataset_with(
        &self,
        source: &DatasetSource,
        shape: RowShape,
        chunk_size: ChunkSize,
        max_workers: usize,
    ) -> Result<ResultTable> {
        let start = Instant::now();

        let structure = self.probe_structure(source, shape).await?;
        let chunk_size = resolve_chunk_size(
            chunk_size,
            structure.row_count,
            max_workers,
            self.config.min_chunk_size,
        )?;
        let chunks = plan_chunks(structure.row_count, chunk_size)?;
        debug!(
            "{}: {} columns, {} rows, {} chunks of up to {} rows",
            source,
            structure.column_names.len(),
            structure.row_count,
            chunks.len(),
            chunk_size
        );

        let structure = Arc::new(structure);
        let fetcher = ChunkFetcher::new(
            Arc::clone(&self.transport),
            source.clone(),
            Arc::clone(&structure),
            shape,
        )
        .with_diagnostics(self.diagnostics.clone());

        let tables = fetch_chunks(
            &chunks,
            Arc::new(fetcher),
            max_workers,
            self.config.cancel_on_failure,
        )
        .await?;

        let table = assemble(&structure.column_names, tables)?;

        info!(
            "Fetched {} rows x {} columns from {} in {:.2}s",
            table.num_rows(),
            table.num_columns(),
            source,
            start.elapsed().as_secs_f64()
        );

        Ok(table)
    }

    /// Fetch a logical file on the connection's default cluster.
    pub async fn get_logical_file(&self, name: &str, shape: RowShape) -> Result<ResultTable> {
        self.fetch_dataset(&DatasetSource::logical_file(name), shape)
            .await
    }

    /// Fetch a named result of a workunit.
    pub async fn get_workunit_result(&self, wuid: &str, result_name: &str) -> Result<ResultTable> {
        self.fetch_dataset(
            &DatasetSource::workunit_result(wuid, result_name),
            RowShape::Structured,
        )
        .await
    }
}
