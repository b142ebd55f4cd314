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

//! ChunkFetcher: fetch and parse one chunk.

use crate::client::PageTransport;
use crate::error::{Error, Result};
use crate::reader::diagnostics::DiagnosticSink;
use crate::reader::parser::{decode_page, parse_rows, ChunkTable};
use crate::types::dataset::{ChunkSpec, DatasetSource, DatasetStructure, RowShape};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Everything a worker needs to turn a [`ChunkSpec`] into a [`ChunkTable`].
///
/// Shared read-only by all workers of one retrieval.
#[derive(Debug)]
pub struct ChunkFetcher {
    transport: Arc<dyn PageTransport>,
    source: DatasetSource,
    structure: Arc<DatasetStructure>,
    shape: RowShape,
    diagnostics: Option<Arc<dyn DiagnosticSink>>,
}

impl ChunkFetcher {
    pub fn new(
        transport: Arc<dyn PageTransport>,
        source: DatasetSource,
        structure: Arc<DatasetStructure>,
        shape: RowShape,
    ) -> Self {
        Self {
            transport,
            source,
            structure,
            shape,
            diagnostics: None,
        }
    }

    pub fn with_diagnostics(mut self, sink: Option<Arc<dyn DiagnosticSink>>) -> Self {
        self.diagnostics = sink;
        self
    }

    pub fn structure(&self) -> &DatasetStructure {
        &self.structure
    }

    /// Fetch `spec` and lay its rows out by column.
    ///
    /// Transport retries happen inside the transport; any error returned here
    /// is terminal for the chunk.
    pub async fn fetch(&self, spec: ChunkSpec) -> Result<ChunkTable> {
        let start = Instant::now();

        let page = self
            .transport
            .fetch_page(&self.source, spec.start_row, spec.length)
            .await?;

        let response = match decode_page(&page.body) {
            Ok(response) => response,
            Err(e) => {
                if let (Error::Parse(_), Some(sink)) = (&e, &self.diagnostics) {
                    sink.record_failed_page(&page, &e);
                }
                return Err(e);
            }
        };

        let mut rows = response.rows();
        // Counted before parsing, so lines the parser skips do not trip it
        if (rows.len() as u64) < spec.length {
            return Err(Error::Parse(format!(
                "Chunk {} returned {} of {} rows",
                spec,
                rows.len(),
                spec.length
            )));
        }
        if rows.len() as u64 > spec.length {
            warn!(
                "Chunk {} returned {} rows, keeping the first {}",
                spec,
                rows.len(),
                spec.length
            );
            rows = &rows[..spec.length as usize];
        }

        let table = parse_rows(rows, spec.start_row, &self.structure, self.shape);

        debug!(
            "Fetched chunk {}: {} of {} rows in {:.2}s",
            spec,
            table.num_rows(),
            spec.length,
            start.elapsed().as_secs_f64()
        );

        Ok(table)
    }
}
