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

//! Structure probe.
//!
//! One small page request learns the column names and total row count of a
//! dataset before bulk retrieval.

use crate::client::PageTransport;
use crate::error::{Error, Result};
use crate::reader::diagnostics::DiagnosticSink;
use crate::reader::parser::{decode_page, header_columns};
use crate::types::dataset::{
    DatasetSource, DatasetStructure, RowShape, LINE_FIELD, ROW_POSITION_COLUMN,
};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

/// Probe settings taken from [`FetchConfig`](crate::types::fetch::FetchConfig).
#[derive(Debug, Clone, Copy)]
pub struct ProbeOptions {
    pub probe_rows: u64,
    pub keep_row_position: bool,
}

/// Determine the shape of `source`.
///
/// An empty dataset yields zero columns and zero rows. A dataset that
/// reports rows but returns none is a [`Error::Structure`].
pub async fn probe_structure(
    transport: &dyn PageTransport,
    source: &DatasetSource,
    shape: RowShape,
    options: ProbeOptions,
    diagnostics: Option<&dyn DiagnosticSink>,
) -> Result<DatasetStructure> {
    let page = transport.fetch_page(source, 0, options.probe_rows).await?;
    let response = match decode_page(&page.body) {
        Ok(response) => response,
        Err(e) => {
            if let (Error::Parse(_), Some(sink)) = (&e, diagnostics) {
                sink.record_failed_page(&page, &e);
            }
            return Err(e);
        }
    };

    let total = response.total.ok_or_else(|| {
        Error::Structure(format!("Response for {} carries no row total", source))
    })?;
    let row_count = u64::try_from(total).map_err(|_| {
        Error::Structure(format!("Negative row total {} for {}", total, source))
    })?;

    let Some(first_row) = response.rows().first() else {
        if row_count == 0 {
            debug!("{} is empty", source);
            return Ok(DatasetStructure::default());
        }
        return Err(Error::Structure(format!(
            "{} reports {} rows but the probe returned none",
            source, row_count
        )));
    };

    let (mut column_names, first_data_row) = match shape {
        RowShape::Structured => (first_row.keys().cloned().collect::<Vec<_>>(), 0),
        RowShape::DelimitedLine { delimiter } => {
            let header = match first_row.get(LINE_FIELD) {
                Some(Value::String(line)) if !line.trim().is_empty() => line,
                _ => {
                    return Err(Error::Structure(format!(
                        "First row of {} has no header line",
                        source
                    )))
                }
            };
            (header_columns(header, delimiter), shape.header_rows())
        }
    };

    if !options.keep_row_position {
        column_names.retain(|name| name != ROW_POSITION_COLUMN);
    }

    if column_names.is_empty() {
        return Err(Error::Structure(format!(
            "{} reports {} rows but has no columns",
            source, row_count
        )));
    }

    let mut seen = HashSet::new();
    if let Some(duplicate) = column_names.iter().find(|name| !seen.insert(name.as_str())) {
        return Err(Error::Structure(format!(
            "Duplicate column '{}' in {}",
            duplicate, source
        )));
    }

    debug!(
        "Probed {}: {} columns, {} rows (first data row {})",
        source,
        column_names.len(),
        row_count,
        first_data_row
    );

    Ok(DatasetStructure {
        column_names,
        row_count,
        first_data_row,
    })
}
