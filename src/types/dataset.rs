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

//! Dataset identity and shape.
//!
//! A retrieval starts from a [`DatasetSource`], learns a [`DatasetStructure`]
//! from the probe request, and is split into [`ChunkSpec`] row ranges.

use std::fmt;

/// Internal row-position column the cluster adds to every logical file row.
pub const ROW_POSITION_COLUMN: &str = "__fileposition__";

/// Field carrying the raw text of a row in delimited-line mode.
pub const LINE_FIELD: &str = "line";

/// A named remote table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    /// A logical file, e.g. `~thor::people`.
    LogicalFile {
        name: String,
        /// Overrides the connection's default cluster.
        cluster: Option<String>,
    },
    /// A named output of a completed workunit.
    WorkunitResult { wuid: String, result_name: String },
}

impl DatasetSource {
    pub fn logical_file(name: impl Into<String>) -> Self {
        DatasetSource::LogicalFile {
            name: name.into(),
            cluster: None,
        }
    }

    pub fn workunit_result(wuid: impl Into<String>, result_name: impl Into<String>) -> Self {
        DatasetSource::WorkunitResult {
            wuid: wuid.into(),
            result_name: result_name.into(),
        }
    }

    /// Set the cluster for a logical file. No effect on workunit results.
    pub fn on_cluster(self, cluster: impl Into<String>) -> Self {
        match self {
            DatasetSource::LogicalFile { name, .. } => DatasetSource::LogicalFile {
                name,
                cluster: Some(cluster.into()),
            },
            other => other,
        }
    }

    /// Query parameters identifying this dataset on a `WUResult` request.
    ///
    /// Values are unescaped; the URL builder percent-encodes them.
    pub fn query_params(&self, default_cluster: &str) -> Vec<(&'static str, String)> {
        match self {
            DatasetSource::LogicalFile { name, cluster } => vec![
                ("LogicalName", name.clone()),
                (
                    "Cluster",
                    cluster.clone().unwrap_or_else(|| default_cluster.to_string()),
                ),
            ],
            DatasetSource::WorkunitResult { wuid, result_name } => vec![
                ("Wuid", wuid.clone()),
                ("ResultName", result_name.clone()),
            ],
        }
    }
}

impl fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetSource::LogicalFile { name, .. } => write!(f, "{}", name),
            DatasetSource::WorkunitResult { wuid, result_name } => {
                write!(f, "{}/{}", wuid, result_name)
            }
        }
    }
}

/// How rows come back from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowShape {
    /// One JSON field per column.
    #[default]
    Structured,
    /// One text line per row, split client-side. The first remote row is a header.
    DelimitedLine { delimiter: char },
}

impl RowShape {
    /// Comma-delimited lines.
    pub fn csv() -> Self {
        RowShape::DelimitedLine { delimiter: ',' }
    }

    pub fn is_delimited(&self) -> bool {
        matches!(self, RowShape::DelimitedLine { .. })
    }

    /// Number of leading remote rows that hold a header rather than data.
    pub fn header_rows(&self) -> u64 {
        match self {
            RowShape::Structured => 0,
            RowShape::DelimitedLine { .. } => 1,
        }
    }
}

/// Column names and size of a dataset, learned once per retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DatasetStructure {
    /// Output column order.
    pub column_names: Vec<String>,
    /// Total remote rows, including any header row.
    pub row_count: u64,
    /// Absolute index of the first data row.
    pub first_data_row: u64,
}

impl DatasetStructure {
    /// Rows that carry data.
    pub fn data_row_count(&self) -> u64 {
        self.row_count.saturating_sub(self.first_data_row)
    }

    pub fn is_empty(&self) -> bool {
        self.data_row_count() == 0
    }
}

/// Half-open row range `[start_row, start_row + length)` fetched by one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkSpec {
    pub start_row: u64,
    pub length: u64,
}

impl ChunkSpec {
    pub fn new(start_row: u64, length: u64) -> Self {
        Self { start_row, length }
    }

    /// Exclusive end row.
    pub fn end_row(&self) -> u64 {
        self.start_row + self.length
    }
}

impl fmt::Display for ChunkSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start_row, self.end_row())
    }
}
