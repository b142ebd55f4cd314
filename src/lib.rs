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

//! HPCC Client for Rust
//!
//! This crate reads datasets held on an HPCC cluster (logical files and
//! workunit results) through the ESP `WsWorkunits/WUResult` service.
//!
//! ## Overview
//!
//! - [`Database`] - Collects connection and retrieval options
//! - [`Connection`] - Blocking access to datasets
//! - [`DatasetReader`] - The same operations as `async fn`s
//!
//! A retrieval probes the dataset for its columns and row count, splits the
//! rows into chunks, fetches the chunks with a bounded pool of concurrent
//! workers and assembles them, in row order, into a typed [`ResultTable`]
//! backed by an Arrow `RecordBatch`.
//!
//! ## Example
//!
//! ```no_run
//! use hpcc_client::{Database, RowShape};
//!
//! # fn main() -> hpcc_client::Result<()> {
//! let database = Database::with_options([
//!     ("hpcc.server", "play.hpccsystems.com"),
//!     ("hpcc.fetch.max_workers", "8"),
//! ])?;
//! let connection = database.connect()?;
//!
//! let table = connection.get_logical_file("~tutorial::people", RowShape::Structured)?;
//! println!("{} rows: {:?}", table.num_rows(), table.column_names());
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration Options
//!
//! ### Database Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `hpcc.server` | | ESP host name or address (required) |
//! | `hpcc.port` | 8010 | ESP port |
//! | `hpcc.protocol` | http | `http` or `https` |
//! | `hpcc.username` | | Basic auth user; anonymous when unset |
//! | `hpcc.password` | | Basic auth password |
//! | `hpcc.cluster` | thor | Cluster for logical files |
//! | `hpcc.http.max_retries` | 3 | Retries per page request |
//! | `hpcc.http.retry_delay_ms` | 1000 | Fixed delay between retries |
//! | `hpcc.log_level` | | `off`, `error`, `warn`, `info`, `debug` or `trace` |
//! | `hpcc.log_file` | | Append logs here instead of stderr |
//!
//! ### Retrieval Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `hpcc.fetch.chunk_size` | auto | Rows per request, or `auto` |
//! | `hpcc.fetch.max_workers` | 15 | Concurrent chunk requests |
//! | `hpcc.fetch.min_chunk_size` | 10000 | Smallest `auto` chunk |
//! | `hpcc.fetch.keep_row_position` | false | Keep the `__fileposition__` column |
//! | `hpcc.fetch.cancel_on_failure` | false | Skip unstarted chunks after a failure |
//! | `hpcc.fetch.diagnostic_dir` | | Save undecodable pages here |

pub mod auth;
pub mod client;
pub mod connection;
pub mod database;
pub mod error;
pub mod logging;
pub mod reader;
pub mod types;

// Re-export main types
pub use connection::Connection;
pub use database::Database;
pub use error::{Error, Result};
pub use reader::{DatasetReader, ResultTable};

// Re-export client types for advanced users
pub use client::{HpccHttpClient, HttpClientConfig, PageTransport, WuResultClient};

// Re-export dataset and configuration types
pub use types::dataset::{ChunkSpec, DatasetSource, DatasetStructure, RowShape};
pub use types::fetch::{ChunkSize, FetchConfig};
