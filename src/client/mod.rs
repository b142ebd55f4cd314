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

//! Client implementations for talking to the cluster.
//!
//! This module provides:
//! - `PageTransport` trait: fetches one page of rows of a dataset
//! - `HpccHttpClient`: low-level HTTP client with retry logic
//! - `WuResultClient`: `PageTransport` over the `WsWorkunits/WUResult` endpoint

pub mod http;
pub mod wu_result;

use crate::error::Result;
use crate::types::dataset::DatasetSource;
use async_trait::async_trait;

pub use http::{HpccHttpClient, HttpClientConfig};
pub use wu_result::{ConnectionParams, Protocol, WuResultClient};

/// Raw body of one page request, not yet decoded.
#[derive(Debug, Clone)]
pub struct RawPageResponse {
    /// First requested row.
    pub start_row: u64,
    /// Requested row count.
    pub page_size: u64,
    /// Response payload as received.
    pub body: String,
}

/// Fetches pages of rows from the cluster.
///
/// Implementations own their retry policy and return an error only once it is
/// exhausted. They are shared read-only by every chunk task of a retrieval and
/// must tolerate concurrent calls.
#[async_trait]
pub trait PageTransport: Send + Sync + std::fmt::Debug {
    /// Fetch `page_size` rows of `source` starting at `start_row`.
    async fn fetch_page(
        &self,
        source: &DatasetSource,
        start_row: u64,
        page_size: u64,
    ) -> Result<RawPageResponse>;
}
