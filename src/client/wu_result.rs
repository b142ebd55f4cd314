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

//! `PageTransport` over the workunit service's `WUResult` endpoint.

use crate::client::{HpccHttpClient, PageTransport, RawPageResponse};
use crate::error::{Error, Result};
use crate::types::dataset::DatasetSource;
use async_trait::async_trait;
use reqwest::Url;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::trace;

const WU_RESULT_PATH: &str = "/WsWorkunits/WUResult.json";

/// Default ESP port.
pub const DEFAULT_PORT: u16 = 8010;

/// Default target cluster for logical file reads.
pub const DEFAULT_CLUSTER: &str = "thor";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Http => f.write_str("http"),
            Protocol::Https => f.write_str("https"),
        }
    }
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            _ => Err(Error::Config(format!("Unsupported protocol '{}'", s))),
        }
    }
}

/// Where the ESP server lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub protocol: Protocol,
    pub server: String,
    pub port: u16,
    /// Cluster used for logical files that do not name one.
    pub cluster: String,
}

impl ConnectionParams {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            protocol: Protocol::default(),
            server: server.into(),
            port: DEFAULT_PORT,
            cluster: DEFAULT_CLUSTER.to_string(),
        }
    }

    /// Base URL of the ESP server, e.g. `http://localhost:8010`.
    pub fn base_url(&self) -> Result<Url> {
        let server = self.server.trim_end_matches('/');
        let server = server
            .strip_prefix("http://")
            .or_else(|| server.strip_prefix("https://"))
            .unwrap_or(server);
        Url::parse(&format!("{}://{}:{}", self.protocol, server, self.port))
            .map_err(|e| Error::Config(format!("Invalid server address '{}': {}", self.server, e)))
    }
}

/// Pages through datasets with `WUResult` requests.
#[derive(Debug)]
pub struct WuResultClient {
    http_client: Arc<HpccHttpClient>,
    params: ConnectionParams,
    base_url: Url,
}

impl WuResultClient {
    pub fn new(http_client: Arc<HpccHttpClient>, params: ConnectionParams) -> Result<Self> {
        let base_url = params.base_url()?;
        Ok(Self {
            http_client,
            params,
            base_url,
        })
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    /// Build the page URL. Parameter values are percent-encoded here, which
    /// covers the `~` and `::` of scoped logical file names.
    pub fn page_url(&self, source: &DatasetSource, start_row: u64, page_size: u64) -> Result<Url> {
        let mut url = self
            .base_url
            .join(WU_RESULT_PATH)
            .map_err(|e| Error::Config(format!("Invalid WUResult URL: {}", e)))?;

        {
            let mut query = url.query_pairs_mut();
            for (key, value) in source.query_params(&self.params.cluster) {
                query.append_pair(key, &value);
            }
            query.append_pair("Start", &start_row.to_string());
            query.append_pair("Count", &page_size.to_string());
        }

        Ok(url)
    }
}

#[async_trait]
impl PageTransport for WuResultClient {
    async fn fetch_page(
        &self,
        source: &DatasetSource,
        start_row: u64,
        page_size: u64,
    ) -> Result<RawPageResponse> {
        let url = self.page_url(source, start_row, page_size)?;
        let body = self.http_client.get_text(&url).await?;

        trace!(
            "Fetched page of {} at row {} ({} bytes)",
            source,
            start_row,
            body.len()
        );

        Ok(RawPageResponse {
            start_row,
            page_size,
            body,
        })
    }
}
