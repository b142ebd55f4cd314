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

//! Database: option collection and connection setup.

use crate::auth::{AuthProvider, BasicAuth, NoAuth};
use crate::client::{ConnectionParams, HpccHttpClient, HttpClientConfig, Protocol, WuResultClient};
use crate::client::wu_result::{DEFAULT_CLUSTER, DEFAULT_PORT};
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::logging::{init_logging, LogConfig};
use crate::reader::DatasetReader;
use crate::types::fetch::{ChunkSize, FetchConfig};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Holds the settings needed to reach a cluster.
///
/// Options are set as string key/value pairs (`hpcc.*`) and turned into a
/// [`Connection`] by [`Database::connect`]. Nothing touches the network
/// until a dataset is requested.
#[derive(Debug)]
pub struct Database {
    // Core configuration
    server: Option<String>,
    port: u16,
    protocol: Protocol,
    cluster: String,
    username: Option<String>,
    password: Option<String>,

    // HTTP client configuration
    http_config: HttpClientConfig,

    // Chunked retrieval configuration
    fetch_config: FetchConfig,

    log_config: LogConfig,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            server: None,
            port: DEFAULT_PORT,
            protocol: Protocol::default(),
            cluster: DEFAULT_CLUSTER.to_string(),
            username: None,
            password: None,
            http_config: HttpClientConfig::default(),
            fetch_config: FetchConfig::default(),
            log_config: LogConfig::default(),
        }
    }
}

impl Database {
    /// Creates a new Database instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a Database from `(key, value)` option pairs.
    pub fn with_options<K, V>(options: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut db = Self::new();
        for (key, value) in options {
            db.set_option(key.as_ref(), value.as_ref())?;
        }
        Ok(db)
    }

    /// Returns the configured server address.
    pub fn server(&self) -> Option<&str> {
        self.server.as_deref()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    pub fn http_config(&self) -> &HttpClientConfig {
        &self.http_config
    }

    pub fn fetch_config(&self) -> &FetchConfig {
        &self.fetch_config
    }

    /// Parse a boolean option value.
    fn parse_bool_option(key: &str, value: &str) -> Result<bool> {
        match value.to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(Self::invalid_option(key, value)),
        }
    }

    /// Parse a numeric option value.
    fn parse_num_option<T: FromStr>(key: &str, value: &str) -> Result<T> {
        value
            .trim()
            .parse()
            .map_err(|_| Self::invalid_option(key, value))
    }

    fn non_empty(key: &str, value: &str) -> Result<String> {
        if value.trim().is_empty() {
            return Err(Self::invalid_option(key, value));
        }
        Ok(value.to_string())
    }

    fn invalid_option(key: &str, value: &str) -> Error {
        Error::Config(format!("Invalid value '{}' for option '{}'", value, key))
    }

    /// Set one `hpcc.*` option.
    pub fn set_option(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            // Core options
            "hpcc.server" => self.server = Some(Self::non_empty(key, value)?),
            "hpcc.port" => self.port = Self::parse_num_option(key, value)?,
            "hpcc.protocol" => {
                self.protocol = value.parse().map_err(|_| Self::invalid_option(key, value))?
            }
            "hpcc.cluster" => self.cluster = Self::non_empty(key, value)?,
            "hpcc.username" => self.username = Some(value.to_string()),
            "hpcc.password" => self.password = Some(value.to_string()),

            // HTTP client options
            "hpcc.http.max_retries" => {
                self.http_config.max_retries = Self::parse_num_option(key, value)?
            }
            "hpcc.http.retry_delay_ms" => {
                self.http_config.retry_delay =
                    Duration::from_millis(Self::parse_num_option(key, value)?)
            }

            // Chunked retrieval options
            "hpcc.fetch.chunk_size" => {
                let chunk_size: ChunkSize =
                    value.parse().map_err(|_| Self::invalid_option(key, value))?;
                if chunk_size == ChunkSize::Fixed(0) {
                    return Err(Self::invalid_option(key, value));
                }
                self.fetch_config.chunk_size = chunk_size;
            }
            "hpcc.fetch.max_workers" => {
                let max_workers: usize = Self::parse_num_option(key, value)?;
                if max_workers == 0 {
                    return Err(Self::invalid_option(key, value));
                }
                self.fetch_config.max_workers = max_workers;
            }
            "hpcc.fetch.min_chunk_size" => {
                self.fetch_config.min_chunk_size = Self::parse_num_option(key, value)?
            }
            "hpcc.fetch.keep_row_position" => {
                self.fetch_config.keep_row_position = Self::parse_bool_option(key, value)?
            }
            "hpcc.fetch.cancel_on_failure" => {
                self.fetch_config.cancel_on_failure = Self::parse_bool_option(key, value)?
            }
            "hpcc.fetch.diagnostic_dir" => {
                self.fetch_config.diagnostic_dir =
                    Some(PathBuf::from(Self::non_empty(key, value)?))
            }

            // Logging options
            "hpcc.log_level" => {
                match value.to_lowercase().as_str() {
                    "off" | "error" | "warn" | "info" | "debug" | "trace" => {}
                    _ => return Err(Self::invalid_option(key, value)),
                }
                self.log_config.level = Some(value.to_string());
            }
            "hpcc.log_file" => self.log_config.file = Some(Self::non_empty(key, value)?),

            _ => return Err(Error::Config(format!("Unknown option '{}'", key))),
        }
        Ok(())
    }

    /// Read back a non-secret option as a string.
    pub fn get_option(&self, key: &str) -> Result<String> {
        match key {
            "hpcc.server" => self
                .server
                .clone()
                .ok_or_else(|| Error::Config("option 'hpcc.server' is not set".to_string())),
            "hpcc.port" => Ok(self.port.to_string()),
            "hpcc.protocol" => Ok(self.protocol.to_string()),
            "hpcc.cluster" => Ok(self.cluster.clone()),
            "hpcc.username" => self
                .username
                .clone()
                .ok_or_else(|| Error::Config("option 'hpcc.username' is not set".to_string())),
            "hpcc.http.max_retries" => Ok(self.http_config.max_retries.to_string()),
            "hpcc.fetch.chunk_size" => Ok(match self.fetch_config.chunk_size {
                ChunkSize::Auto => "auto".to_string(),
                ChunkSize::Fixed(n) => n.to_string(),
            }),
            "hpcc.fetch.max_workers" => Ok(self.fetch_config.max_workers.to_string()),
            "hpcc.fetch.min_chunk_size" => Ok(self.fetch_config.min_chunk_size.to_string()),
            _ => Err(Error::Config(format!("Unknown or unreadable option '{}'", key))),
        }
    }

    fn auth_provider(&self) -> Arc<dyn AuthProvider> {
        match &self.username {
            Some(username) => Arc::new(BasicAuth::new(
                username.clone(),
                self.password.clone().unwrap_or_default(),
            )),
            None => Arc::new(NoAuth),
        }
    }

    /// Build a [`Connection`] from the collected options.
    pub fn connect(&self) -> Result<Connection> {
        // Validate required options
        let server = self
            .server
            .as_ref()
            .ok_or_else(|| Error::Config("hpcc.server not set".to_string()))?;

        init_logging(&self.log_config);

        let params = ConnectionParams {
            protocol: self.protocol,
            server: server.clone(),
            port: self.port,
            cluster: self.cluster.clone(),
        };
        debug!(
            "Creating connection to {}://{}:{} (cluster {})",
            params.protocol, params.server, params.port, params.cluster
        );

        let http_client = Arc::new(HpccHttpClient::new(
            self.http_config.clone(),
            self.auth_provider(),
        )?);
        let transport = Arc::new(WuResultClient::new(http_client, params)?);
        let reader = DatasetReader::new(transport, self.fetch_config.clone())?;

        Connection::new(reader)
    }
}
