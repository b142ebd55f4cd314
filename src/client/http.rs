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

//! HTTP client for the cluster's ESP services.
//!
//! This module provides a low-level HTTP client with:
//! - Connection pooling
//! - Automatic retry with a fixed delay between attempts
//! - Basic authentication
//! - Configurable timeouts
//!
//! The underlying `reqwest::Client` is internally reference counted and safe to
//! share across tasks, so one instance serves every chunk fetch of a retrieval.

use crate::auth::AuthProvider;
use crate::error::{Error, Result};
use reqwest::{Client, Response, StatusCode, Url};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Connection timeout duration.
    pub connect_timeout: Duration,
    /// Read timeout duration.
    pub read_timeout: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Fixed delay between attempts.
    pub retry_delay: Duration,
    /// Maximum number of idle connections per host.
    pub max_connections_per_host: usize,
    /// User agent string.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(60),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            max_connections_per_host: 32,
            user_agent: format!("hpcc-client-rs/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// HTTP client for ESP endpoints.
#[derive(Debug)]
pub struct HpccHttpClient {
    client: Client,
    config: HttpClientConfig,
    auth_provider: Arc<dyn AuthProvider>,
}

impl HpccHttpClient {
    /// Creates a new HTTP client with the given configuration and auth provider.
    pub fn new(config: HttpClientConfig, auth_provider: Arc<dyn AuthProvider>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .pool_max_idle_per_host(config.max_connections_per_host)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            auth_provider,
        })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// GET `url` and return the response body as text.
    ///
    /// Retries are performed for:
    /// - Network errors (connect, timeout, request)
    /// - 429, 502, 503 and 504 responses
    /// - Failures while reading the body
    ///
    /// Other HTTP errors are returned immediately.
    pub async fn get_text(&self, url: &Url) -> Result<String> {
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;

            match self.get_once(url, attempts).await {
                Ok(body) => return Ok(body),
                Err(AttemptError::Fatal(e)) => return Err(e),
                Err(AttemptError::Retryable(reason)) => {
                    if attempts > self.config.max_retries {
                        return Err(Error::Transport(format!(
                            "HTTP request failed after {} attempts: {}",
                            attempts, reason
                        )));
                    }
                    warn!(
                        "Request to {} failed (attempt {}/{}): {}, retrying...",
                        url.path(),
                        attempts,
                        self.config.max_retries + 1,
                        reason
                    );
                    self.wait_for_retry().await;
                }
            }
        }
    }

    async fn get_once(&self, url: &Url, attempt: u32) -> std::result::Result<String, AttemptError> {
        let mut req_builder = self.client.get(url.clone());
        if let Some(auth_header) = self
            .auth_provider
            .get_auth_header()
            .map_err(AttemptError::Fatal)?
        {
            req_builder = req_builder.header("Authorization", auth_header);
        }

        debug!(
            "GET {} (attempt {}/{})",
            url,
            attempt,
            self.config.max_retries + 1
        );

        let response: Response = match req_builder.send().await {
            Ok(response) => response,
            Err(e) if Self::is_retryable_error(&e) => {
                return Err(AttemptError::Retryable(e.to_string()))
            }
            Err(e) => {
                return Err(AttemptError::Fatal(Error::Transport(format!(
                    "HTTP request failed: {}",
                    e
                ))))
            }
        };

        let status = response.status();
        if !status.is_success() {
            if Self::is_retryable_status(status) {
                return Err(AttemptError::Retryable(format!("HTTP {}", status.as_u16())));
            }
            let error_body = response.text().await.unwrap_or_default();
            return Err(AttemptError::Fatal(Error::Transport(format!(
                "HTTP {} - {}",
                status.as_u16(),
                error_body
            ))));
        }

        response
            .text()
            .await
            .map_err(|e| AttemptError::Retryable(format!("Failed to read response body: {}", e)))
    }

    /// Check if the HTTP status code indicates a retryable error.
    fn is_retryable_status(status: StatusCode) -> bool {
        matches!(
            status,
            StatusCode::TOO_MANY_REQUESTS
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT
                | StatusCode::BAD_GATEWAY
        )
    }

    /// Check if the request error is retryable.
    fn is_retryable_error(error: &reqwest::Error) -> bool {
        error.is_timeout() || error.is_connect() || error.is_request()
    }

    async fn wait_for_retry(&self) {
        debug!("Waiting {:?} before retry", self.config.retry_delay);
        sleep(self.config.retry_delay).await;
    }
}

enum AttemptError {
    Retryable(String),
    Fatal(Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{BasicAuth, NoAuth};

    #[test]
    fn test_http_client_config_default() {
        let config = HttpClientConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.read_timeout, Duration::from_secs(60));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay, Duration::from_secs(1));
        assert!(config.user_agent.starts_with("hpcc-client-rs/"));
    }

    #[test]
    fn test_is_retryable_status() {
        assert!(HpccHttpClient::is_retryable_status(
            StatusCode::TOO_MANY_REQUESTS
        ));
        assert!(HpccHttpClient::is_retryable_status(
            StatusCode::SERVICE_UNAVAILABLE
        ));
        assert!(HpccHttpClient::is_retryable_status(
            StatusCode::GATEWAY_TIMEOUT
        ));
        assert!(HpccHttpClient::is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(!HpccHttpClient::is_retryable_status(StatusCode::OK));
        assert!(!HpccHttpClient::is_retryable_status(
            StatusCode::BAD_REQUEST
        ));
        assert!(!HpccHttpClient::is_retryable_status(
            StatusCode::UNAUTHORIZED
        ));
    }

    #[tokio::test]
    async fn test_http_client_creation() {
        let auth = Arc::new(BasicAuth::new("user", "pw"));
        assert!(HpccHttpClient::new(HttpClientConfig::default(), auth).is_ok());
        assert!(HpccHttpClient::new(HttpClientConfig::default(), Arc::new(NoAuth)).is_ok());
    }
}
