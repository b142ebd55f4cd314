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

//! Logging setup for the HPCC client.
//!
//! Installs a `tracing-subscriber` registry writing to stderr or a file.
//!
//! ## Configuration priority
//!
//! 1. `hpcc.log_level` / `hpcc.log_file` database options (highest)
//! 2. `RUST_LOG` environment variable
//! 3. Default: `warn`
//!
//! ```bash
//! RUST_LOG=hpcc_client=debug ./my_app
//! ```

use std::sync::OnceLock;
use tracing_subscriber::{
    fmt::{self, time::SystemTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const CRATE_TARGET: &str = "hpcc_client";

static LOGGING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Logging options collected by [`Database`](crate::Database).
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// "OFF", "ERROR", "WARN", "INFO", "DEBUG" or "TRACE".
    pub level: Option<String>,
    /// Append logs to this file instead of stderr.
    pub file: Option<String>,
}

impl LogConfig {
    fn is_off(&self) -> bool {
        self.level
            .as_deref()
            .is_some_and(|level| level.eq_ignore_ascii_case("off"))
    }

    /// Filter directive for an explicitly configured level.
    fn directive(&self) -> Option<String> {
        self.level
            .as_deref()
            .map(|level| format!("{}={}", CRATE_TARGET, level.to_lowercase()))
    }
}

/// Install the global subscriber.
///
/// Only the first call in a process has any effect. A subscriber installed by
/// the host application is left alone.
pub fn init_logging(config: &LogConfig) {
    LOGGING_INITIALIZED.get_or_init(|| {
        if config.is_off() {
            return;
        }

        let filter = match config.directive() {
            Some(directive) => EnvFilter::new(directive),
            None => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("{}=warn", CRATE_TARGET))),
        };

        match config.file {
            Some(ref path) => {
                let file = match std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                {
                    Ok(f) => f,
                    Err(e) => {
                        eprintln!("hpcc-client: failed to open log file {}: {}", path, e);
                        return;
                    }
                };

                tracing_subscriber::registry()
                    .with(filter)
                    .with(
                        fmt::layer()
                            .with_writer(file)
                            .with_ansi(false)
                            .with_timer(SystemTime),
                    )
                    .try_init()
                    .ok();
            }
            None => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(
                        fmt::layer()
                            .with_writer(std::io::stderr)
                            .with_timer(SystemTime),
                    )
                    .try_init()
                    .ok();
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert!(config.level.is_none());
        assert!(config.file.is_none());
        assert!(config.directive().is_none());
        assert!(!config.is_off());
    }

    #[test]
    fn test_directive_lowercases_level() {
        let config = LogConfig {
            level: Some("DEBUG".to_string()),
            file: None,
        };
        assert_eq!(config.directive().as_deref(), Some("hpcc_client=debug"));
    }

    #[test]
    fn test_off_is_case_insensitive() {
        let config = LogConfig {
            level: Some("Off".to_string()),
            file: None,
        };
        assert!(config.is_off());
    }
}
