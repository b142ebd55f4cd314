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

//! Authentication providers for the cluster's ESP services.
//!
//! ESP endpoints use HTTP basic authentication; clusters without security
//! enabled accept anonymous requests.

use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::fmt;

/// Supplies the `Authorization` header value for outgoing requests.
pub trait AuthProvider: Send + Sync + fmt::Debug {
    /// Header value, or `None` when requests go out unauthenticated.
    fn get_auth_header(&self) -> Result<Option<String>>;
}

/// HTTP basic authentication with a username and password.
#[derive(Clone)]
pub struct BasicAuth {
    username: String,
    password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

// Keep the password out of logs.
impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AuthProvider for BasicAuth {
    fn get_auth_header(&self) -> Result<Option<String>> {
        if self.username.contains(':') {
            return Err(Error::Config(
                "Basic auth username must not contain ':'".to_string(),
            ));
        }
        let encoded = STANDARD.encode(format!("{}:{}", self.username, self.password));
        Ok(Some(format!("Basic {}", encoded)))
    }
}

/// Anonymous access.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl AuthProvider for NoAuth {
    fn get_auth_header(&self) -> Result<Option<String>> {
        Ok(None)
    }
}
