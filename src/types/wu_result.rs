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

//! `WsWorkunits/WUResult` response types.
//!
//! These map the JSON returned by the workunit service when paging through a
//! logical file or a workunit output.

use serde::Deserialize;
use serde_json::{Map, Value};

/// One row as returned on the wire, keys in server order.
pub type WireRow = Map<String, Value>;

/// Top-level JSON object.
#[derive(Debug, Clone, Deserialize)]
pub struct WuResultEnvelope {
    #[serde(rename = "WUResultResponse")]
    pub response: WuResultResponse,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WuResultResponse {
    /// Total rows in the dataset.
    #[serde(rename = "Total", default)]
    pub total: Option<i64>,
    #[serde(rename = "Start", default)]
    pub start: Option<i64>,
    /// Rows in this page.
    #[serde(rename = "Count", default)]
    pub count: Option<i64>,
    #[serde(rename = "Result", default)]
    pub result: Option<ResultRows>,
    #[serde(rename = "Exceptions", default)]
    pub exceptions: Option<Exceptions>,
}

impl WuResultResponse {
    /// The page rows, empty when the response has no `Result` block.
    pub fn rows(&self) -> &[WireRow] {
        self.result
            .as_ref()
            .map(|r| r.rows.as_slice())
            .unwrap_or_default()
    }

    /// Joined exception messages, if the service reported any.
    pub fn exception_message(&self) -> Option<String> {
        let exceptions = self.exceptions.as_ref()?;
        if exceptions.exception.is_empty() {
            return None;
        }
        Some(
            exceptions
                .exception
                .iter()
                .map(ServiceException::describe)
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultRows {
    #[serde(rename = "Row", default)]
    pub rows: Vec<WireRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Exceptions {
    #[serde(rename = "Source", default)]
    pub source: Option<String>,
    #[serde(rename = "Exception", default)]
    pub exception: Vec<ServiceException>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceException {
    #[serde(rename = "Code", default)]
    pub code: Option<i64>,
    #[serde(rename = "Message", default)]
    pub message: Option<String>,
}

impl ServiceException {
    pub fn describe(&self) -> String {
        let message = self.message.as_deref().unwrap_or("Unknown error");
        match self.code {
            Some(code) => format!("{} (code {})", message, code),
            None => message.to_string(),
        }
    }
}
