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

//! Opt-in dump of pages that fail to decode.

use crate::client::RawPageResponse;
use crate::error::{Error, Result};
use chrono::Utc;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Receives the raw payload of a page before its decode error propagates.
///
/// Called inline on the fetching task, so an implementation blocks that task
/// for as long as it runs. Sinks only see pages that already failed.
pub trait DiagnosticSink: Send + Sync + fmt::Debug {
    fn record_failed_page(&self, page: &RawPageResponse, error: &Error);
}

/// Writes each failing page to its own file in a directory.
#[derive(Debug, Clone)]
pub struct FileDiagnosticSink {
    dir: PathBuf,
}

impl FileDiagnosticSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(page: &RawPageResponse) -> String {
        format!(
            "failed_page_{}_{}_{}.json",
            page.start_row,
            page.page_size,
            Utc::now().format("%Y%m%dT%H%M%S%.6fZ")
        )
    }

    /// Write the page body and return the file path.
    ///
    /// Uses blocking `std::fs` calls on the calling task.
    pub fn write(&self, page: &RawPageResponse) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(Self::file_name(page));
        std::fs::write(&path, page.body.as_bytes())?;
        Ok(path)
    }
}

impl DiagnosticSink for FileDiagnosticSink {
    fn record_failed_page(&self, page: &RawPageResponse, error: &Error) {
        match self.write(page) {
            Ok(path) => warn!(
                "Page at row {} failed to decode ({}); payload saved to {}",
                page.start_row,
                error,
                path.display()
            ),
            Err(e) => warn!(
                "Page at row {} failed to decode ({}); could not save payload to {}: {}",
                page.start_row,
                error,
                self.dir.display(),
                e
            ),
        }
    }
}
