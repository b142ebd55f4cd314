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

//! Error types for the HPCC client.
//!
//! Every fallible operation in the crate returns [`Result`]. The variants
//! follow the failure classes of a retrieval:
//!
//! | Variant | Raised by | Retried |
//! |---------|-----------|---------|
//! | [`Error::Config`] | planner, options, worker-pool sizing | never |
//! | [`Error::Transport`] | HTTP client, after its retry budget | by the client only |
//! | [`Error::Service`] | an `Exceptions` block in a response | never |
//! | [`Error::Parse`] | page decoding | never |
//! | [`Error::Structure`] | structure probe | never |
//! | [`Error::Chunk`] | orchestrator, wraps the first failed chunk | never |

use thiserror::Error;

/// Errors produced by the HPCC client.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration or planner input.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network or HTTP failure after the transport's retry budget is spent.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote service answered with an exception block.
    #[error("Service error: {0}")]
    Service(String),

    /// A page payload could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The dataset shape could not be determined.
    #[error("Structure error: {0}")]
    Structure(String),

    /// A chunk task failed; the whole retrieval is abandoned.
    #[error("Chunk [{start_row}, {}) failed: {source}", .start_row + .length)]
    Chunk {
        start_row: u64,
        length: u64,
        #[source]
        source: Box<Error>,
    },

    /// The task was skipped because a sibling chunk had already failed.
    #[error("Chunk fetch cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap `self` as the failure of the chunk covering `[start_row, start_row + length)`.
    pub fn in_chunk(self, start_row: u64, length: u64) -> Self {
        Error::Chunk {
            start_row,
            length,
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through any [`Error::Chunk`] wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::Chunk { source, .. } => source.root(),
            other => other,
        }
    }

    /// Row range of the failed chunk, if this error names one.
    pub fn chunk_range(&self) -> Option<(u64, u64)> {
        match self {
            Error::Chunk {
                start_row, length, ..
            } => Some((*start_row, *length)),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self.root(), Error::Transport(_))
    }

    pub fn is_parse(&self) -> bool {
        matches!(self.root(), Error::Parse(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.root(), Error::Cancelled)
    }
}
