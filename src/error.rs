// Copyright 2025 Lablup Inc. and Jeongkyu Shin
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

//! Error types for the slurm-gpu-exporter library.
//!
//! Only the collection side can fail: running `sinfo`, reading a recorded
//! output file, or resolving configuration. Parsing scheduler output never
//! returns an error; malformed rows are logged and skipped instead.
//!
//! # Example
//!
//! ```rust,no_run
//! use slurm_gpu_exporter::slurm::{GresSource, SinfoCommand};
//! use slurm_gpu_exporter::Result;
//!
//! fn raw_output() -> Result<String> {
//!     SinfoCommand::default().fetch()
//! }
//! ```

use std::time::Duration;

use thiserror::Error;

/// The main error type for slurm-gpu-exporter operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The scheduler command ran but exited with a non-zero status.
    #[error("Command failed: '{command}' (code: {code:?}) stderr: {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The scheduler command did not finish within the configured timeout.
    #[error("Command '{command}' timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    /// The scheduler utility could not be found or started.
    #[error("Utility not available: {0}")]
    UtilityUnavailable(String),

    /// Invalid runtime configuration (e.g. an unparsable listen address).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A report could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An I/O error occurred.
    ///
    /// This wraps standard I/O errors from reading recorded output files
    /// or binding listeners.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for slurm-gpu-exporter operations.
pub type Result<T> = std::result::Result<T, Error>;
