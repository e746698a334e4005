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

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::{ApiArgs, SourceArgs};
use crate::error::{Error, Result};
use crate::slurm::{GresSource, RecordedOutput, SinfoCommand};

/// Application configuration constants
pub struct AppConfig;

impl AppConfig {
    // HTTP server
    pub const DEFAULT_PORT: u16 = 8080;
    pub const DEFAULT_LISTEN_ADDRESS: &'static str = "0.0.0.0";
    pub const PROMETHEUS_CONTENT_TYPE: &'static str = "text/plain; version=0.0.4; charset=utf-8";

    // Scheduler command
    pub const DEFAULT_SINFO_BINARY: &'static str = "sinfo";
    pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 10;
    pub const UTILITY_PROBE_TIMEOUT_SECS: u64 = 5;
}

/// Where raw `sinfo` output comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub sinfo: String,
    pub timeout: Duration,
    /// Recorded output to parse instead of running `sinfo`
    pub input_file: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            sinfo: AppConfig::DEFAULT_SINFO_BINARY.to_string(),
            timeout: Duration::from_secs(AppConfig::DEFAULT_COMMAND_TIMEOUT_SECS),
            input_file: None,
        }
    }
}

impl SourceConfig {
    pub fn from_args(args: &SourceArgs) -> Result<Self> {
        if args.timeout == 0 {
            return Err(Error::Config(
                "--timeout must be at least 1 second".to_string(),
            ));
        }
        if args.sinfo.trim().is_empty() {
            return Err(Error::Config("--sinfo must not be empty".to_string()));
        }

        Ok(Self {
            sinfo: args.sinfo.clone(),
            timeout: Duration::from_secs(args.timeout),
            input_file: args.input_file.clone(),
        })
    }

    /// Whether the live scheduler is queried (as opposed to a recorded file).
    pub fn uses_scheduler(&self) -> bool {
        self.input_file.is_none()
    }

    pub fn build_source(&self) -> Arc<dyn GresSource> {
        match &self.input_file {
            Some(path) => Arc::new(RecordedOutput::new(path.clone())),
            None => Arc::new(SinfoCommand::new(self.sinfo.clone(), self.timeout)),
        }
    }
}

/// Resolved settings for API mode.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub source: SourceConfig,
}

impl ServerConfig {
    pub fn from_args(args: &ApiArgs) -> Result<Self> {
        let ip: IpAddr = args.listen_address.parse().map_err(|e| {
            Error::Config(format!(
                "invalid listen address '{}': {e}",
                args.listen_address
            ))
        })?;

        Ok(Self {
            addr: SocketAddr::new(ip, args.port),
            source: SourceConfig::from_args(&args.source)?,
        })
    }
}
