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

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::common::config::AppConfig;
use crate::error::Result;
use crate::slurm::command::execute_command;

/// `sinfo` arguments producing one `<nodes> <gres> <gres_used>` row per
/// node group, without a header, for idle and allocated nodes.
pub const SINFO_GRES_ARGS: [&str; 4] = [
    "-a",
    "-h",
    "--Format=Nodes: ,Gres: ,GresUsed: ",
    "--state=idle,allocated",
];

/// Provider of raw node-group GRES output.
///
/// Every call produces fresh output; implementations do not cache.
pub trait GresSource: Send + Sync {
    /// Fetch the current raw output.
    fn fetch(&self) -> Result<String>;

    /// Short human readable description used in logs.
    fn describe(&self) -> String;
}

/// Queries the live scheduler by running `sinfo`.
#[derive(Debug, Clone)]
pub struct SinfoCommand {
    program: String,
    timeout: Duration,
}

impl SinfoCommand {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for SinfoCommand {
    fn default() -> Self {
        Self::new(
            AppConfig::DEFAULT_SINFO_BINARY,
            Duration::from_secs(AppConfig::DEFAULT_COMMAND_TIMEOUT_SECS),
        )
    }
}

impl GresSource for SinfoCommand {
    fn fetch(&self) -> Result<String> {
        let output = execute_command(&self.program, &SINFO_GRES_ARGS, self.timeout)?;
        Ok(output.stdout)
    }

    fn describe(&self) -> String {
        format!("{} {}", self.program, SINFO_GRES_ARGS.join(" "))
    }
}

/// Reads previously recorded `sinfo` output from a file on every fetch.
#[derive(Debug, Clone)]
pub struct RecordedOutput {
    path: PathBuf,
}

impl RecordedOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GresSource for RecordedOutput {
    fn fetch(&self) -> Result<String> {
        Ok(std::fs::read_to_string(&self.path)?)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Tests whether `program` can be run (i.e. is in the PATH and answers `--version`).
pub fn utility_available(program: &str) -> bool {
    let timeout = Duration::from_secs(AppConfig::UTILITY_PROBE_TIMEOUT_SECS);
    match execute_command(program, &["--version"], timeout) {
        Ok(output) => {
            tracing::debug!("{program} is available: {}", output.stdout.trim());
            true
        }
        Err(e) => {
            tracing::debug!("{program} is not available: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::io::Write;

    #[test]
    fn test_sinfo_command_describe() {
        let cmd = SinfoCommand::new("/opt/slurm/bin/sinfo", Duration::from_secs(3));
        assert_eq!(
            cmd.describe(),
            "/opt/slurm/bin/sinfo -a -h --Format=Nodes: ,Gres: ,GresUsed:  --state=idle,allocated"
        );
    }

    #[test]
    fn test_sinfo_command_missing_binary() {
        let cmd = SinfoCommand::new("no-such-sinfo-binary", Duration::from_secs(1));
        assert!(matches!(cmd.fetch(), Err(Error::UtilityUnavailable(_))));
    }

    #[test]
    fn test_recorded_output_fetch() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "2 gpu:T4:4(S:0) gpu:T4:1(IDX:0)").unwrap();

        let source = RecordedOutput::new(file.path());
        assert_eq!(source.fetch().unwrap(), "2 gpu:T4:4(S:0) gpu:T4:1(IDX:0)\n");
        assert!(source.describe().starts_with("file "));
    }

    #[test]
    fn test_recorded_output_missing_file() {
        let source = RecordedOutput::new("/nonexistent/sinfo_gpus.txt");
        assert!(matches!(source.fetch(), Err(Error::Io(_))));
    }

    #[test]
    fn test_utility_available() {
        assert!(!utility_available("no-such-sinfo-binary"));
    }
}
