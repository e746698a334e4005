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

// Command execution with the crate's error normalization.
//
// - spawn failures with `NotFound` become `Error::UtilityUnavailable`
// - timeouts become `Error::Timeout`
// - non-zero exit statuses become `Error::CommandFailed`

use std::io;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::utils::run_command_with_timeout;

/// Normalized command output.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// UTF-8 (lossy) decoded stdout
    pub stdout: String,
    /// UTF-8 (lossy) decoded stderr
    pub stderr: String,
}

/// Run `command` with `args`, failing unless it exits successfully within `timeout`.
pub fn execute_command(command: &str, args: &[&str], timeout: Duration) -> Result<CommandOutput> {
    let command_line = if args.is_empty() {
        command.to_string()
    } else {
        format!("{command} {}", args.join(" "))
    };

    let output = run_command_with_timeout(command, args, timeout).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::UtilityUnavailable(command.to_string()),
        io::ErrorKind::TimedOut => Error::Timeout {
            command: command_line.clone(),
            timeout,
        },
        _ => Error::Io(e),
    })?;

    let out = CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    };

    if !output.status.success() {
        return Err(Error::CommandFailed {
            command: command_line,
            code: output.status.code(),
            stderr: out.stderr.trim_end().to_string(),
        });
    }

    Ok(out)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_execute_command_success() {
        let out = execute_command("echo", &["hello"], Duration::from_secs(2)).unwrap();
        assert!(out.stdout.contains("hello"));
    }

    #[test]
    fn test_execute_command_non_zero_status() {
        let err = execute_command("false", &[], Duration::from_secs(2)).unwrap_err();
        match err {
            Error::CommandFailed { command, code, .. } => {
                assert_eq!(command, "false");
                assert_eq!(code, Some(1));
            }
            other => panic!("Expected CommandFailed error, got: {other}"),
        }
    }

    #[test]
    fn test_execute_command_missing_binary() {
        let err = execute_command("no-such-sinfo-binary", &["-h"], Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, Error::UtilityUnavailable(ref name) if name == "no-such-sinfo-binary"));
    }

    #[test]
    fn test_execute_command_timeout() {
        let err = execute_command("sleep", &["5"], Duration::from_millis(100)).unwrap_err();
        match err {
            Error::Timeout { command, timeout } => {
                assert_eq!(command, "sleep 5");
                assert_eq!(timeout, Duration::from_millis(100));
            }
            other => panic!("Expected Timeout error, got: {other}"),
        }
    }
}
