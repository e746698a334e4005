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

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::common::config::AppConfig;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run in API mode, exposing GPU allocation metrics in Prometheus format.
    Api(ApiArgs),
    /// Collect once and print the GPU allocation report.
    Report(ReportArgs),
}

/// Options selecting where `sinfo` output comes from.
#[derive(Args, Clone, Debug)]
pub struct SourceArgs {
    /// Path or name of the sinfo binary.
    #[arg(long, default_value = AppConfig::DEFAULT_SINFO_BINARY)]
    pub sinfo: String,
    /// Timeout in seconds for a single sinfo invocation.
    #[arg(short, long, default_value_t = AppConfig::DEFAULT_COMMAND_TIMEOUT_SECS)]
    pub timeout: u64,
    /// Parse recorded sinfo output from this file instead of running sinfo.
    #[arg(long)]
    pub input_file: Option<PathBuf>,
}

#[derive(Parser, Clone, Debug)]
pub struct ApiArgs {
    /// The port to listen on for the API server.
    #[arg(short, long, default_value_t = AppConfig::DEFAULT_PORT)]
    pub port: u16,
    /// The address to bind the API server to.
    #[arg(long, default_value = AppConfig::DEFAULT_LISTEN_ADDRESS)]
    pub listen_address: String,
    #[command(flatten)]
    pub source: SourceArgs,
    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Parser, Clone, Debug)]
pub struct ReportArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_api_defaults() {
        let cli = Cli::parse_from(["slurm-gpu-exporter", "api"]);
        let Commands::Api(args) = cli.command else {
            panic!("expected api subcommand");
        };
        assert_eq!(args.port, 8080);
        assert_eq!(args.listen_address, "0.0.0.0");
        assert_eq!(args.source.sinfo, "sinfo");
        assert_eq!(args.source.timeout, 10);
        assert!(args.source.input_file.is_none());
        assert!(!args.verbose);
    }

    #[test]
    fn test_report_with_input_file() {
        let cli = Cli::parse_from([
            "slurm-gpu-exporter",
            "report",
            "--json",
            "--input-file",
            "sinfo_gpus.txt",
        ]);
        let Commands::Report(args) = cli.command else {
            panic!("expected report subcommand");
        };
        assert!(args.json);
        assert_eq!(args.source.input_file, Some(PathBuf::from("sinfo_gpus.txt")));
    }
}
