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

use clap::Parser;

use slurm_gpu_exporter::api::run_api_mode;
use slurm_gpu_exporter::cli::{Cli, Commands};
use slurm_gpu_exporter::report::run_report_mode;
use slurm_gpu_exporter::utils::init_tracing;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Api(args) => {
            init_tracing(args.verbose);
            run_api_mode(&args).await
        }
        Commands::Report(args) => {
            init_tracing(args.verbose);
            run_report_mode(&args)
        }
    };

    if let Err(e) = result {
        tracing::error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
