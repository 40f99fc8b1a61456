// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use datasketches_characterization::error::Error;
use datasketches_characterization::job::Report;
use datasketches_characterization::memory::CountingAllocator;
use datasketches_characterization::profile::ProfileOverrides;
use datasketches_characterization::profile::ProfileRegistry;
use tracing::error;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator::system();

const LOG_ENV_VAR: &str = "CHARACTERIZATION_LOG";

/// Runs one characterization profile and prints its report to stdout.
#[derive(Debug, Parser)]
#[command(name = "datasketches-characterization", version)]
struct Cli {
    /// Name of the profile to run.
    profile: Option<String>,

    /// Also write the report tables to this file.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Run 2^N trials in total.
    #[arg(long, value_name = "N")]
    lg_max_trials: Option<u32>,

    /// Stop at input size 2^N.
    #[arg(long, value_name = "N")]
    lg_max_x: Option<u32>,

    /// Only report after the last batch of trials.
    #[arg(long)]
    no_intermediate: bool,
}

impl Cli {
    fn overrides(&self) -> ProfileOverrides {
        ProfileOverrides {
            lg_max_trials: self.lg_max_trials,
            lg_max_x: self.lg_max_x,
            no_intermediate: self.no_intermediate,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let registry = ProfileRegistry::builtin();
    let Some(name) = cli.profile.as_deref() else {
        eprintln!("usage: datasketches-characterization <PROFILE> [OPTIONS]\n");
        eprintln!("profiles:\n{registry}");
        return ExitCode::from(2);
    };

    match run(&registry, name, &cli) {
        Ok(()) => {
            info!(profile = name, "profile complete");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(profile = name, %err, "profile failed");
            eprintln!("{err:?}");
            ExitCode::FAILURE
        }
    }
}

fn run(registry: &ProfileRegistry, name: &str, cli: &Cli) -> Result<(), Error> {
    let profile = registry.get(name)?.apply(&cli.overrides())?;
    let mut report = Report::stdout();
    if let Some(path) = &cli.output {
        report = report.with_file(path)?;
    }
    info!(profile = name, description = %profile.description(), "starting profile");
    profile.run(&mut report)?;
    report.flush()
}

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(LOG_ENV_VAR)
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}
