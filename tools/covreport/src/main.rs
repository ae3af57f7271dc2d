//! Consolidated code coverage reports from raw LLVM profiles.
//!
//! Usage:
//!   covreport <PROFILE_DIR> [BINARY]...                 - One report per binary
//!   covreport <PROFILE_DIR> [BINARY]... --unified-report - One report for all binaries
//!   covreport <PROFILE_DIR> [BINARY]... --restrict src/  - Only report on matching sources
//!
//! Raw profiles are merged with `llvm-profdata`, then rendered with
//! `llvm-cov` into `build/codecoveragereport` (see `covreport.toml`).

mod cli;
mod config;
mod error;
mod merge;
mod output;
mod pipeline;
mod report;
#[cfg(all(test, unix))]
mod test_support;
mod tool;
mod verbose;

use anyhow::Result;
use clap::Parser;

use crate::config::Config;
use crate::verbose::dprintln;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    verbose::init(cli.quiet, cli.verbose);

    let config = Config::load(&cli)?;
    let request = cli.request();
    let outcome = pipeline::run(&config, &request)?;

    dprintln!(":: Generated {} coverage report(s)", outcome.jobs.len());
    if request.preserve_profiles {
        dprintln!(":: Merged profile kept at {}", outcome.profile.path.display());
    }
    Ok(())
}
