//! Command-line interface definitions for covreport.
//!
//! Positional arguments must come before `--restrict`, which consumes every
//! remaining value.

use clap::Parser;
use std::path::PathBuf;

use crate::pipeline::Request;
use crate::report::ReportMode;

/// Prepare a consolidated code coverage report.
///
/// Collates raw profiles into one indexed profile, then generates HTML
/// reports and text summaries for the given instrumented binaries.
#[derive(Parser, Debug)]
#[command(name = "covreport", version, about)]
pub struct Cli {
    /// Directory containing the raw profiles (searched recursively).
    pub profile_data_dir: PathBuf,

    /// Instrumented binaries to report on.
    #[arg(value_name = "BINARY")]
    pub binaries: Vec<PathBuf>,

    /// Keep the merged profile after the reports are generated.
    #[arg(long)]
    pub preserve_profiles: bool,

    /// Emit a single report covering all binaries.
    #[arg(long)]
    pub unified_report: bool,

    /// Restrict reporting to the given source paths (must follow all positional arguments).
    #[arg(long, value_name = "PATH", num_args = 0..)]
    pub restrict: Vec<String>,

    /// Report output directory (default: build/codecoveragereport).
    #[arg(long)]
    pub report_dir: Option<PathBuf>,

    /// Path to `llvm-profdata`.
    #[arg(long)]
    pub llvm_profdata: Option<PathBuf>,

    /// Path to `llvm-cov`.
    #[arg(long)]
    pub llvm_cov: Option<PathBuf>,

    /// Project title shown on the HTML reports.
    #[arg(long)]
    pub title: Option<String>,

    /// Configuration file (default: ./covreport.toml when present).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Suppress progress output; show only errors.
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,

    /// Show tool command lines and timings.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl Cli {
    /// The pipeline request described by these arguments.
    pub fn request(&self) -> Request {
        Request {
            profile_data_dir: self.profile_data_dir.clone(),
            binaries: self.binaries.clone(),
            mode: if self.unified_report {
                ReportMode::Unified
            } else {
                ReportMode::PerBinary
            },
            restrict: self.restrict.clone(),
            preserve_profiles: self.preserve_profiles,
        }
    }
}
