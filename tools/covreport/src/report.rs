//! HTML report and text summary generation via `llvm-cov`.
//!
//! Each [`ReportJob`] runs `llvm-cov show` for the browsable report, then
//! `llvm-cov report` with stdout captured to `summary.txt`. The first binary
//! of a job is the primary object; the rest are passed with `-object`.

use anyhow::{Context, Result, bail};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{CoverageError, ToolFailure};
use crate::tool::ToolCommand;
use crate::verbose::{Timer, dprintln};

/// File receiving the `llvm-cov report` output in each report directory.
pub const SUMMARY_FILE_NAME: &str = "summary.txt";

/// Landing page written by `llvm-cov show -format html`.
pub const INDEX_FILE_NAME: &str = "index.html";

/// How binaries are grouped into reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportMode {
    /// One subdirectory per binary, named after its file name.
    #[default]
    PerBinary,
    /// A single report spanning every binary.
    Unified,
}

/// One report to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportJob {
    /// Directory receiving `index.html` and `summary.txt`.
    pub dir: PathBuf,
    /// Binaries covered, primary first.
    pub binaries: Vec<PathBuf>,
}

impl ReportJob {
    /// Path of the HTML landing page.
    pub fn index_page(&self) -> PathBuf {
        self.dir.join(INDEX_FILE_NAME)
    }

    /// Path of the text summary.
    pub fn summary_path(&self) -> PathBuf {
        self.dir.join(SUMMARY_FILE_NAME)
    }
}

/// Arrange `binaries` into report jobs under `report_dir`.
pub fn plan_reports(
    report_dir: &Path,
    binaries: &[PathBuf],
    mode: ReportMode,
) -> Result<Vec<ReportJob>> {
    match mode {
        ReportMode::Unified => Ok(vec![ReportJob {
            dir: report_dir.to_path_buf(),
            binaries: binaries.to_vec(),
        }]),
        ReportMode::PerBinary => binaries
            .iter()
            .map(|binary| {
                let Some(name) = binary.file_name() else {
                    bail!("binary path {} has no file name", binary.display());
                };
                Ok(ReportJob {
                    dir: report_dir.join(name),
                    binaries: vec![binary.clone()],
                })
            })
            .collect(),
    }
}

/// `llvm-cov` object arguments: the first binary bare, the rest as `-object`.
pub fn object_args(binaries: &[PathBuf]) -> Vec<OsString> {
    let mut args = Vec::with_capacity(binaries.len() * 2);
    for (i, binary) in binaries.iter().enumerate() {
        if i > 0 {
            args.push(OsString::from("-object"));
        }
        args.push(binary.clone().into_os_string());
    }
    args
}

/// Build the `llvm-cov show` invocation for the HTML report.
pub fn show_command(
    config: &Config,
    job: &ReportJob,
    profdata: &Path,
    restrict: &[String],
) -> ToolCommand {
    let mut cmd = ToolCommand::new(&config.tools.cov);
    cmd.arg("show")
        .args(object_args(&job.binaries))
        .args(["-format", "html", "-instr-profile"])
        .arg(profdata)
        .arg("-o")
        .arg(&job.dir)
        .arg("-show-line-counts-or-regions");
    for part in &config.tools.demangler {
        cmd.arg("-Xdemangler").arg(part);
    }
    cmd.arg("-project-title").arg(&config.title).args(restrict);
    cmd
}

/// Build the `llvm-cov report` invocation for the text summary.
pub fn summary_command(
    config: &Config,
    job: &ReportJob,
    profdata: &Path,
    restrict: &[String],
) -> ToolCommand {
    let mut cmd = ToolCommand::new(&config.tools.cov);
    cmd.arg("report")
        .args(object_args(&job.binaries))
        .arg("-instr-profile")
        .arg(profdata)
        .args(restrict);
    cmd
}

/// Generate the HTML report and summary for one job.
pub fn generate_report(
    config: &Config,
    job: &ReportJob,
    profdata: &Path,
    restrict: &[String],
) -> Result<()> {
    dprintln!(":: Preparing html report for {}...", describe(&job.binaries));
    let _t = Timer::start(format!("report {}", job.dir.display()));

    std::fs::create_dir_all(&job.dir)
        .with_context(|| format!("failed to create {}", job.dir.display()))?;

    let output = show_command(config, job, profdata, restrict).output()?;
    if !output.status.success() {
        return Err(CoverageError::ReportTool {
            binaries: job.binaries.clone(),
            failure: ToolFailure::from_output(&output),
        }
        .into());
    }

    let status =
        summary_command(config, job, profdata, restrict).status_to_file(&job.summary_path())?;
    if !status.success() {
        return Err(CoverageError::SummaryTool { status }.into());
    }

    dprintln!(":: Code coverage reports are in {}", job.dir.display());
    dprintln!(":: Open browser on {}", job.index_page().display());
    Ok(())
}

/// Generate every job in order, each to completion before the next.
pub fn generate_reports(
    config: &Config,
    jobs: &[ReportJob],
    profdata: &Path,
    restrict: &[String],
) -> Result<()> {
    for job in jobs {
        generate_report(config, job, profdata, restrict)?;
    }
    Ok(())
}

fn describe(binaries: &[PathBuf]) -> String {
    binaries
        .iter()
        .map(|b| b.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
