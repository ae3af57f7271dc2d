//! Error types for the coverage pipeline.

use std::fmt;
use std::path::PathBuf;
use std::process::{ExitStatus, Output};

/// Exit status and captured output of an external tool that failed.
#[derive(Debug)]
pub struct ToolFailure {
    /// Exit status reported by the tool.
    pub status: ExitStatus,
    /// Captured standard output, lossily decoded.
    pub stdout: String,
    /// Captured standard error, lossily decoded.
    pub stderr: String,
}

impl ToolFailure {
    /// Capture the status and output streams of a finished process.
    pub fn from_output(output: &Output) -> Self {
        Self {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

impl fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Status - {}", self.status)?;
        writeln!(f, "  Stdout - {}", self.stdout.trim_end())?;
        write!(f, "  Stderr - {}", self.stderr.trim_end())
    }
}

/// Errors that terminate a coverage run.
#[derive(Debug)]
pub enum CoverageError {
    /// No `.profraw` files were found under the profile directory.
    NoProfiles {
        /// Directory that was searched.
        dir: PathBuf,
    },
    /// `llvm-profdata merge` exited with a non-zero status.
    MergeTool(ToolFailure),
    /// `llvm-cov show` exited with a non-zero status.
    ReportTool {
        /// Binaries covered by the failed report.
        binaries: Vec<PathBuf>,
        /// Status and output of the failed invocation.
        failure: ToolFailure,
    },
    /// `llvm-cov report` exited with a non-zero status.
    SummaryTool {
        /// Exit status of the summary invocation.
        status: ExitStatus,
    },
    /// The profile merged but no binaries were given to report on.
    NoBinaries,
    /// The report directory is, or contains, the profile directory and
    /// resetting it would delete the raw profiles.
    ReportDirOverlapsProfiles {
        /// Configured report directory.
        report_dir: PathBuf,
        /// Requested profile directory.
        profile_data_dir: PathBuf,
    },
}

impl fmt::Display for CoverageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoProfiles { dir } => {
                write!(f, "no raw profiles present under {}", dir.display())
            }
            Self::MergeTool(failure) => write!(f, "code coverage merge failed\n{failure}"),
            Self::ReportTool { binaries, failure } => {
                write!(f, "code coverage report generation failed for ")?;
                write_binaries(f, binaries)?;
                write!(f, "\n{failure}")
            }
            Self::SummaryTool { status } => {
                write!(f, "code coverage summary generation failed ({status})")
            }
            Self::NoBinaries => write!(f, "No binaries specified, no work to do!"),
            Self::ReportDirOverlapsProfiles {
                report_dir,
                profile_data_dir,
            } => write!(
                f,
                "report directory {} contains the profile directory {}; \
                 choose a report directory outside the raw profiles",
                report_dir.display(),
                profile_data_dir.display()
            ),
        }
    }
}

impl std::error::Error for CoverageError {}

fn write_binaries(f: &mut fmt::Formatter<'_>, binaries: &[PathBuf]) -> fmt::Result {
    for (i, binary) in binaries.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", binary.display())?;
    }
    Ok(())
}
