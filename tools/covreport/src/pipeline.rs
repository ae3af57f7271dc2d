//! The coverage run: reset output, merge profiles, render reports, clean up.
//!
//! Steps run strictly in sequence and the first failure ends the run.

use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};

use crate::config::Config;
use crate::error::CoverageError;
use crate::merge::{self, MergedProfile};
use crate::output::{self, REPORT_MODE};
use crate::report::{self, ReportJob, ReportMode};
use crate::verbose::{dprintln, vprintln};

/// What the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Directory searched recursively for `.profraw` files.
    pub profile_data_dir: PathBuf,
    /// Instrumented binaries, primary first.
    pub binaries: Vec<PathBuf>,
    /// Unified or per-binary reporting.
    pub mode: ReportMode,
    /// Source path filters forwarded to `llvm-cov`.
    pub restrict: Vec<String>,
    /// Keep the merged profile after reporting.
    pub preserve_profiles: bool,
}

/// Result of a successful run.
#[derive(Debug)]
pub struct Outcome {
    /// The merged profile; only present on disk if it was preserved.
    pub profile: MergedProfile,
    /// Reports that were generated.
    pub jobs: Vec<ReportJob>,
}

/// Run the full pipeline against `config.report_dir`.
///
/// Fails with [`CoverageError::ReportDirOverlapsProfiles`] before touching the
/// disk if resetting the report directory would delete the raw profiles.
///
/// The merge runs before the binary list is checked, so an empty list still
/// leaves a merged profile behind before failing with
/// [`CoverageError::NoBinaries`].
pub fn run(config: &Config, request: &Request) -> Result<Outcome> {
    vprintln!("  report directory: {}", config.report_dir.display());
    check_disjoint(&config.report_dir, &request.profile_data_dir)?;
    output::reset_output_dir(&config.report_dir)?;

    let profile = merge::merge_raw_profiles(config, &request.profile_data_dir)?;
    dprintln!(":: Merged {} raw profiles", profile.fragments);

    if request.binaries.is_empty() {
        return Err(CoverageError::NoBinaries.into());
    }

    let jobs = report::plan_reports(&config.report_dir, &request.binaries, request.mode)?;
    if request.mode == ReportMode::Unified {
        dprintln!(":: Unified report");
    }
    report::generate_reports(config, &jobs, &profile.path, &request.restrict)?;
    output::relax_permissions(&config.report_dir, REPORT_MODE)?;

    if !request.preserve_profiles {
        output::remove_file_if_exists(&profile.path)?;
    }

    Ok(Outcome { profile, jobs })
}

/// Refuse a report directory that equals or encloses the profile directory,
/// since resetting it would delete the raw profiles before the merge.
fn check_disjoint(report_dir: &Path, profile_data_dir: &Path) -> Result<()> {
    let report = resolve(report_dir)?;
    let profiles = resolve(profile_data_dir)?;
    if profiles.starts_with(&report) {
        return Err(CoverageError::ReportDirOverlapsProfiles {
            report_dir: report_dir.to_path_buf(),
            profile_data_dir: profile_data_dir.to_path_buf(),
        }
        .into());
    }
    Ok(())
}

/// Absolute form of `path` with `.` and `..` folded away. The longest existing
/// prefix is canonicalized so symlinked spellings compare equal.
fn resolve(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("failed to resolve {}", path.display()))?;
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }

    let mut missing = Vec::new();
    let mut existing = normalized.as_path();
    loop {
        if let Ok(canonical) = std::fs::canonicalize(existing) {
            return Ok(missing.iter().rev().fold(canonical, |acc, part| acc.join(part)));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(normalized),
        }
    }
}
