//! Raw profile discovery and merging via `llvm-profdata`.
//!
//! Every `.profraw` file under the profile directory is listed in a manifest,
//! which is handed to `llvm-profdata merge -sparse -f` to produce one indexed
//! profile for the report step.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{CoverageError, ToolFailure};
use crate::output::remove_file_if_exists;
use crate::tool::ToolCommand;
use crate::verbose::{Timer, dprintln, vprintln};

/// File name suffix of raw profile fragments.
pub const RAW_PROFILE_SUFFIX: &str = ".profraw";

/// The indexed profile produced by a successful merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedProfile {
    /// Path of the `.profdata` file.
    pub path: PathBuf,
    /// Number of raw fragments merged into it.
    pub fragments: usize,
}

/// Find every raw profile fragment under `dir`, recursively.
///
/// Paths are absolute and sorted by file name within each directory. Only
/// regular files count, including symlinks that resolve to one. A missing or
/// unreadable directory yields no fragments.
pub fn discover_raw_profiles(dir: &Path) -> Result<Vec<PathBuf>> {
    let root = std::path::absolute(dir)
        .with_context(|| format!("failed to resolve {}", dir.display()))?;

    let fragments = WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter(|e| e.file_name().to_string_lossy().ends_with(RAW_PROFILE_SUFFIX))
        .map(walkdir::DirEntry::into_path)
        .collect();
    Ok(fragments)
}

/// Write one fragment path per line to `path`.
pub fn write_manifest(path: &Path, fragments: &[PathBuf]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for fragment in fragments {
        writeln!(writer, "{}", fragment.display())?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Build the `llvm-profdata merge` invocation.
pub fn merge_command(profdata: &Path, manifest: &Path, output: &Path) -> ToolCommand {
    let mut cmd = ToolCommand::new(profdata);
    cmd.args(["merge", "-sparse", "-f"])
        .arg(manifest)
        .arg("-o")
        .arg(output);
    cmd
}

/// Merge every raw profile under `profile_data_dir` into the configured
/// `.profdata` file.
///
/// The manifest is deleted on success and kept when the merge tool fails.
pub fn merge_raw_profiles(config: &Config, profile_data_dir: &Path) -> Result<MergedProfile> {
    dprintln!(":: Merging raw profiles...");
    let _t = Timer::start("profile merge");

    let manifest = config.manifest_path();
    let output = config.profdata_path();
    vprintln!("  manifest: {}", manifest.display());

    let fragments = discover_raw_profiles(profile_data_dir)?;
    write_manifest(&manifest, &fragments)?;
    if fragments.is_empty() {
        return Err(CoverageError::NoProfiles {
            dir: profile_data_dir.to_path_buf(),
        }
        .into());
    }
    vprintln!("  found {} raw profiles", fragments.len());

    let result = merge_command(&config.tools.profdata, &manifest, &output).output()?;
    if !result.status.success() {
        return Err(CoverageError::MergeTool(ToolFailure::from_output(&result)).into());
    }

    remove_file_if_exists(&manifest)?;
    Ok(MergedProfile {
        path: output,
        fragments: fragments.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"raw").unwrap();
    }

    #[test]
    fn discovers_nested_fragments_only() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("replica-1/default-123.profraw"));
        touch(&root.join("replica-1/nested/deep/client.profraw"));
        touch(&root.join("apollo.profraw"));
        touch(&root.join("notes.txt"));
        touch(&root.join("old.profraw.bak"));
        touch(&root.join("Coverage.profdata"));

        let found = discover_raw_profiles(root).unwrap();
        assert_eq!(
            found,
            [
                root.join("apollo.profraw"),
                root.join("replica-1/default-123.profraw"),
                root.join("replica-1/nested/deep/client.profraw"),
            ]
        );
        assert!(found.iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn directories_named_like_fragments_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("run.profraw")).unwrap();
        assert!(discover_raw_profiles(tmp.path()).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_count_only_when_they_reach_a_file() {
        use std::os::unix::fs::symlink;

        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("profiles");
        touch(&root.join("real.profraw"));
        std::fs::create_dir_all(tmp.path().join("elsewhere/inner")).unwrap();
        touch(&tmp.path().join("elsewhere/inner/hidden.profraw"));
        touch(&tmp.path().join("shared.raw"));
        symlink(tmp.path().join("elsewhere"), root.join("linked.profraw")).unwrap();
        symlink(tmp.path().join("gone"), root.join("dangling.profraw")).unwrap();
        symlink(tmp.path().join("shared.raw"), root.join("shared.profraw")).unwrap();

        assert_eq!(
            discover_raw_profiles(&root).unwrap(),
            [root.join("real.profraw"), root.join("shared.profraw")]
        );
    }

    #[test]
    fn missing_directory_has_no_fragments() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(discover_raw_profiles(&tmp.path().join("absent")).unwrap().is_empty());
    }

    #[test]
    fn manifest_lists_one_path_per_line() {
        let tmp = tempfile::tempdir().unwrap();
        let manifest = tmp.path().join("profiles.manifest");
        let fragments = vec![PathBuf::from("/p/a.profraw"), PathBuf::from("/p/b/c.profraw")];
        write_manifest(&manifest, &fragments).unwrap();
        assert_eq!(
            std::fs::read_to_string(&manifest).unwrap(),
            "/p/a.profraw\n/p/b/c.profraw\n"
        );
    }

    #[test]
    fn merge_command_uses_sparse_manifest_mode() {
        let cmd = merge_command(
            Path::new("llvm-profdata"),
            Path::new("r/profiles.manifest"),
            Path::new("r/Coverage.profdata"),
        );
        assert_eq!(
            cmd.display(),
            "llvm-profdata merge -sparse -f r/profiles.manifest -o r/Coverage.profdata"
        );
    }

    fn config_in(dir: &Path) -> Config {
        let report_dir = dir.join("report");
        std::fs::create_dir_all(&report_dir).unwrap();
        Config {
            report_dir,
            ..Config::default()
        }
    }

    #[test]
    fn no_fragments_fails_before_running_the_merger() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = config_in(tmp.path());
        config.tools.profdata = tmp.path().join("never-run");
        std::fs::create_dir_all(tmp.path().join("profiles")).unwrap();

        let err = merge_raw_profiles(&config, &tmp.path().join("profiles")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoverageError>(),
            Some(CoverageError::NoProfiles { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn successful_merge_consumes_the_manifest() {
        use crate::test_support::{fake_profdata, script_lock};

        let _lock = script_lock();
        let tmp = tempfile::tempdir().unwrap();
        let mut config = config_in(tmp.path());
        config.tools.profdata = fake_profdata(tmp.path());
        let profiles = tmp.path().join("profiles");
        touch(&profiles.join("a.profraw"));
        touch(&profiles.join("sub/b.profraw"));

        let merged = merge_raw_profiles(&config, &profiles).unwrap();
        assert_eq!(merged.path, config.profdata_path());
        assert_eq!(merged.fragments, 2);
        assert!(!config.manifest_path().exists());

        // The fake merger copies the manifest into the output.
        let listed = std::fs::read_to_string(&merged.path).unwrap();
        let expected = format!(
            "{}\n{}\n",
            profiles.join("a.profraw").display(),
            profiles.join("sub/b.profraw").display()
        );
        assert_eq!(listed, expected);

        let log = std::fs::read_to_string(tmp.path().join("profdata.log")).unwrap();
        assert!(log.starts_with("merge -sparse -f "));
    }

    #[cfg(unix)]
    #[test]
    fn failed_merge_keeps_manifest_and_reports_output() {
        use crate::test_support::{failing_profdata, script_lock};

        let _lock = script_lock();
        let tmp = tempfile::tempdir().unwrap();
        let mut config = config_in(tmp.path());
        config.tools.profdata = failing_profdata(tmp.path());
        let profiles = tmp.path().join("profiles");
        touch(&profiles.join("a.profraw"));

        let err = merge_raw_profiles(&config, &profiles).unwrap_err();
        let Some(CoverageError::MergeTool(failure)) = err.downcast_ref::<CoverageError>() else {
            panic!("expected merge failure, got {err:?}");
        };
        assert_eq!(failure.status.code(), Some(1));
        assert_eq!(failure.stdout, "merging\n");
        assert!(failure.stderr.contains("malformed instrumentation profile"));
        assert!(config.manifest_path().exists());
    }
}
