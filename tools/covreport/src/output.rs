//! Report directory lifecycle: reset before a run, open up permissions after.

use anyhow::{Context, Result};
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Mode applied to every report artifact so any consumer can read them.
pub const REPORT_MODE: u32 = 0o777;

/// Recreate `dir` as an empty directory.
///
/// Any previous contents are deleted. A missing directory is not an error.
/// Not safe against concurrent runs using the same directory.
pub fn reset_output_dir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(e).with_context(|| format!("failed to clear {}", dir.display()));
        }
    }
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))
}

/// Set `mode` on `root` and every file and directory beneath it.
///
/// Symlinks are skipped so nothing outside the tree is touched.
#[cfg(unix)]
pub fn relax_permissions(root: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    for entry in WalkDir::new(root).contents_first(true) {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        if entry.path_is_symlink() {
            continue;
        }
        std::fs::set_permissions(entry.path(), std::fs::Permissions::from_mode(mode))
            .with_context(|| format!("failed to chmod {}", entry.path().display()))?;
    }
    Ok(())
}

/// Permissions are left to the platform default outside Unix.
#[cfg(not(unix))]
pub fn relax_permissions(root: &Path, _mode: u32) -> Result<()> {
    for entry in WalkDir::new(root) {
        entry.with_context(|| format!("failed to walk {}", root.display()))?;
    }
    Ok(())
}

/// Delete a file, treating an already-missing file as success.
pub fn remove_file_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("failed to remove {}", path.display())),
    }
}
