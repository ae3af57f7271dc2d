//! Shell-script stand-ins for the LLVM tools, shared by unit tests.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

static SCRIPT_LOCK: Mutex<()> = Mutex::new(());

/// Serialize script creation and execution.
///
/// Executing a script while another thread holds a write handle to it fails
/// with `ETXTBSY`, so tests that write and run scripts take this lock first.
pub fn script_lock() -> MutexGuard<'static, ()> {
    SCRIPT_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Write an executable `/bin/sh` script named `name` into `dir`.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// A merger that copies the manifest to the `-o` output and logs its arguments.
pub fn fake_profdata(dir: &Path) -> PathBuf {
    let log = dir.join("profdata.log");
    write_script(
        dir,
        "llvm-profdata",
        &format!(
            r#"echo "$@" >> "{log}"
while [ $# -gt 0 ]; do
  case "$1" in
    -f) manifest="$2"; shift ;;
    -o) out="$2"; shift ;;
  esac
  shift
done
cat "$manifest" > "$out""#,
            log = log.display()
        ),
    )
}

/// A merger that always fails with recognizable output.
pub fn failing_profdata(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "llvm-profdata",
        "echo merging\necho 'error: malformed instrumentation profile data' >&2\nexit 1",
    )
}

/// A coverage tool that writes `index.html` for `show` and echoes its
/// arguments for `report`, logging every invocation.
pub fn fake_cov(dir: &Path) -> PathBuf {
    let log = dir.join("cov.log");
    write_script(
        dir,
        "llvm-cov",
        &format!(
            r#"echo "$@" >> "{log}"
sub="$1"
args="$*"
if [ "$sub" = "show" ]; then
  while [ $# -gt 0 ]; do
    if [ "$1" = "-o" ]; then out="$2"; fi
    shift
  done
  mkdir -p "$out"
  echo "$args" > "$out/index.html"
else
  echo "TOTAL $args"
fi"#,
            log = log.display()
        ),
    )
}
