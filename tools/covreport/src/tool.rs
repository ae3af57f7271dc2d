//! Typed builder for external tool invocations.
//!
//! Wraps `std::process::Command` so every call into `llvm-profdata` and
//! `llvm-cov` shares the same spawn error context and verbose echo.

use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output, Stdio};

use anyhow::{Context, Result};

use crate::verbose::vprintln;

/// A blocking invocation of an external tool.
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ToolCommand {
    /// Create a new invocation of `program` (a bare name is looked up in `PATH`).
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, arg: impl AsRef<OsStr>) -> &mut Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append several arguments in order.
    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// The arguments passed after the program name.
    #[cfg(test)]
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Render the command line for diagnostics.
    pub fn display(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }

    fn command(&self) -> Command {
        vprintln!("  $ {}", self.display());
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    /// Run to completion, capturing stdout and stderr.
    ///
    /// A non-zero exit is not an error here; callers inspect `Output::status`.
    pub fn output(&self) -> Result<Output> {
        self.command()
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("failed to run {}: is it installed?", self.program.display()))
    }

    /// Run to completion with stdout redirected into a new file at `path`.
    ///
    /// Stderr is inherited so tool warnings stay visible.
    pub fn status_to_file(&self, path: &Path) -> Result<ExitStatus> {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        self.command()
            .stdin(Stdio::null())
            .stdout(file)
            .status()
            .with_context(|| format!("failed to run {}: is it installed?", self.program.display()))
    }
}
