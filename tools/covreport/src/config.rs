//! Configuration loading from `covreport.toml` and command-line overrides.
//!
//! Resolution order: built-in defaults, then the config file, then flags.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cli::Cli;

/// File name looked up in the working directory when `--config` is absent.
pub const CONFIG_FILE_NAME: &str = "covreport.toml";

/// Report directory used when neither file nor flags set one.
pub const DEFAULT_REPORT_DIR: &str = "build/codecoveragereport";

/// Project title used when neither file nor flags set one.
pub const DEFAULT_TITLE: &str = "Code Coverage";

/// On-disk configuration file layout.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    tools: ToolsSection,
    #[serde(default)]
    report: ReportSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct ToolsSection {
    llvm_profdata: Option<PathBuf>,
    llvm_cov: Option<PathBuf>,
    demangler: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReportSection {
    dir: Option<PathBuf>,
    title: Option<String>,
}

/// External tools invoked by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tools {
    /// Profile merger (`llvm-profdata`).
    pub profdata: PathBuf,
    /// Coverage renderer (`llvm-cov`).
    pub cov: PathBuf,
    /// Demangler program followed by its flags, forwarded via `-Xdemangler`.
    pub demangler: Vec<String>,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            profdata: PathBuf::from("llvm-profdata"),
            cov: PathBuf::from("llvm-cov"),
            demangler: vec!["c++filt".into(), "-n".into()],
        }
    }
}

/// Resolved configuration for one coverage run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// External tools.
    pub tools: Tools,
    /// Output directory, recreated at the start of every run.
    pub report_dir: PathBuf,
    /// Title shown on every HTML report.
    pub title: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tools: Tools::default(),
            report_dir: PathBuf::from(DEFAULT_REPORT_DIR),
            title: DEFAULT_TITLE.into(),
        }
    }
}

impl Config {
    /// Load the configuration for a command line.
    ///
    /// An explicit `--config` file must exist; otherwise `covreport.toml` in
    /// the working directory is used when present.
    pub fn load(cli: &Cli) -> Result<Self> {
        let path = match cli.config {
            Some(ref path) => Some(path.as_path()),
            None => Some(Path::new(CONFIG_FILE_NAME)).filter(|p| p.is_file()),
        };

        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                Self::from_toml(&content)
                    .with_context(|| format!("failed to load {}", path.display()))?
            }
            None => Self::default(),
        };
        config.apply_cli(cli);
        Ok(config)
    }

    /// Parse configuration text on top of the defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content).context("failed to parse config")?;
        let mut config = Self::default();
        config.apply_file(file)?;
        Ok(config)
    }

    fn apply_file(&mut self, file: ConfigFile) -> Result<()> {
        if let Some(profdata) = file.tools.llvm_profdata {
            self.tools.profdata = profdata;
        }
        if let Some(cov) = file.tools.llvm_cov {
            self.tools.cov = cov;
        }
        if let Some(demangler) = file.tools.demangler {
            if demangler.is_empty() {
                bail!("tools.demangler must name a program");
            }
            self.tools.demangler = demangler;
        }
        if let Some(dir) = file.report.dir {
            self.report_dir = dir;
        }
        if let Some(title) = file.report.title {
            self.title = title;
        }
        Ok(())
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(ref profdata) = cli.llvm_profdata {
            self.tools.profdata.clone_from(profdata);
        }
        if let Some(ref cov) = cli.llvm_cov {
            self.tools.cov.clone_from(cov);
        }
        if let Some(ref dir) = cli.report_dir {
            self.report_dir.clone_from(dir);
        }
        if let Some(ref title) = cli.title {
            self.title.clone_from(title);
        }
    }

    /// Path of the transient fragment list.
    pub fn manifest_path(&self) -> PathBuf {
        self.report_dir.join("profiles.manifest")
    }

    /// Path of the merged, indexed profile.
    pub fn profdata_path(&self) -> PathBuf {
        self.report_dir.join("Coverage.profdata")
    }
}
