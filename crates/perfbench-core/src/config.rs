//! Configuration loading from perfbench.toml
//!
//! The file is optional. It is discovered by walking up from the current
//! directory, or given explicitly; every field has a default and CLI flags
//! override what the file says.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File name looked up by [`PerfbenchConfig::discover`]
pub const CONFIG_FILE: &str = "perfbench.toml";

/// perfbench configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PerfbenchConfig {
    /// Directory layout
    #[serde(default)]
    pub paths: PathsConfig,
    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where templates, scripts and reports live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Report templates, one per work mode
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,
    /// Shell command files
    #[serde(default = "default_shell_scripts_dir")]
    pub shell_scripts_dir: PathBuf,
    /// SQL command files
    #[serde(default = "default_sql_scripts_dir")]
    pub sql_scripts_dir: PathBuf,
    /// Output directory for `.json` and `.html` reports
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,
    /// Join task files
    #[serde(default = "default_join_tasks_dir")]
    pub join_tasks_dir: PathBuf,
    /// HTML template with a `__REPORT_DATA` placeholder; the bundled one is
    /// used when unset
    #[serde(default)]
    pub html_template: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            templates_dir: default_templates_dir(),
            shell_scripts_dir: default_shell_scripts_dir(),
            sql_scripts_dir: default_sql_scripts_dir(),
            report_dir: default_report_dir(),
            join_tasks_dir: default_join_tasks_dir(),
            html_template: None,
        }
    }
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("reports/templates")
}
fn default_shell_scripts_dir() -> PathBuf {
    PathBuf::from("commands/bash_commands")
}
fn default_sql_scripts_dir() -> PathBuf {
    PathBuf::from("commands/sql_commands")
}
fn default_report_dir() -> PathBuf {
    PathBuf::from("report")
}
fn default_join_tasks_dir() -> PathBuf {
    PathBuf::from("join_tasks")
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// One of debug, info, warn, error; `RUST_LOG` wins when set
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

impl PerfbenchConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError`] when the file is unreadable or malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Find and load `perfbench.toml`, walking up from the current directory
    #[must_use]
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                return Self::load(&config_path).ok();
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Template file for a work mode
    #[must_use]
    pub fn template_path(&self, mode: WorkMode) -> PathBuf {
        self.paths.templates_dir.join(mode.template_file())
    }

    /// Default configuration as TOML text
    #[must_use]
    pub fn default_toml() -> String {
        r#"# perfbench configuration

[paths]
templates_dir = "reports/templates"
shell_scripts_dir = "commands/bash_commands"
sql_scripts_dir = "commands/sql_commands"
report_dir = "report"
join_tasks_dir = "join_tasks"
# html_template = "reports/report.html"

[logging]
# debug, info, warn or error; RUST_LOG overrides
level = "info"
"#
        .to_string()
    }
}

/// What a run collects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkMode {
    /// pgbench load iterations plus environment description
    Benchmark,
    /// Host information only
    CollectSysInfo,
    /// Database information only
    CollectDbInfo,
    /// Host and database information
    CollectAllInfo,
}

impl WorkMode {
    /// Every mode
    pub const ALL: [Self; 4] = [
        Self::Benchmark,
        Self::CollectSysInfo,
        Self::CollectDbInfo,
        Self::CollectAllInfo,
    ];

    /// Mode name as given on the command line
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Benchmark => "benchmark",
            Self::CollectSysInfo => "collect-sys-info",
            Self::CollectDbInfo => "collect-db-info",
            Self::CollectAllInfo => "collect-all-info",
        }
    }

    /// Template file name under the templates directory
    #[must_use]
    pub const fn template_file(self) -> &'static str {
        match self {
            Self::Benchmark => "benchmark_report_struct.json",
            Self::CollectSysInfo => "sys_info_report_struct.json",
            Self::CollectDbInfo => "db_info_report_struct.json",
            Self::CollectAllInfo => "all_info_report_struct.json",
        }
    }
}

impl Display for WorkMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownMode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = PerfbenchConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.paths.report_dir, PathBuf::from("report"));
        assert!(config.paths.html_template.is_none());
    }

    #[test]
    fn test_default_toml_parses() {
        let parsed: PerfbenchConfig = toml::from_str(&PerfbenchConfig::default_toml()).unwrap();
        assert_eq!(parsed, PerfbenchConfig::default());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let parsed: PerfbenchConfig = toml::from_str(
            r#"
[paths]
report_dir = "/var/lib/perfbench"
"#,
        )
        .unwrap();
        assert_eq!(parsed.paths.report_dir, PathBuf::from("/var/lib/perfbench"));
        assert_eq!(parsed.paths.join_tasks_dir, PathBuf::from("join_tasks"));
        assert_eq!(parsed.logging.level, "info");
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[paths\n").unwrap();
        assert!(matches!(
            PerfbenchConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_mode_templates() {
        let config = PerfbenchConfig::default();
        assert_eq!(
            config.template_path(WorkMode::Benchmark),
            PathBuf::from("reports/templates/benchmark_report_struct.json")
        );
        for mode in WorkMode::ALL {
            assert_eq!(mode.as_str().parse::<WorkMode>().unwrap(), mode);
        }
        assert!("collect-everything".parse::<WorkMode>().is_err());
    }
}
