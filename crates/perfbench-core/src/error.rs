//! Error types for orchestration, persistence and configuration

use perfbench_join::{JoinError, JoinTaskError};
use perfbench_report::TemplateError;
use std::path::PathBuf;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`crate::PerfbenchConfig`]
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Log level outside debug/info/warn/error
    #[error("unknown log level '{0}', expected one of debug, info, warn, error")]
    LogLevel(String),

    /// Work mode name not recognized
    #[error("unknown work mode '{0}'")]
    UnknownMode(String),
}

/// Report persistence errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The report has no name to derive file names from
    #[error("report has no report_name")]
    MissingReportName,

    /// File system failure
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Report could not be encoded
    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),

    /// Persisted file is not a valid report
    #[error("invalid report {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: TemplateError,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Top-level orchestration errors
#[derive(Debug, thiserror::Error)]
pub enum PerfbenchError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Persistence error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Template file does not exist
    #[error("report template not found: {}", path.display())]
    TemplateNotFound { path: PathBuf },

    /// Template file could not be read
    #[error("cannot read template {}: {source}", path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Template file is not a valid report template
    #[error("invalid template {}: {source}", path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: TemplateError,
    },

    /// Input directory for a join is missing
    #[error("invalid directory: {}", path.display())]
    InputDir { path: PathBuf },

    /// No report could be loaded for a join
    #[error("no reports loaded from {}", path.display())]
    NoReports { path: PathBuf },

    /// Join task file error
    #[error(transparent)]
    JoinTask(#[from] JoinTaskError),

    /// Merge aborted
    #[error("merge of reports failed: {0}")]
    Join(#[from] JoinError),
}

/// Result alias for orchestration
pub type Result<T> = std::result::Result<T, PerfbenchError>;
