//! perfbench orchestration
//!
//! Ties the template model, the executor and the merge engine to the file
//! system: configuration, logging, report persistence, and the run and join
//! flows behind the `perfbench` binary.
//!
//! # Example
//!
//! ```rust,ignore
//! use perfbench_core::{JoinRequest, JoinRunner, PerfbenchConfig, ReportStore};
//!
//! let config = PerfbenchConfig::discover().unwrap_or_default();
//! let store = ReportStore::new(&config.paths.report_dir);
//! let runner = JoinRunner::new(store, &config.paths.join_tasks_dir);
//! let (report, saved) = runner.run(&request).await?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod config;
mod error;
mod join_runner;
pub mod logging;
mod runner;
mod store;

pub use config::{LoggingConfig, PathsConfig, PerfbenchConfig, WorkMode, CONFIG_FILE};
pub use error::{ConfigError, PerfbenchError, Result, StoreError};
pub use join_runner::{load_reports, JoinRequest, JoinRunner, JOIN_NAME_PREFIX};
pub use runner::{
    attach_log_archive, default_report_name, ReportRunner, DESCRIPTION_TIME_FORMAT, LOGS_ITEM,
    NAME_TIME_FORMAT,
};
pub use store::{ReportStore, SavedReport, REPORT_DATA_PLACEHOLDER};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
