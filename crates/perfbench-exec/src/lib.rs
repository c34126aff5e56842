//! Report execution
//!
//! Fills a report template by dispatching each execution step to its
//! collaborator.
//!
//! # Core Concepts
//!
//! - [`ShellRunner`] / [`SqlHandle`]: transport and database seams
//! - [`ScriptStore`]: shell and SQL script bodies, addressed by file name
//! - [`CallbackRegistry`]: named callbacks for `python_command` items
//! - [`Executor`]: strictly sequential step runner with per-step failure capture
//! - [`load_iterations`] / [`run_iterations`]: pgbench workload helpers
//!
//! # Example
//!
//! ```rust,ignore
//! use perfbench_exec::{CallbackRegistry, Executor, RunContext, ScriptStore};
//!
//! let executor = Executor::new(
//!     ScriptStore::new("commands/bash", "commands/sql"),
//!     CallbackRegistry::with_defaults(),
//! );
//! let summary = executor.execute(&mut report, &shell, Some(&db), &ctx).await;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod callbacks;
mod collaborator;
mod context;
mod error;
mod executor;
mod scripts;
mod workload;

pub use callbacks::{Callback, CallbackRegistry};
pub use collaborator::{Row, ShellRunner, SqlHandle};
pub use context::{display_value, sanitize_args, RunContext, SENSITIVE_ARGS};
pub use error::{CollaboratorError, ScriptError, StepError};
pub use executor::{ExecutionSummary, Executor};
pub use scripts::ScriptStore;
pub use workload::{
    load_iterations, parse_pgbench_output, placeholder, run_iterations, LoadIteration,
    PgbenchResult, WorkloadConfig, BENCHMARK_CUSTOM, BENCHMARK_DEFAULT,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
