//! Collaborator seams
//!
//! The executor never talks to a transport or a database driver directly.
//! Both sit behind these traits; a run owns exactly one [`ShellRunner`] and at
//! most one [`SqlHandle`], and calls them one at a time.

use crate::error::CollaboratorError;
use indexmap::IndexMap;
use serde_json::Value;

/// A single fetched row, columns in query order
pub type Row = IndexMap<String, Value>;

/// Runs shell command text on the target host
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ShellRunner: Send + Sync {
    /// Run `command` and return its standard output
    async fn run(&self, command: &str) -> Result<String, CollaboratorError>;
}

/// Executes SQL against the target database
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SqlHandle: Send + Sync {
    /// First column of the first row, `None` when the query yields nothing
    async fn fetchval(&self, sql: &str) -> Result<Option<Value>, CollaboratorError>;

    /// All rows
    async fn fetch(&self, sql: &str) -> Result<Vec<Row>, CollaboratorError>;
}
