//! Error types for report joining
//!
//! Every [`JoinError`] aborts the whole merge; no partially merged report is
//! ever returned.

use perfbench_report::{FieldPath, PathError};
use std::path::PathBuf;

/// Fatal merge failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    /// Step lists of the two reports disagree
    #[error("reports '{reference}' and '{comparator}' differ in structure at step {index}: {detail}")]
    StructuralMismatch {
        index: usize,
        reference: String,
        comparator: String,
        detail: String,
    },

    /// A field declared must-match differs
    #[error("field {path} must match but differs between '{reference}' and '{comparator}'")]
    AllowlistedMismatch {
        reference: String,
        comparator: String,
        path: FieldPath,
    },

    /// Nothing to merge
    #[error("no reports to join")]
    EmptyInput,
}

/// Join task file errors
#[derive(Debug, thiserror::Error)]
pub enum JoinTaskError {
    /// File does not exist
    #[error("join task file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// File could not be read
    #[error("failed to read join task file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid JSON
    #[error("cannot parse join task file {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// No `items` list in the file
    #[error("join task file {} has no 'items' list", path.display())]
    MissingItems { path: PathBuf },

    /// An entry of `items` is not a string
    #[error("join task entry {index} is not a string")]
    NotAString { index: usize },

    /// An entry of `items` is not a valid dotted path
    #[error("join task entry '{entry}' is not a field path: {source}")]
    InvalidPath {
        entry: String,
        #[source]
        source: PathError,
    },

    /// `items` is empty
    #[error("join task file {} lists no items", path.display())]
    Empty { path: PathBuf },
}
