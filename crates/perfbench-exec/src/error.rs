//! Error types for report execution
//!
//! [`StepError`] never escapes the executor: its display text becomes the
//! failed item's data. The messages are therefore written for the report
//! reader, not for a log.

use perfbench_report::ItemKind;
use std::path::PathBuf;

/// Failure reported by a shell or SQL collaborator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    /// Command exited unsuccessfully or could not be started
    #[error("command failed: {0}")]
    Command(String),

    /// Query was rejected by the database
    #[error("query failed: {0}")]
    Query(String),

    /// Session to the target is gone
    #[error("connection lost: {0}")]
    Connection(String),
}

/// Script asset lookup errors
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// No file with that name in the script directory
    #[error("Script file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// File exists but could not be read
    #[error("Failed to read script file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Step-local failure, stored into the item instead of propagated
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// Referenced script could not be loaded
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// Collaborator call failed
    #[error("Error generating report of type \"{kind}\": {source}")]
    Collaborator {
        kind: ItemKind,
        #[source]
        source: CollaboratorError,
    },

    /// Scalar query returned NULL or nothing
    #[error("Error generating report of type \"{kind}\": No data returned.")]
    NoData { kind: ItemKind },

    /// Row query returned zero rows
    #[error("Error generating a report of type \"shell_command_file\" for format \"table\": No data returned.")]
    NoRows,

    /// Shell output for a table is not JSON
    #[error("Error parsing JSON for table report: {0}")]
    TableJson(#[source] serde_json::Error),

    /// Shell output for a table is JSON but not a list
    #[error("Unexpected data format from shell command. A list of dicts is expected.")]
    NotAList,

    /// Output for a chart is not a chart object
    #[error("Error parsing chart data: {0}")]
    ChartJson(String),

    /// No callback registered under that name
    #[error("Not found or is not a function: {0}")]
    UnknownCallback(String),

    /// Callback could not produce data from the run context
    #[error("{0}")]
    Callback(String),
}

impl StepError {
    /// Callback failure with a reader-facing message
    #[inline]
    #[must_use]
    pub fn callback(message: impl Into<String>) -> Self {
        Self::Callback(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collaborator_message_names_kind() {
        let err = StepError::Collaborator {
            kind: ItemKind::PlainText,
            source: CollaboratorError::Command("exit 1".into()),
        };
        assert_eq!(
            err.to_string(),
            "Error generating report of type \"plain_text\": command failed: exit 1"
        );
    }

    #[test]
    fn no_data_message() {
        let err = StepError::NoData {
            kind: ItemKind::PlainText,
        };
        assert_eq!(
            err.to_string(),
            "Error generating report of type \"plain_text\": No data returned."
        );
    }

    #[test]
    fn unknown_callback_message() {
        let err = StepError::UnknownCallback("chart_latency".into());
        assert_eq!(err.to_string(), "Not found or is not a function: chart_latency");
    }

    #[test]
    fn script_not_found_shows_path() {
        let err = StepError::from(ScriptError::NotFound {
            path: PathBuf::from("/scripts/cpu.sh"),
        });
        assert_eq!(err.to_string(), "Script file not found: /scripts/cpu.sh");
    }
}
