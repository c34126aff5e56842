//! Join tasks: caller-declared must-match fields

use crate::error::JoinTaskError;
use perfbench_report::FieldPath;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Ordered list of fields that must be identical across merged reports
///
/// The verbatim file text is kept for the merged report's description.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JoinTask {
    items: Vec<FieldPath>,
    raw: String,
}

impl JoinTask {
    /// Create a task from paths, with a synthesized raw text
    #[must_use]
    pub fn new(items: Vec<FieldPath>) -> Self {
        let names: Vec<Value> = items.iter().map(|p| Value::String(p.to_string())).collect();
        let raw = serde_json::json!({ "items": names }).to_string();
        Self { items, raw }
    }

    /// Parse `{"items": [...]}` text
    ///
    /// # Errors
    /// Returns [`JoinTaskError`] for malformed JSON, a missing or empty
    /// `items` list, or an entry that is not a dotted path.
    pub fn from_json_str(text: &str, origin: &Path) -> Result<Self, JoinTaskError> {
        let value: Value = serde_json::from_str(text).map_err(|source| JoinTaskError::Json {
            path: origin.to_path_buf(),
            source,
        })?;
        let Some(Value::Array(entries)) = value.get("items") else {
            return Err(JoinTaskError::MissingItems {
                path: origin.to_path_buf(),
            });
        };
        if entries.is_empty() {
            return Err(JoinTaskError::Empty {
                path: origin.to_path_buf(),
            });
        }

        let items = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let entry = entry.as_str().ok_or(JoinTaskError::NotAString { index })?;
                entry.parse().map_err(|source| JoinTaskError::InvalidPath {
                    entry: entry.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<FieldPath>, _>>()?;

        Ok(Self {
            items,
            raw: text.to_string(),
        })
    }

    /// Resolve a task file name: relative names live under `tasks_dir`
    #[must_use]
    pub fn resolve(name: impl AsRef<Path>, tasks_dir: &Path) -> PathBuf {
        let name = name.as_ref();
        if name.is_absolute() {
            name.to_path_buf()
        } else {
            tasks_dir.join(name)
        }
    }

    /// Read and parse a task file
    ///
    /// # Errors
    /// Returns [`JoinTaskError`] when the file is missing, unreadable or invalid.
    pub async fn load(path: &Path) -> Result<Self, JoinTaskError> {
        let text = tokio::fs::read_to_string(path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                JoinTaskError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                JoinTaskError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::from_json_str(&text, path)
    }

    /// Must-match paths in file order
    #[inline]
    #[must_use]
    pub fn items(&self) -> &[FieldPath] {
        &self.items
    }

    /// Verbatim task file contents
    #[inline]
    #[must_use]
    pub fn raw_text(&self) -> &str {
        &self.raw
    }

    /// Whether `path` must match across reports
    ///
    /// Paths are compared in their dotted form, so a section or item name
    /// containing a dot still matches the entry that spells it out.
    #[must_use]
    pub fn is_allowlisted(&self, path: &FieldPath) -> bool {
        let dotted = path.to_string();
        self.items.iter().any(|item| item.to_string() == dotted)
    }
}
