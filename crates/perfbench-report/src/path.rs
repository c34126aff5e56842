//! Dotted field paths into the report tree
//!
//! Join tasks name must-match fields as `sections.<section>.reports.<item>.data`.
//! [`FieldPath`] is the parsed form. Names may themselves contain dots, so
//! paths built from names and parsed paths are matched by their dotted form.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Dotted path addressing a field of a report
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Create a path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Path of an item's `data` slot
    #[must_use]
    pub fn item_data(section: &str, item: &str) -> Self {
        Self(vec![
            "sections".to_string(),
            section.to_string(),
            "reports".to_string(),
            item.to_string(),
            "data".to_string(),
        ])
    }

    /// Path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the path has no segments
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PathError::Empty);
        }
        let segments = trimmed
            .split('.')
            .map(|seg| {
                if seg.is_empty() {
                    Err(PathError::EmptySegment(trimmed.to_string()))
                } else {
                    Ok(seg.to_string())
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self(segments))
    }
}

/// Field path parse errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Blank path
    #[error("field path is empty")]
    Empty,

    /// Two consecutive dots, or a leading/trailing dot
    #[error("field path '{0}' has an empty segment")]
    EmptySegment(String),
}
