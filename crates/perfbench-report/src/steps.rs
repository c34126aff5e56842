//! Ordered execution steps
//!
//! Flattening is section order, then item order; no sorting. The executor
//! and the merge engine both call [`extract_steps`], so equal positions in two
//! step lists refer to the same template slot.

use crate::item::{CommandKind, CommandSource, Item};
use crate::path::FieldPath;
use crate::report::Report;
use std::fmt::{self, Display, Formatter};

/// Owned `(section, item)` address of a step
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StepKey {
    /// Section name
    pub section: String,
    /// Item name within the section
    pub item: String,
}

impl StepKey {
    /// Create a step key
    #[must_use]
    pub fn new(section: impl Into<String>, item: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            item: item.into(),
        }
    }

    /// Path of the addressed item's `data` slot
    #[must_use]
    pub fn field_path(&self) -> FieldPath {
        FieldPath::item_data(&self.section, &self.item)
    }
}

impl Display for StepKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section, self.item)
    }
}

/// One item that carries a command, borrowed from its report
#[derive(Debug, Clone, Copy)]
pub struct ExecutionStep<'a> {
    /// Position in the step list
    pub index: usize,
    /// Section name
    pub section: &'a str,
    /// Item name
    pub item_name: &'a str,
    /// Command backing the item
    pub command: &'a CommandSource,
    /// The item itself
    pub item: &'a Item,
}

impl ExecutionStep<'_> {
    /// Owned address of this step
    #[must_use]
    pub fn key(&self) -> StepKey {
        StepKey::new(self.section, self.item_name)
    }

    /// Command kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> CommandKind {
        self.command.kind()
    }

    /// Path of the item's `data` slot
    #[must_use]
    pub fn field_path(&self) -> FieldPath {
        FieldPath::item_data(self.section, self.item_name)
    }

    /// Whether two steps address the same `(section, item)` slot
    #[must_use]
    pub fn same_slot(&self, other: &ExecutionStep<'_>) -> bool {
        self.section == other.section && self.item_name == other.item_name
    }
}

/// Flatten a report into its ordered command-bearing steps
#[must_use]
pub fn extract_steps(report: &Report) -> Vec<ExecutionStep<'_>> {
    report
        .sections
        .iter()
        .flat_map(|(section, content)| {
            content.reports.iter().filter_map(move |(item_name, item)| {
                item.source().map(|command| (section.as_str(), item_name.as_str(), command, item))
            })
        })
        .enumerate()
        .map(|(index, (section, item_name, command, item))| ExecutionStep {
            index,
            section,
            item_name,
            command,
            item,
        })
        .collect()
}

impl Report {
    /// Ordered command-bearing steps of this report
    #[must_use]
    pub fn steps(&self) -> Vec<ExecutionStep<'_>> {
        extract_steps(self)
    }
}
