//! Report items
//!
//! An [`Item`] is a leaf of the report tree: display metadata, at most one
//! [`CommandSource`] saying how its data is produced, and the data slot.
//!
//! The item kind can only move from `table`/`chart` to `plain_text`, through
//! [`Item::record_failure`]. There is no setter that widens it.

use crate::data::{ChartData, ItemData};
use serde_json::Value;
use std::fmt::{self, Display, Formatter};

/// Header suffix marking an item whose data differs between merged reports
pub const DIFF_SUFFIX: &str = " | Diff";

/// Item presentation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// Free text
    PlainText,
    /// Header row plus data rows
    Table,
    /// Series chart
    Chart,
    /// Path to an artifact (e.g. a log archive)
    Link,
}

impl ItemKind {
    /// On-disk name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PlainText => "plain_text",
            Self::Table => "table",
            Self::Chart => "chart",
            Self::Link => "link",
        }
    }

    /// Parse the on-disk name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "plain_text" => Some(Self::PlainText),
            "table" => Some(Self::Table),
            "chart" => Some(Self::Chart),
            "link" => Some(Self::Link),
            _ => None,
        }
    }
}

impl Display for ItemKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Initial display state in the HTML view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ItemState {
    /// Shown open
    #[default]
    Expanded,
    /// Shown folded
    Collapsed,
    /// Not shown
    Hidden,
}

impl ItemState {
    /// On-disk name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Expanded => "expanded",
            Self::Collapsed => "collapsed",
            Self::Hidden => "hidden",
        }
    }

    /// Parse the on-disk name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "expanded" => Some(Self::Expanded),
            "collapsed" => Some(Self::Collapsed),
            "hidden" => Some(Self::Hidden),
            _ => None,
        }
    }
}

/// Kind of command backing an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Script run through the shell collaborator
    Shell,
    /// Query run through the SQL collaborator
    Sql,
    /// Named callback from the registry
    Python,
}

impl Display for CommandKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Shell => "shell_command",
            Self::Sql => "sql_command",
            Self::Python => "python_command",
        })
    }
}

/// How an item's data is produced
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CommandSource {
    /// Script file name under the shell scripts directory
    Shell(String),
    /// Script file name under the SQL scripts directory
    Sql(String),
    /// Callback name in the registry
    Python(String),
}

impl CommandSource {
    /// JSON keys that mark a command source, in precedence order
    pub const MARKERS: [&'static str; 3] =
        ["shell_command_file", "sql_command_file", "python_command"];

    /// Command kind
    #[must_use]
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Shell(_) => CommandKind::Shell,
            Self::Sql(_) => CommandKind::Sql,
            Self::Python(_) => CommandKind::Python,
        }
    }

    /// File name or callback name
    #[must_use]
    pub fn reference(&self) -> &str {
        match self {
            Self::Shell(r) | Self::Sql(r) | Self::Python(r) => r,
        }
    }

    /// JSON key carrying this source
    #[must_use]
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Shell(_) => Self::MARKERS[0],
            Self::Sql(_) => Self::MARKERS[1],
            Self::Python(_) => Self::MARKERS[2],
        }
    }

    /// Build from a marker key and its value
    #[must_use]
    pub fn from_marker(marker: &str, reference: String) -> Option<Self> {
        match marker {
            "shell_command_file" => Some(Self::Shell(reference)),
            "sql_command_file" => Some(Self::Sql(reference)),
            "python_command" => Some(Self::Python(reference)),
            _ => None,
        }
    }
}

/// A leaf entry of a report section
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// Display header
    pub header: String,
    /// Optional longer description
    pub description: Option<String>,
    /// Display state
    pub state: ItemState,
    /// Column names for table data
    pub theader: Option<Vec<String>>,
    /// Collected data
    pub data: ItemData,
    kind: ItemKind,
    source: Option<CommandSource>,
}

impl Item {
    /// Create an empty static item
    #[must_use]
    pub fn new(header: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            header: header.into(),
            description: None,
            state: ItemState::default(),
            theader: None,
            data: ItemData::Empty,
            kind,
            source: None,
        }
    }

    /// With command source
    #[inline]
    #[must_use]
    pub fn with_source(mut self, source: CommandSource) -> Self {
        self.source = Some(source);
        self
    }

    /// With display state
    #[inline]
    #[must_use]
    pub fn with_state(mut self, state: ItemState) -> Self {
        self.state = state;
        self
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// With data
    #[inline]
    #[must_use]
    pub fn with_data(mut self, data: ItemData) -> Self {
        self.data = data;
        self
    }

    /// Presentation kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Command source, `None` for static items
    #[inline]
    #[must_use]
    pub fn source(&self) -> Option<&CommandSource> {
        self.source.as_ref()
    }

    /// Whether the item carries no command
    #[inline]
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.source.is_none()
    }

    /// Store text data
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.data = ItemData::Text(text.into());
    }

    /// Store a header row and data rows
    pub fn set_table(&mut self, theader: Vec<String>, rows: Vec<Vec<Value>>) {
        self.theader = Some(theader);
        self.data = ItemData::Rows(rows);
    }

    /// Store chart data
    pub fn set_chart(&mut self, chart: ChartData) {
        self.data = ItemData::Chart(chart);
    }

    /// Replace the data with an error message
    ///
    /// Table and chart items are downgraded to plain text because their
    /// renderers cannot display a bare message.
    pub fn record_failure(&mut self, message: impl Into<String>) {
        if matches!(self.kind, ItemKind::Table | ItemKind::Chart) {
            self.kind = ItemKind::PlainText;
        }
        self.data = ItemData::Text(message.into());
    }

    /// Whether the header already carries the diff marker
    #[inline]
    #[must_use]
    pub fn has_diff_marker(&self) -> bool {
        self.header.ends_with(DIFF_SUFFIX)
    }

    /// Append the diff marker to the header unless present
    pub fn mark_diff(&mut self) {
        if !self.has_diff_marker() {
            self.header.push_str(DIFF_SUFFIX);
        }
    }
}
