//! Report tree and JSON boundary
//!
//! A [`Report`] holds ordered [`Section`]s, each holding ordered [`Item`]s.
//! Both maps keep insertion order, which is the execution and comparison
//! order for every consumer of the tree.
//!
//! Raw JSON is validated into the typed tree once, in [`Report::from_value`].
//! Shape errors that make the tree meaningless are fatal; a section or item
//! that is not object-shaped is skipped with a warning.

use crate::data::ItemData;
use crate::error::TemplateError;
use crate::item::{CommandSource, Item, ItemKind, ItemState};
use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::warn;

/// Name of the accumulation section
pub const RESULT_SECTION: &str = "result";

/// Ordered group of items
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Section {
    /// Items by name, in template order
    pub reports: IndexMap<String, Item>,
}

impl Section {
    /// Create an empty section
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With an item appended
    #[inline]
    #[must_use]
    pub fn with_item(mut self, name: impl Into<String>, item: Item) -> Self {
        self.reports.insert(name.into(), item);
        self
    }

    /// Item by name
    #[must_use]
    pub fn item(&self, name: &str) -> Option<&Item> {
        self.reports.get(name)
    }

    /// Mutable item by name
    pub fn item_mut(&mut self, name: &str) -> Option<&mut Item> {
        self.reports.get_mut(name)
    }

    /// Number of items
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    /// Whether the section holds no items
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

/// A complete report: metadata plus ordered sections
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Report {
    /// Display header
    pub header: String,
    /// Free-form description (run timestamp, join summary, ...)
    pub description: String,
    /// Identity of the report, also its file stem on disk
    pub report_name: String,
    /// Sections by name, in template order
    pub sections: IndexMap<String, Section>,
}

impl Report {
    /// Create an empty report
    #[must_use]
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            ..Self::default()
        }
    }

    /// With report name
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.report_name = name.into();
        self
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// With a section appended
    #[inline]
    #[must_use]
    pub fn with_section(mut self, name: impl Into<String>, section: Section) -> Self {
        self.sections.insert(name.into(), section);
        self
    }

    /// Section by name
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    /// Mutable section by name
    pub fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections.get_mut(name)
    }

    /// Item by section and item name
    #[must_use]
    pub fn item(&self, section: &str, item: &str) -> Option<&Item> {
        self.sections.get(section)?.reports.get(item)
    }

    /// Mutable item by section and item name
    pub fn item_mut(&mut self, section: &str, item: &str) -> Option<&mut Item> {
        self.sections.get_mut(section)?.reports.get_mut(item)
    }

    /// Total number of items across sections
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.sections.values().map(Section::len).sum()
    }

    /// Parse and validate JSON text
    ///
    /// # Errors
    /// Returns [`TemplateError`] on malformed JSON or an invalid tree.
    pub fn from_json_str(text: &str) -> Result<Self, TemplateError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Validate a raw JSON tree
    ///
    /// # Errors
    /// Returns [`TemplateError`] when the root is not an object, an item has
    /// an unknown `item_type` or `state`, declares more than one command
    /// source, or carries a field of the wrong shape.
    pub fn from_value(value: Value) -> Result<Self, TemplateError> {
        let Value::Object(mut root) = value else {
            return Err(TemplateError::NotAnObject);
        };

        let header = take_string(&mut root, "header", "report")?.unwrap_or_default();
        let description = take_string(&mut root, "description", "report")?.unwrap_or_default();
        let report_name = take_string(&mut root, "report_name", "report")?.unwrap_or_default();

        let mut sections = IndexMap::new();
        match root.remove("sections") {
            Some(Value::Object(raw_sections)) => {
                for (name, raw) in raw_sections {
                    if let Some(section) = parse_section(&name, raw)? {
                        sections.insert(name, section);
                    }
                }
            }
            None | Some(Value::Null) => {
                warn!("Report has no sections");
            }
            Some(other) => {
                warn!(kind = json_kind(&other), "Report 'sections' is not an object, ignoring");
            }
        }

        Ok(Self {
            header,
            description,
            report_name,
            sections,
        })
    }

    /// Encode into the on-disk JSON shape
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut root = Map::new();
        root.insert("header".into(), Value::String(self.header.clone()));
        root.insert("description".into(), Value::String(self.description.clone()));
        root.insert("report_name".into(), Value::String(self.report_name.clone()));

        let mut sections = Map::new();
        for (name, section) in &self.sections {
            let mut reports = Map::new();
            for (item_name, item) in &section.reports {
                reports.insert(item_name.clone(), item_to_value(item));
            }
            let mut raw = Map::new();
            raw.insert("reports".into(), Value::Object(reports));
            sections.insert(name.clone(), Value::Object(raw));
        }
        root.insert("sections".into(), Value::Object(sections));
        Value::Object(root)
    }

    /// Pretty JSON text with 4-space indentation
    ///
    /// # Errors
    /// Propagates serializer failures.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.to_value().serialize(&mut ser)?;
        // serde_json only emits valid UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl Serialize for Report {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Report {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(D::Error::custom)
    }
}

fn parse_section(name: &str, raw: Value) -> Result<Option<Section>, TemplateError> {
    let Value::Object(mut raw) = raw else {
        warn!(section = name, "Section is not an object, skipping");
        return Ok(None);
    };
    let Some(Value::Object(raw_items)) = raw.remove("reports") else {
        warn!(section = name, "Section has no 'reports' object, skipping");
        return Ok(None);
    };

    let mut section = Section::new();
    for (item_name, raw_item) in raw_items {
        let location = format!("{name}.{item_name}");
        let Value::Object(fields) = raw_item else {
            warn!(section = name, item = %item_name, "Item is not an object, skipping");
            continue;
        };
        section.reports.insert(item_name, parse_item(&location, fields)?);
    }
    Ok(Some(section))
}

fn parse_item(location: &str, mut fields: Map<String, Value>) -> Result<Item, TemplateError> {
    let kind = match fields.remove("item_type") {
        Some(Value::String(name)) => {
            ItemKind::from_name(&name).ok_or_else(|| TemplateError::UnknownItemType {
                location: location.to_string(),
                value: name,
            })?
        }
        Some(other) => {
            return Err(TemplateError::UnknownItemType {
                location: location.to_string(),
                value: other.to_string(),
            })
        }
        None => {
            return Err(TemplateError::invalid_field(
                location,
                "item_type",
                "one of plain_text, table, chart, link",
            ))
        }
    };

    let state = match fields.remove("state") {
        Some(Value::String(name)) => {
            ItemState::from_name(&name).ok_or_else(|| TemplateError::UnknownState {
                location: location.to_string(),
                value: name,
            })?
        }
        None | Some(Value::Null) => ItemState::default(),
        Some(other) => {
            return Err(TemplateError::UnknownState {
                location: location.to_string(),
                value: other.to_string(),
            })
        }
    };

    let source = parse_source(location, &mut fields)?;
    let header = take_string(&mut fields, "header", location)?.unwrap_or_default();
    let description = take_string(&mut fields, "description", location)?;

    let theader = match fields.remove("theader") {
        None | Some(Value::Null) => None,
        Some(Value::Array(cols)) => Some(
            cols.into_iter()
                .map(|col| match col {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect(),
        ),
        Some(_) => {
            return Err(TemplateError::invalid_field(
                location,
                "theader",
                "a list of column names",
            ))
        }
    };

    let data = match fields.remove("data") {
        Some(raw) => ItemData::from_value(kind, raw)
            .map_err(|expected| TemplateError::invalid_field(location, "data", expected))?,
        None => ItemData::Empty,
    };

    let mut item = Item::new(header, kind).with_state(state).with_data(data);
    item.description = description;
    item.theader = theader;
    if let Some(source) = source {
        item = item.with_source(source);
    }
    Ok(item)
}

fn parse_source(
    location: &str,
    fields: &mut Map<String, Value>,
) -> Result<Option<CommandSource>, TemplateError> {
    let mut found = Vec::new();
    for marker in CommandSource::MARKERS {
        match fields.remove(marker) {
            None | Some(Value::Null) => {}
            Some(Value::String(reference)) => {
                // An empty callback name marks a static item in stock templates
                if marker == "python_command" && reference.trim().is_empty() {
                    continue;
                }
                found.push((marker, reference));
            }
            Some(_) => {
                return Err(TemplateError::invalid_field(location, marker, "a string"));
            }
        }
    }

    match found.len() {
        0 => Ok(None),
        1 => {
            let (marker, reference) = found.remove(0);
            Ok(CommandSource::from_marker(marker, reference))
        }
        _ => Err(TemplateError::AmbiguousSource {
            location: location.to_string(),
            markers: found.into_iter().map(|(marker, _)| marker).collect(),
        }),
    }
}

fn item_to_value(item: &Item) -> Value {
    let mut map = Map::new();
    map.insert("header".into(), Value::String(item.header.clone()));
    if let Some(description) = &item.description {
        map.insert("description".into(), Value::String(description.clone()));
    }
    map.insert("item_type".into(), Value::String(item.kind().as_str().into()));
    map.insert("state".into(), Value::String(item.state.as_str().into()));
    if let Some(theader) = &item.theader {
        map.insert(
            "theader".into(),
            Value::Array(theader.iter().cloned().map(Value::String).collect()),
        );
    }
    if let Some(source) = item.source() {
        map.insert(
            source.marker().into(),
            Value::String(source.reference().to_string()),
        );
    }
    map.insert("data".into(), item.data.to_value());
    Value::Object(map)
}

fn take_string(
    map: &mut Map<String, Value>,
    field: &'static str,
    location: &str,
) -> Result<Option<String>, TemplateError> {
    match map.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(TemplateError::invalid_field(location, field, "a string")),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
