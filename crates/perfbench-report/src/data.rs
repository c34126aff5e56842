//! Item data payloads
//!
//! The `data` slot of an item changes shape with the item kind and with the
//! life of the report: a template ships it empty, the executor fills it with
//! text, rows or a chart, and the merge engine may rewrite it into a list of
//! per-report values.

use crate::item::ItemKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Contents of an item's `data` slot
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ItemData {
    /// Nothing collected yet (`null` on disk)
    #[default]
    Empty,
    /// Plain text, a link path, or an error message
    Text(String),
    /// Table rows, positionally aligned with the item's `theader`
    Rows(Vec<Vec<Value>>),
    /// Chart series plus presentation options
    Chart(ChartData),
    /// Values attributed to individual reports, `[[report_name, value], ...]`
    Attributed(Vec<Attributed>),
}

/// One `[report_name, value]` entry of an attributed list
#[derive(Debug, Clone, PartialEq)]
pub struct Attributed {
    /// Name of the report the value came from
    pub report: String,
    /// The value itself
    pub value: ItemData,
}

impl Attributed {
    /// Create a new attributed value
    #[inline]
    #[must_use]
    pub fn new(report: impl Into<String>, value: ItemData) -> Self {
        Self {
            report: report.into(),
            value,
        }
    }
}

/// Chart payload: a list of named series plus opaque presentation keys
///
/// Presentation keys (`chart`, `title`, `xaxis`, ...) are kept verbatim so the
/// HTML view receives exactly what the template declared.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartData {
    /// Data series, one per report after a merge
    #[serde(default)]
    pub series: Vec<ChartSeries>,
    /// Every other key of the chart object
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl ChartData {
    /// Set a top-level presentation key
    pub fn set_option(&mut self, key: impl Into<String>, value: Value) {
        self.options.insert(key.into(), value);
    }
}

/// A single named data series
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartSeries {
    /// Series label
    #[serde(default)]
    pub name: String,
    /// Data points, typically `[x, y]` pairs
    #[serde(default)]
    pub data: Vec<Value>,
}

impl ChartSeries {
    /// Create a named series
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, data: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

impl ItemData {
    /// Text payload, if any
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Table rows, if any
    #[must_use]
    pub fn as_rows(&self) -> Option<&[Vec<Value>]> {
        match self {
            Self::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    /// Chart payload, if any
    #[must_use]
    pub fn as_chart(&self) -> Option<&ChartData> {
        match self {
            Self::Chart(chart) => Some(chart),
            _ => None,
        }
    }

    /// Mutable chart payload, if any
    pub fn as_chart_mut(&mut self) -> Option<&mut ChartData> {
        match self {
            Self::Chart(chart) => Some(chart),
            _ => None,
        }
    }

    /// Attributed list, if any
    #[must_use]
    pub fn as_attributed(&self) -> Option<&[Attributed]> {
        match self {
            Self::Attributed(list) => Some(list),
            _ => None,
        }
    }

    /// Whether nothing has been collected
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Encode into the on-disk JSON shape
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Empty => Value::Null,
            Self::Text(text) => Value::String(text.clone()),
            Self::Rows(rows) => Value::Array(
                rows.iter()
                    .map(|row| Value::Array(row.clone()))
                    .collect(),
            ),
            Self::Chart(chart) => chart_to_value(chart),
            Self::Attributed(list) => Value::Array(
                list.iter()
                    .map(|entry| {
                        Value::Array(vec![
                            Value::String(entry.report.clone()),
                            entry.value.to_value(),
                        ])
                    })
                    .collect(),
            ),
        }
    }

    /// Decode the on-disk JSON shape for an item of the given kind
    ///
    /// # Errors
    /// Returns a short description of the expected shape when the value
    /// cannot hold data for `kind`.
    pub fn from_value(kind: ItemKind, value: Value) -> Result<Self, &'static str> {
        match value {
            Value::Null => Ok(Self::Empty),
            Value::String(text) => Ok(Self::Text(text)),
            Value::Bool(_) | Value::Number(_) => Ok(Self::Text(value.to_string())),
            Value::Array(items) => Ok(decode_array(kind, items)),
            Value::Object(map) => match kind {
                ItemKind::Chart => serde_json::from_value(Value::Object(map))
                    .map(Self::Chart)
                    .map_err(|_| "a chart object with a 'series' list"),
                _ => Err("a string, a list, or null"),
            },
        }
    }
}

fn chart_to_value(chart: &ChartData) -> Value {
    let mut map = Map::new();
    let series = chart
        .series
        .iter()
        .map(|s| {
            let mut entry = Map::new();
            entry.insert("name".into(), Value::String(s.name.clone()));
            entry.insert("data".into(), Value::Array(s.data.clone()));
            Value::Object(entry)
        })
        .collect();
    map.insert("series".into(), Value::Array(series));
    for (key, value) in &chart.options {
        map.insert(key.clone(), value.clone());
    }
    Value::Object(map)
}

fn decode_array(kind: ItemKind, items: Vec<Value>) -> ItemData {
    if items.is_empty() {
        return match kind {
            ItemKind::Link => ItemData::Attributed(Vec::new()),
            _ => ItemData::Rows(Vec::new()),
        };
    }

    // Table rows are often two-cell string pairs; a merged table attributes
    // whole row lists, or the text of a failed step, and holds at least one
    // row list.
    let attributed = match kind {
        ItemKind::Table => {
            items.iter().all(|v| {
                is_attribution_pair(v) && matches!(v[1], Value::Array(_) | Value::String(_) | Value::Null)
            }) && items.iter().any(|v| v[1].is_array())
        }
        _ => items.iter().all(is_attribution_pair),
    };
    if attributed {
        let list = items
            .into_iter()
            .filter_map(|pair| match pair {
                Value::Array(mut pair) => {
                    let value = pair.pop()?;
                    let report = pair.pop()?.as_str()?.to_string();
                    let value = ItemData::from_value(kind, value)
                        .unwrap_or_else(|_| ItemData::Text(String::new()));
                    Some(Attributed::new(report, value))
                }
                _ => None,
            })
            .collect();
        return ItemData::Attributed(list);
    }

    ItemData::Rows(
        items
            .into_iter()
            .map(|row| match row {
                Value::Array(cells) => cells,
                other => vec![other],
            })
            .collect(),
    )
}

fn is_attribution_pair(value: &Value) -> bool {
    matches!(value, Value::Array(pair) if pair.len() == 2 && pair[0].is_string())
}
