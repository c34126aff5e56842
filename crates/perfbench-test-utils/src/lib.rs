//! Testing utilities for the perfbench workspace
//!
//! Report builders, ready-made benchmark reports, and scripted collaborators.

#![allow(missing_docs)]

use async_trait::async_trait;
use indexmap::IndexMap;
use perfbench_exec::{CollaboratorError, Row, ShellRunner, SqlHandle};
use perfbench_report::{
    ChartData, ChartSeries, CommandSource, Item, ItemData, ItemKind, ItemState, Report, Section,
};
use serde_json::{json, Value};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct ItemBuilder {
    item: Item,
}

impl ItemBuilder {
    pub fn new(header: &str, kind: ItemKind) -> Self {
        Self {
            item: Item::new(header, kind),
        }
    }

    pub fn plain_text(header: &str) -> Self {
        Self::new(header, ItemKind::PlainText)
    }

    pub fn table(header: &str) -> Self {
        Self::new(header, ItemKind::Table)
    }

    pub fn chart(header: &str) -> Self {
        Self::new(header, ItemKind::Chart)
    }

    pub fn link(header: &str) -> Self {
        Self::new(header, ItemKind::Link)
    }

    pub fn shell(mut self, file: &str) -> Self {
        self.item = self.item.with_source(CommandSource::Shell(file.into()));
        self
    }

    pub fn sql(mut self, file: &str) -> Self {
        self.item = self.item.with_source(CommandSource::Sql(file.into()));
        self
    }

    pub fn python(mut self, name: &str) -> Self {
        self.item = self.item.with_source(CommandSource::Python(name.into()));
        self
    }

    pub fn state(mut self, state: ItemState) -> Self {
        self.item.state = state;
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.item.set_text(text);
        self
    }

    pub fn rows(mut self, theader: &[&str], rows: Vec<Vec<Value>>) -> Self {
        self.item
            .set_table(theader.iter().map(ToString::to_string).collect(), rows);
        self
    }

    pub fn series(mut self, name: &str, points: &[(i64, f64)]) -> Self {
        let data = points.iter().map(|(x, y)| json!([x, y])).collect();
        let mut chart = self.item.data.as_chart().cloned().unwrap_or_default();
        chart.series.push(ChartSeries::new(name, data));
        self.item.set_chart(chart);
        self
    }

    pub fn data(mut self, data: ItemData) -> Self {
        self.item.data = data;
        self
    }

    pub fn build(self) -> Item {
        self.item
    }
}

#[derive(Debug, Clone)]
pub struct ReportBuilder {
    report: Report,
}

impl ReportBuilder {
    pub fn new(report_name: &str) -> Self {
        Self {
            report: Report::new("PostgreSQL database benchmark report").with_name(report_name),
        }
    }

    pub fn header(mut self, header: &str) -> Self {
        self.report.header = header.into();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.report.description = description.into();
        self
    }

    /// Append an item, creating the section on first use
    pub fn item(mut self, section: &str, name: &str, item: ItemBuilder) -> Self {
        self.report
            .sections
            .entry(section.to_string())
            .or_insert_with(Section::new)
            .reports
            .insert(name.to_string(), item.build());
        self
    }

    pub fn empty_section(mut self, section: &str) -> Self {
        self.report
            .sections
            .entry(section.to_string())
            .or_insert_with(Section::new);
        self
    }

    pub fn build(self) -> Report {
        self.report
    }
}

/// Filled benchmark report: a `db` section plus `result` chart and table
pub fn benchmark_report(name: &str, version_major: &str, points: &[(i64, f64)]) -> Report {
    let rows = points
        .iter()
        .map(|(clients, tps)| vec![json!(clients), json!(10), json!(1000), json!(1.5), json!(2.0), json!(tps)])
        .collect();
    ReportBuilder::new(name)
        .item(
            "system",
            "kernel",
            ItemBuilder::plain_text("Kernel").shell("kernel.sh").text("Linux 6.1"),
        )
        .item(
            "db",
            "version_major",
            ItemBuilder::plain_text("Major version")
                .sql("version_major.sql")
                .text(version_major),
        )
        .item(
            "db",
            "settings",
            ItemBuilder::table("Settings").sql("settings.sql").rows(
                &["name", "setting"],
                vec![vec![json!("shared_buffers"), json!("128MB")]],
            ),
        )
        .item(
            "result",
            "chart",
            ItemBuilder::chart("TPS")
                .python("chart_tps")
                .series(&format!("{name},tps"), points),
        )
        .item(
            "result",
            "pgbench_outputs",
            ItemBuilder::table("pgbench results")
                .python("benchmark_result")
                .rows(&["clients", "duration", "transactions", "latency", "conn", "tps"], rows),
        )
        .build()
}

/// Minimal chart with presentation options, as shipped in templates
pub fn chart_template() -> ChartData {
    let mut chart = ChartData::default();
    chart.set_option("chart", json!({ "type": "line", "height": 350 }));
    chart
}

/// Shell answering by command substring, recording every call
#[derive(Debug, Default)]
pub struct FakeShell {
    responses: Vec<(String, String)>,
    calls: Mutex<Vec<String>>,
}

impl FakeShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `output` to any command containing `needle`
    pub fn respond(mut self, needle: &str, output: &str) -> Self {
        self.responses.push((needle.into(), output.into()));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ShellRunner for FakeShell {
    async fn run(&self, command: &str) -> Result<String, CollaboratorError> {
        self.calls.lock().unwrap().push(command.to_string());
        self.responses
            .iter()
            .find(|(needle, _)| command.contains(needle.as_str()))
            .map(|(_, output)| output.clone())
            .ok_or_else(|| CollaboratorError::Command(format!("no scripted response for: {command}")))
    }
}

/// Shell whose every call fails
#[derive(Debug, Default)]
pub struct FailingShell;

#[async_trait]
impl ShellRunner for FailingShell {
    async fn run(&self, _command: &str) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::Connection("connection reset by peer".into()))
    }
}

/// SQL handle answering by query substring
#[derive(Debug, Default)]
pub struct FakeSql {
    scalars: Vec<(String, Option<Value>)>,
    tables: Vec<(String, Vec<Row>)>,
}

impl FakeSql {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scalar(mut self, needle: &str, value: Option<Value>) -> Self {
        self.scalars.push((needle.into(), value));
        self
    }

    pub fn rows(mut self, needle: &str, rows: Vec<Row>) -> Self {
        self.tables.push((needle.into(), rows));
        self
    }
}

/// Build a row from `(column, value)` pairs
pub fn row(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect::<IndexMap<_, _>>()
}

#[async_trait]
impl SqlHandle for FakeSql {
    async fn fetchval(&self, sql: &str) -> Result<Option<Value>, CollaboratorError> {
        self.scalars
            .iter()
            .find(|(needle, _)| sql.contains(needle.as_str()))
            .map(|(_, value)| value.clone())
            .ok_or_else(|| CollaboratorError::Query(format!("unexpected query: {sql}")))
    }

    async fn fetch(&self, sql: &str) -> Result<Vec<Row>, CollaboratorError> {
        self.tables
            .iter()
            .find(|(needle, _)| sql.contains(needle.as_str()))
            .map(|(_, rows)| rows.clone())
            .ok_or_else(|| CollaboratorError::Query(format!("unexpected query: {sql}")))
    }
}
