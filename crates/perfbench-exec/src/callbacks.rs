//! Named callbacks for `python_command` items
//!
//! Templates name a callback by string; the executor resolves it through a
//! [`CallbackRegistry`] built once and passed in. There is no global lookup.

use crate::context::{display_value, RunContext};
use crate::error::StepError;
use crate::workload::{compile, PgbenchResult, BENCHMARK_CUSTOM, BENCHMARK_DEFAULT};
use once_cell::sync::Lazy;
use perfbench_report::{ChartSeries, Item};
use regex::Regex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Callback filling an item from the run context
pub type Callback = Arc<dyn Fn(&RunContext, &mut Item) -> Result<(), StepError> + Send + Sync>;

/// Registry of callbacks by exact name
#[derive(Clone, Default)]
pub struct CallbackRegistry {
    callbacks: HashMap<String, Callback>,
}

impl Debug for CallbackRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut names = self.names();
        names.sort_unstable();
        f.debug_struct("CallbackRegistry")
            .field("callbacks", &names)
            .finish()
    }
}

impl CallbackRegistry {
    /// Create an empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in callbacks
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("args", args);
        registry.register("pgbench_options_table", pgbench_options_table);
        registry.register("workload_tables", workload_tables);
        registry.register("workload", workload);
        registry.register("benchmark_result", benchmark_result);
        registry.register("chart_tps", chart_tps);
        registry
    }

    /// Register or replace a callback
    pub fn register<F>(&mut self, name: &str, callback: F)
    where
        F: Fn(&RunContext, &mut Item) -> Result<(), StepError> + Send + Sync + 'static,
    {
        self.callbacks.insert(name.to_string(), Arc::new(callback));
    }

    /// Look up a callback
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Callback> {
        self.callbacks.get(name)
    }

    /// Check if a callback exists
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.callbacks.contains_key(name)
    }

    /// Registered names, unordered
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.callbacks.keys().map(String::as_str).collect()
    }

    /// Number of registered callbacks
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

fn args(ctx: &RunContext, item: &mut Item) -> Result<(), StepError> {
    if ctx.args().is_empty() {
        return Err(StepError::callback("No arguments in the run context"));
    }
    let rows = ctx
        .args()
        .iter()
        .map(|(key, value)| vec![json!(key), json!(display_value(value))])
        .collect();
    item.set_table(vec!["arg".into(), "value".into()], rows);
    Ok(())
}

fn pgbench_options_table(ctx: &RunContext, item: &mut Item) -> Result<(), StepError> {
    let commands = ctx
        .workload
        .as_ref()
        .map(crate::workload::WorkloadConfig::iteration_commands)
        .unwrap_or_default();
    let rows = commands
        .into_iter()
        .enumerate()
        .map(|(idx, cmd)| vec![json!(idx), json!(cmd)])
        .collect();
    item.set_table(
        vec!["iteration number".into(), "pgbench_options".into()],
        rows,
    );
    Ok(())
}

#[derive(Clone, Copy)]
enum Phase {
    Init,
    Workload,
}

static SQL_FILE: Lazy<Regex> = Lazy::new(|| compile(r"(?:(?:-f|--file=)\s*)?(\S+\.sql)"));

fn describe_workload(ctx: &RunContext, item: &mut Item, phase: Phase) -> Result<(), StepError> {
    let Some(workload) = &ctx.workload else {
        return Err(StepError::callback("No workload configuration in the run context"));
    };
    let command = match phase {
        Phase::Init => &workload.init_command,
        Phase::Workload => &workload.workload_command,
    };

    match workload.benchmark_type.as_str() {
        BENCHMARK_DEFAULT => item.set_text(command.clone()),
        BENCHMARK_CUSTOM => {
            let workload_path = workload
                .workload_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            let command = command.replace("ARG_WORKLOAD_PATH", &workload_path);
            let mut text = String::new();
            for file in SQL_FILE.captures_iter(&command).filter_map(|c| c.get(1)) {
                let name = file.as_str();
                match std::fs::read_to_string(name) {
                    Ok(content) => text.push_str(&format!("{name} :\n{content}\n\n")),
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                        text.push_str(&format!("File not found: {name}\n\n"));
                    }
                    Err(err) => text.push_str(&format!("Error reading file {name}: {err}\n\n")),
                }
            }
            item.set_text(text);
        }
        other => {
            return Err(StepError::callback(format!(
                "Unknown or missing benchmark_type: {other}"
            )))
        }
    }
    Ok(())
}

fn workload_tables(ctx: &RunContext, item: &mut Item) -> Result<(), StepError> {
    describe_workload(ctx, item, Phase::Init)
}

fn workload(ctx: &RunContext, item: &mut Item) -> Result<(), StepError> {
    describe_workload(ctx, item, Phase::Workload)
}

fn benchmark_result(ctx: &RunContext, item: &mut Item) -> Result<(), StepError> {
    let rows = ctx.pgbench_outputs.iter().map(PgbenchResult::to_row).collect();
    item.set_table(
        PgbenchResult::COLUMNS.iter().map(ToString::to_string).collect(),
        rows,
    );
    Ok(())
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn chart_tps(ctx: &RunContext, item: &mut Item) -> Result<(), StepError> {
    let Some(workload) = &ctx.workload else {
        return Err(StepError::callback("Missing workload configuration"));
    };
    if workload.iter_values.len() != ctx.pgbench_outputs.len() {
        return Err(StepError::callback(
            "Mismatched length between iteration values and pgbench outputs",
        ));
    }

    let param = if workload.iter_name.is_empty() {
        "iteration"
    } else {
        workload.iter_name.as_str()
    };
    let points = workload
        .iter_values
        .iter()
        .zip(&ctx.pgbench_outputs)
        .filter_map(|(x, result)| result.tps.map(|tps| json!([x, round1(tps)])))
        .collect::<Vec<Value>>();

    let mut chart = item.data.as_chart().cloned().unwrap_or_default();
    chart.set_option("title", json!({ "text": format!("tps({param})") }));
    chart.set_option("xaxis", json!({ "title": { "text": param } }));
    chart.series = vec![ChartSeries::new(format!("{},tps", ctx.report_name), points)];
    item.set_chart(chart);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workload::WorkloadConfig;
    use indexmap::IndexMap;
    use perfbench_report::{ChartData, ItemKind};
    use pretty_assertions::assert_eq;

    fn bench_context() -> RunContext {
        RunContext::new("R1")
            .with_workload(WorkloadConfig {
                benchmark_type: BENCHMARK_DEFAULT.into(),
                init_command: "pgbench -i".into(),
                workload_command: "pgbench -c ARG_PGBENCH_CLIENTS".into(),
                iter_name: "pgbench_clients".into(),
                iter_values: vec![1, 10],
                ..WorkloadConfig::default()
            })
            .with_outputs(vec![
                PgbenchResult {
                    tps: Some(100.04),
                    ..PgbenchResult::default()
                },
                PgbenchResult {
                    tps: Some(250.27),
                    ..PgbenchResult::default()
                },
            ])
    }

    fn call(name: &str, ctx: &RunContext, item: &mut Item) -> Result<(), StepError> {
        let registry = CallbackRegistry::with_defaults();
        let callback = registry.get(name).unwrap();
        callback(ctx, item)
    }

    #[test]
    fn defaults_are_registered() {
        let registry = CallbackRegistry::with_defaults();
        for name in [
            "args",
            "pgbench_options_table",
            "workload_tables",
            "workload",
            "benchmark_result",
            "chart_tps",
        ] {
            assert!(registry.contains(name), "missing {name}");
        }
        assert_eq!(registry.len(), 6);
    }

    #[test]
    fn args_table_lists_sanitized_arguments() {
        let args = IndexMap::from([
            ("mode".to_string(), json!("benchmark")),
            ("ssh_key".to_string(), json!("abc")),
        ]);
        let ctx = RunContext::new("R1").with_args(&args);
        let mut item = Item::new("Arguments", ItemKind::Table);
        call("args", &ctx, &mut item).unwrap();
        assert_eq!(item.theader, Some(vec!["arg".into(), "value".into()]));
        assert_eq!(
            item.data.as_rows().unwrap(),
            &[vec![json!("mode"), json!("benchmark")], vec![json!("ssh_key"), json!("***")]]
        );
    }

    #[test]
    fn args_empty_is_error() {
        let mut item = Item::new("Arguments", ItemKind::Table);
        assert!(call("args", &RunContext::new("R1"), &mut item).is_err());
    }

    #[test]
    fn options_table_one_row_per_iteration() {
        let mut item = Item::new("Options", ItemKind::Table);
        call("pgbench_options_table", &bench_context(), &mut item).unwrap();
        assert_eq!(
            item.data.as_rows().unwrap(),
            &[
                vec![json!(0), json!("pgbench -c 1")],
                vec![json!(1), json!("pgbench -c 10")]
            ]
        );
    }

    #[test]
    fn default_workload_shows_commands() {
        let ctx = bench_context();
        let mut init = Item::new("Init", ItemKind::PlainText);
        call("workload_tables", &ctx, &mut init).unwrap();
        assert_eq!(init.data.as_text(), Some("pgbench -i"));

        let mut work = Item::new("Workload", ItemKind::PlainText);
        call("workload", &ctx, &mut work).unwrap();
        assert_eq!(work.data.as_text(), Some("pgbench -c ARG_PGBENCH_CLIENTS"));
    }

    #[test]
    fn custom_workload_inlines_sql_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("select.sql"), "SELECT 1;").unwrap();
        let ctx = RunContext::new("R1").with_workload(WorkloadConfig {
            benchmark_type: BENCHMARK_CUSTOM.into(),
            workload_command: "pgbench -f ARG_WORKLOAD_PATH/select.sql -f ARG_WORKLOAD_PATH/gone.sql".into(),
            workload_path: Some(dir.path().to_path_buf()),
            ..WorkloadConfig::default()
        });
        let mut item = Item::new("Workload", ItemKind::PlainText);
        call("workload", &ctx, &mut item).unwrap();

        let text = item.data.as_text().unwrap();
        assert!(text.contains("select.sql :\nSELECT 1;"));
        assert!(text.contains("File not found:"));
        assert!(text.contains("gone.sql"));
    }

    #[test]
    fn unknown_benchmark_type_is_error() {
        let ctx = RunContext::new("R1").with_workload(WorkloadConfig {
            benchmark_type: "tpcc".into(),
            ..WorkloadConfig::default()
        });
        let mut item = Item::new("Workload", ItemKind::PlainText);
        let err = call("workload", &ctx, &mut item).unwrap_err();
        assert_eq!(err.to_string(), "Unknown or missing benchmark_type: tpcc");
    }

    #[test]
    fn benchmark_result_has_six_columns() {
        let mut item = Item::new("Result", ItemKind::Table);
        call("benchmark_result", &bench_context(), &mut item).unwrap();
        assert_eq!(item.theader.as_ref().map(Vec::len), Some(6));
        assert_eq!(item.data.as_rows().map(<[_]>::len), Some(2));
    }

    #[test]
    fn chart_tps_builds_single_named_series() {
        let mut item = Item::new("TPS", ItemKind::Chart);
        call("chart_tps", &bench_context(), &mut item).unwrap();

        let chart = item.data.as_chart().unwrap();
        assert_eq!(chart.series.len(), 1);
        assert_eq!(chart.series[0].name, "R1,tps");
        assert_eq!(chart.series[0].data, vec![json!([1, 100.0]), json!([10, 250.3])]);
        assert_eq!(chart.options["title"]["text"], "tps(pgbench_clients)");
    }

    #[test]
    fn chart_tps_keeps_template_options() {
        let mut template = ChartData::default();
        template.set_option("chart", json!({"type": "line"}));
        let mut item =
            Item::new("TPS", ItemKind::Chart).with_data(perfbench_report::ItemData::Chart(template));
        call("chart_tps", &bench_context(), &mut item).unwrap();
        assert_eq!(item.data.as_chart().unwrap().options["chart"]["type"], "line");
    }

    #[test]
    fn chart_tps_length_mismatch_is_error() {
        let ctx = bench_context().with_outputs(Vec::new());
        let mut item = Item::new("TPS", ItemKind::Chart);
        assert!(call("chart_tps", &ctx, &mut item).is_err());
    }
}
