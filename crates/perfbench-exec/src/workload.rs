//! pgbench workload helpers
//!
//! Placeholder substitution for the init and workload commands, parsing of
//! pgbench's textual summary, and the sequential iteration loop. Database
//! restarts between iterations belong to the transport backend, not here.

use crate::collaborator::ShellRunner;
use crate::error::CollaboratorError;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{info, warn};

/// Built-in pgbench workload
pub const BENCHMARK_DEFAULT: &str = "default";
/// User-supplied SQL workload files
pub const BENCHMARK_CUSTOM: &str = "custom";

/// Benchmark workload parameters
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    /// `default` or `custom`
    pub benchmark_type: String,
    /// Schema initialization command
    pub init_command: String,
    /// Benchmark command, run once per iteration
    pub workload_command: String,
    /// Directory of custom workload files
    pub workload_path: Option<PathBuf>,
    /// Iterated parameter, e.g. `pgbench_clients`
    pub iter_name: String,
    /// Values of the iterated parameter
    pub iter_values: Vec<i64>,
    /// Additional `ARG_<KEY>` substitutions (binary paths, data dir, ...)
    pub params: IndexMap<String, String>,
}

impl WorkloadConfig {
    /// Placeholder for the iterated parameter
    #[must_use]
    pub fn iter_placeholder(&self) -> String {
        placeholder(&self.iter_name)
    }

    /// Workload command per iteration, only the iterated parameter substituted
    #[must_use]
    pub fn iteration_commands(&self) -> Vec<String> {
        if self.iter_name.is_empty() {
            return Vec::new();
        }
        let marker = self.iter_placeholder();
        self.iter_values
            .iter()
            .map(|value| self.workload_command.replace(&marker, &value.to_string()))
            .collect()
    }

    fn substitutions(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        pairs.push(("benchmark_type".into(), self.benchmark_type.clone()));
        if let Some(path) = &self.workload_path {
            pairs.push(("workload_path".into(), path.display().to_string()));
        }
        pairs
    }
}

/// Commands of one benchmark iteration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadIteration {
    /// Value of the iterated parameter
    pub value: i64,
    /// Filled schema initialization command
    pub init_command: String,
    /// Filled benchmark command
    pub workload_command: String,
}

/// `ARG_<KEY>` for a parameter name
#[must_use]
pub fn placeholder(key: &str) -> String {
    format!("ARG_{}", key.to_uppercase())
}

/// Build the filled command pair for every iteration value
///
/// Substitution order is database parameters, then workload parameters, then
/// the iterated parameter. An empty iteration list yields no iterations.
#[must_use]
pub fn load_iterations(
    db_params: &IndexMap<String, String>,
    workload: &WorkloadConfig,
) -> Vec<LoadIteration> {
    if workload.iter_name.is_empty() || workload.iter_values.is_empty() {
        return Vec::new();
    }

    let mut fixed: Vec<(String, String)> = db_params
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    fixed.extend(workload.substitutions());

    workload
        .iter_values
        .iter()
        .map(|&value| {
            let mut init_command = workload.init_command.clone();
            let mut workload_command = workload.workload_command.clone();
            let iter = (workload.iter_name.clone(), value.to_string());
            for (key, val) in fixed.iter().chain(std::iter::once(&iter)) {
                let marker = placeholder(key);
                init_command = init_command.replace(&marker, val);
                workload_command = workload_command.replace(&marker, val);
            }
            LoadIteration {
                value,
                init_command,
                workload_command,
            }
        })
        .collect()
}

/// Figures extracted from one pgbench run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PgbenchResult {
    /// Number of clients
    pub clients: Option<i64>,
    /// Duration in seconds
    pub duration: Option<i64>,
    /// Transactions actually processed
    pub transactions: Option<i64>,
    /// Average latency, ms
    pub latency_avg: Option<f64>,
    /// Initial connection time, ms
    pub initial_connection_time: Option<f64>,
    /// Transactions per second
    pub tps: Option<f64>,
}

impl PgbenchResult {
    /// Column names of [`Self::to_row`]
    pub const COLUMNS: [&'static str; 6] = [
        "clients",
        "duration",
        "number of transactions actually processed",
        "latency average",
        "initial connection time",
        "tps",
    ];

    /// Table row, `null` for missing figures
    #[must_use]
    pub fn to_row(&self) -> Vec<Value> {
        vec![
            self.clients.map_or(Value::Null, Value::from),
            self.duration.map_or(Value::Null, Value::from),
            self.transactions.map_or(Value::Null, Value::from),
            self.latency_avg.map_or(Value::Null, Value::from),
            self.initial_connection_time.map_or(Value::Null, Value::from),
            self.tps.map_or(Value::Null, Value::from),
        ]
    }
}

static CLIENTS: Lazy<Regex> = Lazy::new(|| compile(r"number\sof\sclients:\s(\d+)"));
static DURATION: Lazy<Regex> = Lazy::new(|| compile(r"duration:\s(\d+)"));
static TRANSACTIONS: Lazy<Regex> = Lazy::new(|| {
    compile(r"number\sof\stransactions\sactually\sprocessed:\s((\d+)/\d+|\d+)")
});
static LATENCY: Lazy<Regex> =
    Lazy::new(|| compile(r"latency\saverage\s=\s\d+((.|,)\d+)?\sms"));
static INIT_CONN: Lazy<Regex> =
    Lazy::new(|| compile(r"initial\sconnection\stime\s=\s\d+((.|,)\d+)?\sms"));
static TPS: Lazy<Regex> = Lazy::new(|| compile(r"tps\s=\s\d+((.|,)\d+)?"));
static NUMBER: Lazy<Regex> = Lazy::new(|| compile(r"\d+([.,]\d+)?"));

pub(crate) fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern")
}

fn first_number(pattern: &Regex, text: &str) -> Option<String> {
    let matched = pattern.find(text)?;
    let number = NUMBER.find(matched.as_str())?;
    Some(number.as_str().replace(',', "."))
}

fn first_int(pattern: &Regex, text: &str) -> Option<i64> {
    first_number(pattern, text)?.parse().ok()
}

fn first_float(pattern: &Regex, text: &str) -> Option<f64> {
    first_number(pattern, text)?.parse().ok()
}

/// Extract the summary figures from pgbench output
#[must_use]
pub fn parse_pgbench_output(text: &str) -> PgbenchResult {
    PgbenchResult {
        clients: first_int(&CLIENTS, text),
        duration: first_int(&DURATION, text),
        transactions: first_int(&TRANSACTIONS, text),
        latency_avg: first_float(&LATENCY, text),
        initial_connection_time: first_float(&INIT_CONN, text),
        tps: first_float(&TPS, text),
    }
}

/// Run every iteration through the shell, init command first
///
/// # Errors
/// Stops at the first collaborator failure.
pub async fn run_iterations(
    shell: &dyn ShellRunner,
    iterations: &[LoadIteration],
) -> Result<Vec<PgbenchResult>, CollaboratorError> {
    let mut results = Vec::with_capacity(iterations.len());
    for iteration in iterations {
        info!(value = iteration.value, "Initial command executing: {}", iteration.init_command);
        let init_output = shell.run(&iteration.init_command).await?;
        info!("Initial command result:\n{init_output}");

        let output = shell.run(&iteration.workload_command).await?;
        info!("Performance command result:\n{output}");
        if output.trim().is_empty() {
            warn!(value = iteration.value, "Workload command returned an empty result");
        }
        results.push(parse_pgbench_output(&output));
    }
    Ok(results)
}
