//! Run-wide values visible to callbacks

use crate::workload::{PgbenchResult, WorkloadConfig};
use indexmap::IndexMap;
use serde_json::Value;

/// Argument names whose values never reach logs or reports
pub const SENSITIVE_ARGS: [&str; 3] = ["pg_password", "pg_user_password", "ssh_key"];

/// Mask sensitive string values with `*` of the same length
#[must_use]
pub fn sanitize_args(args: &IndexMap<String, Value>) -> IndexMap<String, Value> {
    args.iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) if SENSITIVE_ARGS.contains(&key.as_str()) => {
                    Value::String("*".repeat(s.chars().count()))
                }
                other => other.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}

/// Render a JSON value the way it appears in argument listings
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Read-only inputs of a single report run
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    args: IndexMap<String, Value>,
    /// Name stamped into series labels
    pub report_name: String,
    /// Benchmark workload, absent for info collection
    pub workload: Option<WorkloadConfig>,
    /// Parsed benchmark results, one per iteration
    pub pgbench_outputs: Vec<PgbenchResult>,
}

impl RunContext {
    /// Create a context for the named report
    #[must_use]
    pub fn new(report_name: impl Into<String>) -> Self {
        Self {
            report_name: report_name.into(),
            ..Self::default()
        }
    }

    /// With run arguments, sanitized on the way in
    #[must_use]
    pub fn with_args(mut self, args: &IndexMap<String, Value>) -> Self {
        self.args = sanitize_args(args);
        self
    }

    /// With workload configuration
    #[inline]
    #[must_use]
    pub fn with_workload(mut self, workload: WorkloadConfig) -> Self {
        self.workload = Some(workload);
        self
    }

    /// With parsed benchmark results
    #[inline]
    #[must_use]
    pub fn with_outputs(mut self, outputs: Vec<PgbenchResult>) -> Self {
        self.pgbench_outputs = outputs;
        self
    }

    /// Sanitized arguments in the order given
    #[inline]
    #[must_use]
    pub fn args(&self) -> &IndexMap<String, Value> {
        &self.args
    }

    /// "Incoming parameters" block: one `#   key = value` line per non-null argument
    #[must_use]
    pub fn parameters_banner(&self) -> String {
        let mut lines = vec!["Incoming parameters:".to_string()];
        lines.extend(
            self.args
                .iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(key, value)| format!("#   {key} = {}", display_value(value))),
        );
        lines.push(format!("#{}", "-".repeat(35)));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_args() -> IndexMap<String, Value> {
        IndexMap::from([
            ("pg_host".to_string(), json!("localhost")),
            ("pg_password".to_string(), json!("secret")),
            ("pg_port".to_string(), json!(5432)),
            ("ssh_key".to_string(), Value::Null),
        ])
    }

    #[test]
    fn sensitive_values_are_masked() {
        let ctx = RunContext::new("r").with_args(&raw_args());
        assert_eq!(ctx.args()["pg_password"], json!("******"));
        assert_eq!(ctx.args()["pg_host"], json!("localhost"));
        assert_eq!(ctx.args()["ssh_key"], Value::Null);
    }

    #[test]
    fn banner_skips_nulls_and_masks() {
        let banner = RunContext::new("r").with_args(&raw_args()).parameters_banner();
        let lines: Vec<_> = banner.lines().collect();
        assert_eq!(lines[0], "Incoming parameters:");
        assert_eq!(lines[1], "#   pg_host = localhost");
        assert_eq!(lines[2], "#   pg_password = ******");
        assert_eq!(lines[3], "#   pg_port = 5432");
        assert_eq!(lines.len(), 5);
    }
}
