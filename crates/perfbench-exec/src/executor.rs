//! Step executor
//!
//! Walks the ordered steps of a report and fills each item through its
//! collaborator.
//!
//! # Invariants
//!
//! - Steps run one at a time, in extraction order. The next step starts only
//!   after the previous item's data is set.
//! - A failing step is logged with its `(section, item)` path and its message
//!   is stored as the item's data. It never aborts the run.
//! - Only the failure path changes an item kind, and only to `plain_text`.

use crate::callbacks::CallbackRegistry;
use crate::collaborator::{Row, ShellRunner, SqlHandle};
use crate::context::RunContext;
use crate::error::StepError;
use crate::scripts::ScriptStore;
use perfbench_report::{ChartData, CommandKind, CommandSource, Item, ItemKind, Report, StepKey};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Outcome counts of one execution pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutionSummary {
    /// Steps in the report
    pub total: usize,
    /// Steps whose item received data
    pub succeeded: usize,
    /// Steps whose item received an error message
    pub failed: usize,
    /// Steps not run (no SQL handle)
    pub skipped: usize,
    /// Wall time of the pass in milliseconds
    pub elapsed_ms: u64,
}

/// Fills report items from shell, SQL and callback collaborators
#[derive(Debug, Clone)]
pub struct Executor {
    scripts: ScriptStore,
    callbacks: Arc<CallbackRegistry>,
}

impl Executor {
    /// Create an executor over script assets and a callback registry
    #[must_use]
    pub fn new(scripts: ScriptStore, callbacks: CallbackRegistry) -> Self {
        Self {
            scripts,
            callbacks: Arc::new(callbacks),
        }
    }

    /// Script assets used by shell and SQL steps
    #[inline]
    #[must_use]
    pub fn scripts(&self) -> &ScriptStore {
        &self.scripts
    }

    /// Callback registry used by `python_command` steps
    #[inline]
    #[must_use]
    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.callbacks
    }

    /// Run every step of `report` in order
    ///
    /// `sql` is `None` when database collection was not requested; SQL steps
    /// are then skipped and their items left as the template declared them.
    pub async fn execute(
        &self,
        report: &mut Report,
        shell: &dyn ShellRunner,
        sql: Option<&dyn SqlHandle>,
        ctx: &RunContext,
    ) -> ExecutionSummary {
        let start = Instant::now();
        let plan: Vec<(StepKey, CommandSource)> = report
            .steps()
            .iter()
            .map(|step| (step.key(), step.command.clone()))
            .collect();

        let mut summary = ExecutionSummary {
            total: plan.len(),
            ..ExecutionSummary::default()
        };
        let mut current_section: Option<String> = None;

        for (key, command) in plan {
            if current_section.as_deref() != Some(key.section.as_str()) {
                if let Some(done) = current_section.take() {
                    info!(section = %done, "Execution of the section completed");
                }
                debug!(section = %key.section, "Executing section");
                current_section = Some(key.section.clone());
            }

            let Some(item) = report.item_mut(&key.section, &key.item) else {
                continue;
            };
            debug!(
                section = %key.section,
                item = %key.item,
                command_type = %command.kind(),
                command = command.reference(),
                "Executing step"
            );

            let outcome = match &command {
                CommandSource::Shell(file) => self.run_shell(file, item, shell).await,
                CommandSource::Sql(file) => match sql {
                    Some(handle) => self.run_sql(file, item, handle).await,
                    None => {
                        error!(
                            section = %key.section,
                            item = %key.item,
                            "No database connection provided for sql_command. Skipping."
                        );
                        summary.skipped += 1;
                        continue;
                    }
                },
                CommandSource::Python(name) => self.run_callback(name, item, ctx),
            };

            match outcome {
                Ok(()) => summary.succeeded += 1,
                Err(err) => {
                    summary.failed += 1;
                    error!(section = %key.section, item = %key.item, error = %err, "Step failed");
                    if command.kind() == CommandKind::Sql && item.kind() == ItemKind::Table {
                        item.theader = Some(Vec::new());
                    }
                    item.record_failure(err.to_string());
                }
            }
        }
        if let Some(done) = current_section {
            info!(section = %done, "Execution of the section completed");
        }

        summary.elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            "Report execution finished"
        );
        summary
    }

    async fn run_shell(
        &self,
        file: &str,
        item: &mut Item,
        shell: &dyn ShellRunner,
    ) -> Result<(), StepError> {
        let script = self.scripts.shell(file).await?;
        let kind = item.kind();
        let output = shell
            .run(&script)
            .await
            .map_err(|source| StepError::Collaborator { kind, source })?;

        match kind {
            ItemKind::PlainText => item.set_text(output),
            ItemKind::Link => item.set_text(output.trim()),
            ItemKind::Table => {
                let (theader, rows) = shell_table(item.theader.take().unwrap_or_default(), &output)?;
                item.set_table(theader, rows);
            }
            ItemKind::Chart => item.set_chart(parse_chart(Value::String(output))?),
        }
        Ok(())
    }

    async fn run_sql(
        &self,
        file: &str,
        item: &mut Item,
        sql: &dyn SqlHandle,
    ) -> Result<(), StepError> {
        let script = self.scripts.sql(file).await?;
        let kind = item.kind();
        let failed = |source| StepError::Collaborator { kind, source };

        match kind {
            ItemKind::Table => {
                let rows = sql.fetch(&script).await.map_err(failed)?;
                let (theader, rows) = sql_table(rows)?;
                item.set_table(theader, rows);
            }
            ItemKind::PlainText | ItemKind::Link | ItemKind::Chart => {
                let value = sql
                    .fetchval(&script)
                    .await
                    .map_err(failed)?
                    .filter(|v| !v.is_null())
                    .ok_or(StepError::NoData { kind })?;
                match kind {
                    ItemKind::Chart => item.set_chart(parse_chart(value)?),
                    ItemKind::Link => item.set_text(scalar_text(&value).trim()),
                    _ => item.set_text(scalar_text(&value)),
                }
            }
        }
        Ok(())
    }

    fn run_callback(&self, name: &str, item: &mut Item, ctx: &RunContext) -> Result<(), StepError> {
        let callback = self
            .callbacks
            .get(name)
            .ok_or_else(|| StepError::UnknownCallback(name.to_string()))?;
        callback(ctx, item)
    }
}

/// Build a table from shell output holding a JSON list of objects
///
/// Columns are `seed` followed by every key not yet seen, in first-seen
/// order. Non-object entries become one-cell message rows ahead of the data.
fn shell_table(seed: Vec<String>, output: &str) -> Result<(Vec<String>, Vec<Vec<Value>>), StepError> {
    let parsed: Value = serde_json::from_str(output).map_err(StepError::TableJson)?;
    let Value::Array(entries) = parsed else {
        return Err(StepError::NotAList);
    };

    let mut theader = seed;
    let mut rows = Vec::with_capacity(entries.len());
    for entry in &entries {
        match entry {
            Value::Object(obj) => {
                for key in obj.keys() {
                    if !theader.contains(key) {
                        theader.push(key.clone());
                    }
                }
            }
            other => {
                warn!(entry = %other, "Skipping invalid table entry");
                rows.push(vec![Value::String(format!(
                    "Skipping invalid object: {}",
                    scalar_text(other)
                ))]);
            }
        }
    }
    for entry in entries {
        if let Value::Object(mut obj) = entry {
            rows.push(
                theader
                    .iter()
                    .map(|key| obj.remove(key).unwrap_or(Value::Null))
                    .collect(),
            );
        }
    }
    Ok((theader, rows))
}

fn sql_table(rows: Vec<Row>) -> Result<(Vec<String>, Vec<Vec<Value>>), StepError> {
    let Some(first) = rows.first() else {
        return Err(StepError::NoRows);
    };
    let theader = first.keys().cloned().collect();
    let rows = rows
        .into_iter()
        .map(|row| row.into_values().collect())
        .collect();
    Ok((theader, rows))
}

fn parse_chart(value: Value) -> Result<ChartData, StepError> {
    let value = match value {
        Value::String(text) => {
            serde_json::from_str(&text).map_err(|e| StepError::ChartJson(e.to_string()))?
        }
        other => other,
    };
    if !value.is_object() {
        return Err(StepError::ChartJson("expected a JSON object".into()));
    }
    serde_json::from_value(value).map_err(|e| StepError::ChartJson(e.to_string()))
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
