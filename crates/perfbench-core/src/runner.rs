//! Report run flow
//!
//! Loads the template for a work mode, names and stamps the report, and
//! hands it to the executor. Connections are owned by the caller.

use crate::config::{PerfbenchConfig, WorkMode};
use crate::error::{PerfbenchError, Result};
use chrono::{Local, NaiveDateTime};
use perfbench_exec::{CallbackRegistry, Executor, RunContext, ScriptStore, ShellRunner, SqlHandle};
use perfbench_report::{Item, ItemData, ItemKind, ItemState, Report, Section, RESULT_SECTION};
use std::path::{Path, PathBuf};
use tracing::info;

/// Timestamp written into a fresh report's description
pub const DESCRIPTION_TIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Timestamp suffix of generated report names
pub const NAME_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Item name of the database log archive link
pub const LOGS_ITEM: &str = "logs";

/// Default name of a report: `<mode>-report_<timestamp>`
#[must_use]
pub fn default_report_name(mode: WorkMode, at: NaiveDateTime) -> String {
    format!("{mode}-report_{}", at.format(NAME_TIME_FORMAT))
}

/// Add the database log archive link to the `result` section
pub fn attach_log_archive(report: &mut Report, archive: &Path) {
    let item = Item::new("database logs", ItemKind::Link)
        .with_description("Local path to the database log archive")
        .with_state(ItemState::Collapsed)
        .with_data(ItemData::Text(archive.display().to_string()));
    info!(path = %archive.display(), "The log archive has been collected");
    report
        .sections
        .entry(RESULT_SECTION.to_string())
        .or_insert_with(Section::new)
        .reports
        .insert(LOGS_ITEM.to_string(), item);
}

/// Produces filled reports for a work mode
#[derive(Debug, Clone)]
pub struct ReportRunner {
    templates_dir: PathBuf,
    executor: Executor,
}

impl ReportRunner {
    /// Create a runner reading templates from `templates_dir`
    #[must_use]
    pub fn new(templates_dir: impl Into<PathBuf>, executor: Executor) -> Self {
        Self {
            templates_dir: templates_dir.into(),
            executor,
        }
    }

    /// Runner wired from configuration with the default callbacks
    #[must_use]
    pub fn from_config(config: &PerfbenchConfig) -> Self {
        let scripts = ScriptStore::new(
            &config.paths.shell_scripts_dir,
            &config.paths.sql_scripts_dir,
        );
        Self::new(
            &config.paths.templates_dir,
            Executor::new(scripts, CallbackRegistry::with_defaults()),
        )
    }

    /// The executor in use
    #[inline]
    #[must_use]
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Read and validate the template of a work mode
    ///
    /// # Errors
    /// Returns [`PerfbenchError::TemplateNotFound`] when the file is missing
    /// and [`PerfbenchError::Template`] when it is invalid.
    pub async fn load_template(&self, mode: WorkMode) -> Result<Report> {
        let path = self.templates_dir.join(mode.template_file());
        let text = tokio::fs::read_to_string(&path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                PerfbenchError::TemplateNotFound { path: path.clone() }
            } else {
                PerfbenchError::TemplateRead {
                    path: path.clone(),
                    source,
                }
            }
        })?;
        Report::from_json_str(&text).map_err(|source| PerfbenchError::Template { path, source })
    }

    /// Fill the template of `mode`, timestamped now
    ///
    /// # Errors
    /// See [`ReportRunner::run_at`].
    pub async fn run(
        &self,
        mode: WorkMode,
        shell: &dyn ShellRunner,
        sql: Option<&dyn SqlHandle>,
        ctx: RunContext,
    ) -> Result<Report> {
        self.run_at(mode, shell, sql, ctx, Local::now().naive_local())
            .await
    }

    /// Fill the template of `mode`
    ///
    /// An empty `ctx.report_name` is replaced by the default name before any
    /// step runs, so callbacks see the final name. Step failures end up in
    /// item data; only template loading can fail.
    ///
    /// # Errors
    /// Returns the template errors of [`ReportRunner::load_template`].
    pub async fn run_at(
        &self,
        mode: WorkMode,
        shell: &dyn ShellRunner,
        sql: Option<&dyn SqlHandle>,
        mut ctx: RunContext,
        at: NaiveDateTime,
    ) -> Result<Report> {
        if ctx.report_name.is_empty() {
            ctx.report_name = default_report_name(mode, at);
        }
        info!("{}", ctx.parameters_banner());

        let mut report = self.load_template(mode).await?;
        report.description = at.format(DESCRIPTION_TIME_FORMAT).to_string();
        report.report_name.clone_from(&ctx.report_name);

        info!(mode = %mode, report = %report.report_name, steps = report.steps().len(), "filling report");
        let summary = self.executor.execute(&mut report, shell, sql, &ctx).await;
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            elapsed_ms = summary.elapsed_ms,
            "report filled"
        );
        Ok(report)
    }
}
