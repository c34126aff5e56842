//! Join flow: load a task and a directory of reports, merge, save

use crate::error::{PerfbenchError, Result};
use crate::runner::NAME_TIME_FORMAT;
use crate::store::{ReportStore, SavedReport};
use chrono::{Local, NaiveDateTime};
use perfbench_join::{JoinTask, ReportJoiner};
use perfbench_report::Report;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Prefix of generated join report names
pub const JOIN_NAME_PREFIX: &str = "join_report_";

/// Load every `*.json` report of a directory for joining
///
/// Files are taken in name order, skipping names that contain `join`. The
/// `reference` file, when present, is moved to the front. Unreadable or
/// invalid files are skipped with a warning. Each report is labelled by its
/// `report_name`, or by its file stem when unnamed.
///
/// # Errors
/// Returns [`PerfbenchError::InputDir`] for a missing directory and
/// [`PerfbenchError::NoReports`] when nothing could be loaded.
pub async fn load_reports(input_dir: &Path, reference: Option<&str>) -> Result<Vec<(String, Report)>> {
    let invalid = || PerfbenchError::InputDir {
        path: input_dir.to_path_buf(),
    };
    let mut entries = tokio::fs::read_dir(input_dir).await.map_err(|_| invalid())?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|_| invalid())? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".json") && !name.contains("join") {
            files.push(name);
        }
    }
    files.sort();

    if let Some(reference) = reference {
        match files.iter().position(|name| name == reference) {
            Some(index) => files.swap(0, index),
            None => warn!(reference, "reference report not found in input directory"),
        }
    }

    let mut reports = Vec::with_capacity(files.len());
    for file in &files {
        let path = input_dir.join(file);
        match ReportStore::load(&path).await {
            Ok(report) => {
                let label = if report.report_name.is_empty() {
                    file.trim_end_matches(".json").to_string()
                } else {
                    report.report_name.clone()
                };
                reports.push((label, report));
            }
            Err(e) => warn!(file = %file, error = %e, "Cannot load report"),
        }
    }

    if reports.is_empty() {
        return Err(PerfbenchError::NoReports {
            path: input_dir.to_path_buf(),
        });
    }
    let names: Vec<&str> = reports.iter().map(|(name, _)| name.as_str()).collect();
    info!("Loaded {} report(s): {}", reports.len(), names.join(", "));
    Ok(reports)
}

/// What to join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRequest {
    /// Join task file, relative to the tasks directory unless absolute
    pub join_tasks: PathBuf,
    /// Directory holding the reports
    pub input_dir: PathBuf,
    /// File name of the reference report
    pub reference_report: Option<String>,
    /// Name of the merged report
    pub report_name: Option<String>,
}

/// Loads, merges and saves joined reports
#[derive(Debug, Clone)]
pub struct JoinRunner {
    store: ReportStore,
    tasks_dir: PathBuf,
}

impl JoinRunner {
    /// Create a join runner
    #[must_use]
    pub fn new(store: ReportStore, tasks_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            tasks_dir: tasks_dir.into(),
        }
    }

    /// Join now
    ///
    /// # Errors
    /// See [`JoinRunner::run_at`].
    pub async fn run(&self, request: &JoinRequest) -> Result<(Report, SavedReport)> {
        self.run_at(request, Local::now().naive_local()).await
    }

    /// Join and save, stamping names and headers with `at`
    ///
    /// # Errors
    /// Task file, directory and merge failures are fatal and nothing is
    /// written.
    pub async fn run_at(&self, request: &JoinRequest, at: NaiveDateTime) -> Result<(Report, SavedReport)> {
        let task_path = JoinTask::resolve(&request.join_tasks, &self.tasks_dir);
        let task = JoinTask::load(&task_path).await?;
        let items: Vec<String> = task.items().iter().map(ToString::to_string).collect();
        info!(
            "Compare items \"{}\" loaded successfully:\n{}",
            request.join_tasks.display(),
            items.join("\n")
        );

        let reports = load_reports(&request.input_dir, request.reference_report.as_deref()).await?;
        let mut merged = ReportJoiner::new(task).merge_at(&reports, at)?;
        info!("Reports merged successfully.");

        merged.report_name = match &request.report_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("{JOIN_NAME_PREFIX}{}", at.format(NAME_TIME_FORMAT)),
        };
        let saved = self.store.save(&merged).await?;
        Ok((merged, saved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perfbench_test_utils::benchmark_report;
    use pretty_assertions::assert_eq;

    async fn write(dir: &Path, file: &str, report: &Report) {
        tokio::fs::write(dir.join(file), report.to_json_pretty().unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn reference_moves_first_and_join_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.json", &benchmark_report("A", "16", &[(1, 1.0)])).await;
        write(dir.path(), "b.json", &benchmark_report("B", "16", &[(1, 2.0)])).await;
        write(dir.path(), "c.json", &benchmark_report("C", "16", &[(1, 3.0)])).await;
        write(dir.path(), "join_old.json", &benchmark_report("J", "16", &[])).await;
        tokio::fs::write(dir.path().join("notes.txt"), "x").await.unwrap();

        let reports = load_reports(dir.path(), Some("c.json")).await.unwrap();
        let names: Vec<&str> = reports.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["C", "B", "A"]);
    }

    #[tokio::test]
    async fn invalid_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.json", &benchmark_report("", "16", &[(1, 1.0)])).await;
        tokio::fs::write(dir.path().join("b.json"), "{not json").await.unwrap();

        let reports = load_reports(dir.path(), None).await.unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].0, "a");
    }

    #[tokio::test]
    async fn empty_or_missing_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_reports(dir.path(), None).await,
            Err(PerfbenchError::NoReports { .. })
        ));
        assert!(matches!(
            load_reports(&dir.path().join("absent"), None).await,
            Err(PerfbenchError::InputDir { .. })
        ));
    }
}
