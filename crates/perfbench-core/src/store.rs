//! Report persistence
//!
//! Every report is written twice: the canonical `<report_name>.json` and a
//! self-contained `<report_name>.html` view built by substituting the JSON
//! text into an HTML template.

use crate::error::StoreError;
use perfbench_report::Report;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Placeholder replaced by the report JSON in the HTML template
pub const REPORT_DATA_PLACEHOLDER: &str = "__REPORT_DATA";

const BUNDLED_HTML: &str = include_str!("../templates/report.html");

/// Paths of a saved report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedReport {
    /// Canonical JSON file
    pub json: PathBuf,
    /// Rendered HTML view
    pub html: PathBuf,
}

/// Reads and writes reports under one directory
#[derive(Debug, Clone)]
pub struct ReportStore {
    dir: PathBuf,
    html_template: Option<PathBuf>,
}

impl ReportStore {
    /// Store writing into `dir` with the bundled HTML template
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            html_template: None,
        }
    }

    /// Use a custom HTML template
    #[inline]
    #[must_use]
    pub fn with_html_template(mut self, template: Option<PathBuf>) -> Self {
        self.html_template = template;
        self
    }

    /// Output directory
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save a report as JSON and HTML
    ///
    /// # Errors
    /// Returns [`StoreError::MissingReportName`] for an unnamed report and
    /// [`StoreError::Io`] when the directory or files cannot be written.
    pub async fn save(&self, report: &Report) -> Result<SavedReport, StoreError> {
        if report.report_name.trim().is_empty() {
            return Err(StoreError::MissingReportName);
        }
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StoreError::io(&self.dir, e))?;

        let json = report.to_json_pretty()?;
        let saved = SavedReport {
            json: self.dir.join(format!("{}.json", report.report_name)),
            html: self.dir.join(format!("{}.html", report.report_name)),
        };
        tokio::fs::write(&saved.json, &json)
            .await
            .map_err(|e| StoreError::io(&saved.json, e))?;
        self.write_html(&saved.html, &json).await?;

        info!(json = %saved.json.display(), html = %saved.html.display(), "report saved");
        Ok(saved)
    }

    /// Load and validate a persisted report
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] for unreadable files and
    /// [`StoreError::Invalid`] when the content is not a report.
    pub async fn load(path: &Path) -> Result<Report, StoreError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::io(path, e))?;
        Report::from_json_str(&text).map_err(|source| StoreError::Invalid {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Regenerate the HTML view next to an existing JSON report
    ///
    /// # Errors
    /// Same as [`ReportStore::load`], plus write failures.
    pub async fn render(&self, json_path: &Path) -> Result<PathBuf, StoreError> {
        let report = Self::load(json_path).await?;
        let json = report.to_json_pretty()?;
        let html = json_path.with_extension("html");
        self.write_html(&html, &json).await?;
        info!(html = %html.display(), "report rendered");
        Ok(html)
    }

    /// HTML view for a JSON text
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] when the configured template is unreadable.
    pub async fn render_html(&self, json: &str) -> Result<String, StoreError> {
        let template = match &self.html_template {
            Some(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| StoreError::io(path, e))?,
            None => BUNDLED_HTML.to_string(),
        };
        Ok(template.replace(REPORT_DATA_PLACEHOLDER, json))
    }

    async fn write_html(&self, path: &Path, json: &str) -> Result<(), StoreError> {
        let html = self.render_html(json).await?;
        debug!(path = %path.display(), bytes = html.len(), "writing html");
        tokio::fs::write(path, html)
            .await
            .map_err(|e| StoreError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perfbench_test_utils::benchmark_report;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn save_writes_json_and_html() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path().join("out"));
        let report = benchmark_report("bench-1", "16", &[(1, 100.0)]);

        let saved = store.save(&report).await.unwrap();
        assert_eq!(saved.json, dir.path().join("out/bench-1.json"));

        let json = std::fs::read_to_string(&saved.json).unwrap();
        assert!(json.starts_with("{\n    \"header\""));
        assert_eq!(ReportStore::load(&saved.json).await.unwrap(), report);

        let html = std::fs::read_to_string(&saved.html).unwrap();
        assert!(!html.contains(REPORT_DATA_PLACEHOLDER));
        assert!(html.contains("\"report_name\": \"bench-1\""));
    }

    #[tokio::test]
    async fn unnamed_report_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let report = benchmark_report("", "16", &[]);
        assert!(matches!(
            ReportStore::new(dir.path()).save(&report).await,
            Err(StoreError::MissingReportName)
        ));
    }

    #[tokio::test]
    async fn custom_template_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("view.html");
        std::fs::write(&template, "<pre>__REPORT_DATA</pre>").unwrap();
        let store = ReportStore::new(dir.path()).with_html_template(Some(template));
        assert_eq!(store.render_html("{}").await.unwrap(), "<pre>{}</pre>");
    }

    #[tokio::test]
    async fn render_regenerates_html() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path());
        let saved = store
            .save(&benchmark_report("bench-2", "16", &[(1, 1.0)]))
            .await
            .unwrap();
        std::fs::remove_file(&saved.html).unwrap();

        assert_eq!(store.render(&saved.json).await.unwrap(), saved.html);
        assert!(saved.html.exists());
    }

    #[tokio::test]
    async fn load_rejects_non_reports() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(
            ReportStore::load(&path).await,
            Err(StoreError::Invalid { .. })
        ));
    }
}
