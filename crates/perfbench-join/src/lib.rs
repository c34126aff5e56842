//! Multi-report comparison
//!
//! Folds several filled reports of the same template into one comparison
//! report. The first report is the reference; every later report is compared
//! step by step against it.
//!
//! # Core Concepts
//!
//! - [`JoinTask`]: fields that must be identical across all reports
//! - [`ReportJoiner`]: order-dependent left fold producing the merged report
//! - [`data_equal`] / [`line_diff`]: type-aware equality with diff logging
//!
//! # Example
//!
//! ```rust,ignore
//! use perfbench_join::{JoinTask, ReportJoiner};
//!
//! let task = JoinTask::load(&tasks_dir.join("task_compare_dbs.json")).await?;
//! let merged = ReportJoiner::new(task).merge(&reports)?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod aggregate;
mod compare;
mod error;
mod joiner;
mod task;

pub use compare::{data_equal, line_diff, MAX_DIFF_CELLS};
pub use error::{JoinError, JoinTaskError};
pub use joiner::{ReportJoiner, JOINED_HEADER};
pub use task::JoinTask;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use perfbench_report::{FieldPath, ItemData, Report};
    use perfbench_test_utils::{benchmark_report, ItemBuilder, ReportBuilder};

    #[test]
    fn merged_report_reloads_from_json() {
        let task = JoinTask::new(vec![FieldPath::item_data("db", "version_major")]);
        let mut r2 = benchmark_report("R2", "16", &[(1, 12.0), (2, 18.0)]);
        if let Some(kernel) = r2.item_mut("system", "kernel") {
            kernel.set_text("Linux 6.6");
        }
        let reports = vec![
            ("R1".to_string(), benchmark_report("R1", "16", &[(1, 10.0), (2, 20.0)])),
            ("R2".to_string(), r2),
        ];
        let mut merged = ReportJoiner::new(task).merge(&reports).unwrap();
        merged.report_name = "join_report".into();

        let text = merged.to_json_pretty().unwrap();
        let reloaded = Report::from_json_str(&text).unwrap();
        assert_eq!(reloaded, merged);
        assert!(matches!(
            reloaded.item("system", "kernel").unwrap().data,
            ItemData::Attributed(_)
        ));
    }

    #[test]
    fn table_diff_against_failed_step_reloads_from_json() {
        let task = JoinTask::new(vec![FieldPath::item_data("db", "version_major")]);
        let mut r2 = benchmark_report("R2", "16", &[(1, 12.0)]);
        if let Some(settings) = r2.item_mut("db", "settings") {
            settings.set_text("Error generating report: exit status 1");
        }
        let reports = vec![
            ("R1".to_string(), benchmark_report("R1", "16", &[(1, 10.0)])),
            ("R2".to_string(), r2),
        ];
        let merged = ReportJoiner::new(task).merge(&reports).unwrap();

        let reloaded = Report::from_json_str(&merged.to_json_pretty().unwrap()).unwrap();
        assert_eq!(reloaded, merged);
        let settings = reloaded.item("db", "settings").unwrap();
        assert_eq!(settings.data.as_attributed().map(<[_]>::len), Some(2));
    }

    #[test]
    fn dotted_item_name_mismatch_aborts() {
        let report = |name: &str, version: &str| {
            ReportBuilder::new(name)
                .item(
                    "db",
                    "version.major",
                    ItemBuilder::plain_text("Major version").sql("version_major.sql").text(version),
                )
                .build()
        };
        let task = JoinTask::from_json_str(
            r#"{"items": ["sections.db.reports.version.major.data"]}"#,
            std::path::Path::new("task.json"),
        )
        .unwrap();
        let reports = vec![
            ("R1".to_string(), report("R1", "15")),
            ("R2".to_string(), report("R2", "16")),
        ];

        let err = ReportJoiner::new(task).merge(&reports).unwrap_err();
        match err {
            JoinError::AllowlistedMismatch { path, .. } => {
                assert_eq!(path.to_string(), "sections.db.reports.version.major.data");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn failed_merge_leaves_inputs_untouched() {
        let task = JoinTask::new(vec![FieldPath::item_data("db", "version_major")]);
        let reports = vec![
            ("R1".to_string(), benchmark_report("R1", "15", &[(1, 10.0)])),
            ("R2".to_string(), benchmark_report("R2", "16", &[(1, 12.0)])),
        ];
        let before = reports.clone();
        assert!(ReportJoiner::new(task).merge(&reports).is_err());
        assert_eq!(reports, before);
    }
}
