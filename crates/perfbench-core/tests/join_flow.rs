//! End-to-end joins of saved reports

use chrono::NaiveDate;
use perfbench_core::{JoinRequest, JoinRunner, PerfbenchError, ReportStore};
use perfbench_join::JoinError;
use perfbench_report::{ItemData, RESULT_SECTION};
use perfbench_test_utils::benchmark_report;
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};

const TASK: &str = r#"{
    "items": [
        "sections.db.reports.version_major.data"
    ]
}
"#;

struct Dirs {
    _root: tempfile::TempDir,
    input: PathBuf,
    tasks: PathBuf,
    out: PathBuf,
}

async fn dirs() -> Dirs {
    let root = tempfile::tempdir().unwrap();
    let input = root.path().join("input");
    let tasks = root.path().join("join_tasks");
    let out = root.path().join("report");
    tokio::fs::create_dir_all(&input).await.unwrap();
    tokio::fs::create_dir_all(&tasks).await.unwrap();
    tokio::fs::write(tasks.join("task_compare_dbs.json"), TASK)
        .await
        .unwrap();
    Dirs {
        _root: root,
        input,
        tasks,
        out,
    }
}

async fn save_into(dir: &Path, name: &str, version: &str, points: &[(i64, f64)]) {
    ReportStore::new(dir)
        .save(&benchmark_report(name, version, points))
        .await
        .unwrap();
}

fn request(input: &Path, reference: Option<&str>) -> JoinRequest {
    JoinRequest {
        join_tasks: PathBuf::from("task_compare_dbs.json"),
        input_dir: input.to_path_buf(),
        reference_report: reference.map(str::to_string),
        report_name: None,
    }
}

fn at() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 7, 2)
        .unwrap()
        .and_hms_opt(9, 15, 30)
        .unwrap()
}

#[tokio::test]
async fn join_merges_and_saves() {
    let dirs = dirs().await;
    save_into(&dirs.input, "bench-a", "16", &[(1, 10.0), (2, 20.0)]).await;
    save_into(&dirs.input, "bench-b", "16", &[(1, 12.0), (2, 18.0)]).await;

    let runner = JoinRunner::new(ReportStore::new(&dirs.out), &dirs.tasks);
    let (merged, saved) = runner
        .run_at(&request(&dirs.input, Some("bench-b.json")), at())
        .await
        .unwrap();

    assert_eq!(merged.report_name, "join_report_2024-07-02_09-15-30");
    assert_eq!(merged.header, "Result of joined reports 02/07/2024 09:15:30");
    assert_eq!(
        merged.description,
        format!("\nComparison Reports:\nbench-b\nbench-a\n\nJoined by:\n{TASK}")
    );

    let series = &merged
        .item(RESULT_SECTION, "chart")
        .unwrap()
        .data
        .as_chart()
        .unwrap()
        .series;
    let names: Vec<&str> = series.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["bench-b,tps", "bench-a"]);

    assert!(saved.json.starts_with(&dirs.out));
    assert!(saved.html.exists());
    assert_eq!(ReportStore::load(&saved.json).await.unwrap(), merged);
}

#[tokio::test]
async fn diverging_fields_become_attributed_lists() {
    let dirs = dirs().await;
    save_into(&dirs.input, "r1", "16", &[(1, 10.0)]).await;
    let mut r2 = benchmark_report("r2", "16", &[(1, 11.0)]);
    if let Some(kernel) = r2.item_mut("system", "kernel") {
        kernel.set_text("Linux 6.6");
    }
    ReportStore::new(&dirs.input).save(&r2).await.unwrap();

    let runner = JoinRunner::new(ReportStore::new(&dirs.out), &dirs.tasks);
    let mut req = request(&dirs.input, None);
    req.report_name = Some("kernels".into());
    let (merged, saved) = runner.run_at(&req, at()).await.unwrap();

    assert_eq!(saved.json, dirs.out.join("kernels.json"));
    let kernel = merged.item("system", "kernel").unwrap();
    assert_eq!(kernel.header, "Kernel | Diff");
    let values: Vec<(&str, &ItemData)> = kernel
        .data
        .as_attributed()
        .unwrap()
        .iter()
        .map(|entry| (entry.report.as_str(), &entry.value))
        .collect();
    assert_eq!(
        values,
        vec![
            ("r1", &ItemData::Text("Linux 6.1".into())),
            ("r2", &ItemData::Text("Linux 6.6".into())),
        ]
    );
}

#[tokio::test]
async fn allowlisted_mismatch_writes_nothing() {
    let dirs = dirs().await;
    save_into(&dirs.input, "R1", "15", &[(1, 10.0)]).await;
    save_into(&dirs.input, "R2", "16", &[(1, 12.0)]).await;

    let runner = JoinRunner::new(ReportStore::new(&dirs.out), &dirs.tasks);
    let err = runner
        .run_at(&request(&dirs.input, None), at())
        .await
        .unwrap_err();

    match err {
        PerfbenchError::Join(JoinError::AllowlistedMismatch {
            reference,
            comparator,
            path,
        }) => {
            assert_eq!(reference, "R1");
            assert_eq!(comparator, "R2");
            assert_eq!(path.to_string(), "sections.db.reports.version_major.data");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!dirs.out.exists());
}

#[tokio::test]
async fn missing_task_file_is_fatal() {
    let dirs = dirs().await;
    save_into(&dirs.input, "R1", "16", &[(1, 10.0)]).await;

    let runner = JoinRunner::new(ReportStore::new(&dirs.out), &dirs.tasks);
    let mut req = request(&dirs.input, None);
    req.join_tasks = PathBuf::from("absent.json");
    let err = runner.run_at(&req, at()).await.unwrap_err();
    assert!(matches!(err, PerfbenchError::JoinTask(_)));
}
