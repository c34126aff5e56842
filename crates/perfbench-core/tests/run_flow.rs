//! End-to-end report runs against scripted collaborators

use chrono::NaiveDate;
use perfbench_core::{PerfbenchConfig, ReportRunner, ReportStore, WorkMode};
use perfbench_exec::RunContext;
use perfbench_report::{ItemData, ItemKind, Report};
use perfbench_test_utils::{row, FailingShell, FakeShell, FakeSql};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::Path;

const TEMPLATE: &str = r#"{
    "header": "PostgreSQL database information",
    "description": "",
    "report_name": "",
    "sections": {
        "system": {
            "header": "System properties",
            "reports": {
                "kernel": {"header": "Kernel", "item_type": "plain_text", "state": "expanded",
                           "shell_command_file": "kernel.sh", "data": ""},
                "cpu": {"header": "CPU", "item_type": "table", "state": "collapsed",
                        "theader": ["field", "value"], "shell_command_file": "cpu.sh", "data": []},
                "note": {"header": "Note", "item_type": "plain_text", "data": "static"}
            }
        },
        "db": {
            "reports": {
                "version_major": {"header": "Major version", "item_type": "plain_text",
                                  "sql_command_file": "version_major.sql", "data": ""},
                "settings": {"header": "Settings", "item_type": "table",
                             "sql_command_file": "settings.sql", "data": []},
                "args": {"header": "Arguments", "item_type": "table", "python_command": "args", "data": []}
            }
        }
    }
}"#;

struct Layout {
    _dir: tempfile::TempDir,
    config: PerfbenchConfig,
}

fn layout() -> Layout {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let mut config = PerfbenchConfig::default();
    config.paths.templates_dir = root.join("templates");
    config.paths.shell_scripts_dir = root.join("bash");
    config.paths.sql_scripts_dir = root.join("sql");
    config.paths.report_dir = root.join("report");

    write(&config.paths.templates_dir, WorkMode::CollectAllInfo.template_file(), TEMPLATE);
    write(&config.paths.shell_scripts_dir, "kernel.sh", "uname -r");
    write(
        &config.paths.shell_scripts_dir,
        "cpu.sh",
        "lscpu --json | jq '.lscpu'",
    );
    write(&config.paths.sql_scripts_dir, "version_major.sql", "SHOW server_version_num;");
    write(&config.paths.sql_scripts_dir, "settings.sql", "SELECT name, setting FROM pg_settings;");
    Layout { _dir: dir, config }
}

fn write(dir: &Path, name: &str, body: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(name), body).unwrap();
}

fn ctx() -> RunContext {
    let args = indexmap::IndexMap::from([
        ("pg_host".to_string(), json!("localhost")),
        ("pg_password".to_string(), json!("secret")),
    ]);
    RunContext::default().with_args(&args)
}

#[tokio::test]
async fn collect_all_info_fills_every_step() {
    let layout = layout();
    let runner = ReportRunner::from_config(&layout.config);
    let shell = FakeShell::new()
        .respond("uname", "6.1.0-18-amd64\n")
        .respond("lscpu", r#"[{"field": "Architecture", "value": "x86_64"}]"#);
    let sql = FakeSql::new()
        .scalar("server_version_num", Some(json!("160002")))
        .rows(
            "pg_settings",
            vec![row(&[("name", json!("shared_buffers")), ("setting", json!("16384"))])],
        );
    let at = NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap();

    let report = runner
        .run_at(WorkMode::CollectAllInfo, &shell, Some(&sql), ctx(), at)
        .await
        .unwrap();

    assert_eq!(report.report_name, "collect-all-info-report_2024-06-01_10-00-00");
    assert_eq!(report.description, "01/06/2024 10:00:00");
    assert_eq!(
        report.item("system", "kernel").unwrap().data,
        ItemData::Text("6.1.0-18-amd64\n".into())
    );
    let cpu = report.item("system", "cpu").unwrap();
    assert_eq!(cpu.theader.as_deref(), Some(&["field".to_string(), "value".to_string()][..]));
    assert_eq!(cpu.data.as_rows().unwrap(), &[vec![json!("Architecture"), json!("x86_64")]]);
    assert_eq!(
        report.item("db", "version_major").unwrap().data,
        ItemData::Text("160002".into())
    );
    assert_eq!(
        report.item("db", "settings").unwrap().theader.as_deref(),
        Some(&["name".to_string(), "setting".to_string()][..])
    );
    let args = report.item("db", "args").unwrap().data.as_rows().unwrap().to_vec();
    assert_eq!(args[1], vec![json!("pg_password"), json!("******")]);
    assert_eq!(
        report.item("system", "note").unwrap().data,
        ItemData::Text("static".into())
    );
    assert_eq!(shell.calls().len(), 2);

    let saved = ReportStore::new(&layout.config.paths.report_dir)
        .save(&report)
        .await
        .unwrap();
    assert_eq!(ReportStore::load(&saved.json).await.unwrap(), report);
}

#[tokio::test]
async fn failing_shell_degrades_without_changing_shape() {
    let layout = layout();
    let runner = ReportRunner::from_config(&layout.config);
    let template = runner.load_template(WorkMode::CollectAllInfo).await.unwrap();

    let mut ctx = ctx();
    ctx.report_name = "degraded".into();
    let report = runner
        .run(WorkMode::CollectAllInfo, &FailingShell, None, ctx)
        .await
        .unwrap();

    for name in ["kernel", "cpu"] {
        let item = report.item("system", name).unwrap();
        assert_eq!(item.kind(), ItemKind::PlainText);
        assert!(!item.data.as_text().unwrap().is_empty());
    }
    assert_eq!(keys(&report), keys(&template));
    assert_eq!(report.report_name, "degraded");
}

fn keys(report: &Report) -> Vec<(String, Vec<String>)> {
    report
        .sections
        .iter()
        .map(|(name, section)| (name.clone(), section.reports.keys().cloned().collect()))
        .collect()
}
