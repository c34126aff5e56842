//! perfbench command line

use anyhow::Context;
use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use perfbench_core::{logging, JoinRequest, JoinRunner, PerfbenchConfig, ReportStore};
use perfbench_exec::RunContext;
use perfbench_report::Report;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "perfbench", version, about = "PostgreSQL benchmark and inspection reports")]
struct Cli {
    /// Configuration file (defaults to a discovered perfbench.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level: debug, info, warn or error
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Directory for generated reports
    #[arg(long, global = true)]
    report_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Merge the reports of a directory into one comparison report
    Join {
        /// Join task file listing fields that must match
        #[arg(long)]
        join_tasks: PathBuf,
        /// Directory with the reports to merge
        #[arg(long)]
        input_dir: PathBuf,
        /// File name of the reference report
        #[arg(long)]
        reference_report: Option<String>,
        /// Name of the merged report
        #[arg(long)]
        report_name: Option<String>,
    },
    /// Regenerate the HTML view of a saved report
    Render {
        /// Saved report JSON
        #[arg(long)]
        input: PathBuf,
    },
    /// Print the ordered execution steps of a template
    Steps {
        /// Report template JSON
        #[arg(long)]
        template: PathBuf,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<PerfbenchConfig> {
    let mut config = match &cli.config {
        Some(path) => PerfbenchConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PerfbenchConfig::discover().unwrap_or_default(),
    };
    if let Some(level) = &cli.log_level {
        config.logging.level.clone_from(level);
    }
    if let Some(dir) = &cli.report_dir {
        config.paths.report_dir.clone_from(dir);
    }
    Ok(config)
}

fn log_parameters(args: IndexMap<String, Value>) {
    info!("{}", RunContext::default().with_args(&args).parameters_banner());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    logging::init(&config.logging.level)?;

    let store = ReportStore::new(&config.paths.report_dir)
        .with_html_template(config.paths.html_template.clone());

    match cli.command {
        Command::Join {
            join_tasks,
            input_dir,
            reference_report,
            report_name,
        } => {
            log_parameters(IndexMap::from([
                ("mode".to_string(), json!("join")),
                ("join_tasks".to_string(), json!(join_tasks.display().to_string())),
                ("input_dir".to_string(), json!(input_dir.display().to_string())),
                ("reference_report".to_string(), json!(reference_report)),
                ("report_name".to_string(), json!(report_name)),
            ]));
            let request = JoinRequest {
                join_tasks,
                input_dir,
                reference_report,
                report_name,
            };
            let runner = JoinRunner::new(store, &config.paths.join_tasks_dir);
            let (report, saved) = runner.run(&request).await.context("joining reports")?;
            println!("{}: {}", report.report_name, saved.json.display());
        }
        Command::Render { input } => {
            let html = store
                .render(&input)
                .await
                .with_context(|| format!("rendering {}", input.display()))?;
            println!("{}", html.display());
        }
        Command::Steps { template } => {
            let text = tokio::fs::read_to_string(&template)
                .await
                .with_context(|| format!("reading template {}", template.display()))?;
            let report = Report::from_json_str(&text)
                .with_context(|| format!("invalid template {}", template.display()))?;
            for step in report.steps() {
                println!(
                    "{} {} {} {}",
                    step.index,
                    step.key(),
                    step.kind(),
                    step.command.reference()
                );
            }
        }
    }
    Ok(())
}
