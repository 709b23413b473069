//! GanttView CLI entry point

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ganttview::core::{parse_dependencies, TaskFile, TaskId};
use ganttview::ui::TUI;
use ganttview::{map_snapshot, App, ChartConfig};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const DEFAULT_TASK_FILE: &str = "tasks.yml";

#[derive(Parser)]
#[command(name = "ganttview", version, about = "Gantt chart view for task lists")]
struct Cli {
    /// Chart config file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at info level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the Gantt chart in the terminal
    Show {
        #[arg(default_value = DEFAULT_TASK_FILE)]
        file: PathBuf,
    },
    /// Print the chart payload (data + links) as JSON
    Export {
        #[arg(default_value = DEFAULT_TASK_FILE)]
        file: PathBuf,
        #[arg(long)]
        pretty: bool,
    },
    /// Validate dependency references and date ranges
    Check {
        #[arg(default_value = DEFAULT_TASK_FILE)]
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let config = ChartConfig::load(cli.config.as_deref()).context("loading chart config")?;

    match cli.command {
        Command::Show { file } => show(&file, config),
        Command::Export { file, pretty } => export(&file, &config, pretty),
        Command::Check { file } => check(&file),
    }
}

fn show(path: &Path, config: ChartConfig) -> Result<()> {
    let file = TaskFile::from_file(path)?;
    log::info!("🚀 GanttView v{}", env!("CARGO_PKG_VERSION"));

    let mut app = App::new(file, Some(path.to_path_buf()), config)?;
    let mut tui = TUI::new()?;
    app.run(&mut tui)
}

fn export(path: &Path, config: &ChartConfig, pretty: bool) -> Result<()> {
    let file = TaskFile::from_file(path)?;
    let outcome = map_snapshot(&file.tasks, &config.date_format);

    for reference in outcome.skipped() {
        log::warn!("Skipping dependency: {}", reference);
    }
    if outcome.chart().is_none() {
        log::info!("{} has no tasks", path.display());
    }

    let chart = outcome.into_chart();
    let json = if pretty {
        serde_json::to_string_pretty(&chart)?
    } else {
        serde_json::to_string(&chart)?
    };
    println!("{}", json);
    Ok(())
}

fn check(path: &Path) -> Result<()> {
    let file = TaskFile::from_file(path)?;
    let known: HashSet<TaskId> = file.tasks.iter().map(|t| t.id).collect();
    let mut malformed = 0usize;

    for task in &file.tasks {
        if task.start_date > task.end_date {
            println!(
                "warning: task {} ends ({}) before it starts ({})",
                task.id, task.end_date, task.start_date
            );
        }

        let Some(deps) = task.dependencies.as_deref() else {
            continue;
        };
        let (sources, bad) = parse_dependencies(task.id, deps);

        for source in sources.iter().filter(|id| !known.contains(id)) {
            println!("warning: task {} depends on unknown task {}", task.id, source);
        }
        for reference in &bad {
            println!("error: {}", reference);
        }
        malformed += bad.len();
    }

    if malformed > 0 {
        anyhow::bail!("{} malformed dependency reference(s) in {}", malformed, path.display());
    }

    println!("✓ {} tasks OK", file.tasks.len());
    Ok(())
}
