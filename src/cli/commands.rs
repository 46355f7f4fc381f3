//! Command dispatch

use std::io;
use std::path::Path;

use clap::CommandFactory;
use tracing::{debug, instrument};

use crate::application::services::LoadReport;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{ObjectGraph, ObjectKind};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::RealFileSystem;
use crate::infrastructure::LoadPlan;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Load {
            plan,
            allow_override,
        }) => _load(plan, *allow_override),
        Some(Commands::Tree { plan, kind }) => _tree(plan, *kind),
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Show { dir } => _config_show(dir.as_deref()),
            ConfigCommands::Template => {
                output::info(&Settings::template());
                Ok(())
            }
            ConfigCommands::Path => _config_path(),
        },
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::InvalidArgs("no command given, see --help".into())),
    }
}

/// Read the plan, layer settings next to it, and run one load cycle.
pub fn run_plan(plan_path: &Path, allow_override: bool) -> CliResult<(ObjectGraph, LoadReport)> {
    let plan = LoadPlan::read(&RealFileSystem, plan_path)?;
    let mut settings = Settings::load(Some(plan.dir()))?;
    if allow_override {
        settings.allow_override = true;
    }
    debug!(?settings, "effective settings");

    let container = ServiceContainer::new(settings)?;
    let mut graph = ObjectGraph::new();
    let report = container.load_service.load(&mut graph, &plan.sources);
    Ok((graph, report))
}

#[instrument]
fn _load(plan: &Path, allow_override: bool) -> CliResult<()> {
    let (graph, report) = run_plan(plan, allow_override)?;

    for d in report.diagnostics.iter() {
        output::diagnostic(d);
    }

    output::header(&format!("Loaded {} objects from {}", graph.len(), plan.display()));
    for kind in ObjectKind::ALL {
        let count = graph.count(kind);
        if count > 0 {
            output::detail(&format!("{kind}: {count}"));
        }
    }

    let errors = report.diagnostics.error_count();
    if errors > 0 {
        return Err(CliError::LoadFailed { errors });
    }
    output::success("no errors");
    Ok(())
}

#[instrument]
fn _tree(plan: &Path, kind: Option<ObjectKind>) -> CliResult<()> {
    let (graph, report) = run_plan(plan, false)?;
    for d in report.diagnostics.iter() {
        output::diagnostic(d);
    }
    output::info(&output::graph_tree(&graph, kind));
    Ok(())
}

fn _config_show(dir: Option<&Path>) -> CliResult<()> {
    let settings = Settings::load(dir)?;
    output::info(&settings.to_toml()?);
    Ok(())
}

fn _config_path() -> CliResult<()> {
    match global_config_path() {
        Some(path) => {
            let marker = if path.exists() { "" } else { " (not present)" };
            output::info(&format!("global: {}{marker}", path.display()));
        }
        None => output::info(&"global: <no config directory>"),
    }
    output::info(&format!("local:  {}", local_config_path(Path::new("<plan_dir>")).display()));
    Ok(())
}
