//! Command dispatch

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use termtree::Tree;
use tracing::{debug, instrument};

use crate::application::services::ExperimentTrees;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};
use crate::infrastructure::di::ServiceContainer;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Apply {
            path,
            in_place,
            strip_sources,
        }) => {
            let mut settings = load_settings(cli)?;
            settings.strip_sources |= *strip_sources;
            cmd_apply(&ServiceContainer::new(settings)?, path, *in_place)
        }
        Some(Commands::Flatten { path, experiment }) => {
            let container = ServiceContainer::new(load_settings(cli)?)?;
            cmd_flatten(&container, path, experiment.as_deref())
        }
        Some(Commands::Tree { path }) => {
            let container = ServiceContainer::new(load_settings(cli)?)?;
            cmd_tree(&container, path)
        }
        Some(Commands::Config { command }) => cmd_config(cli, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage("no command given, see --help".to_string())),
    }
}

/// Layered settings with command line overrides on top.
fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.log_dir {
        settings.log_dir = Some(dir.clone());
    }
    if cli.no_log {
        settings.log_dir = None;
    }
    debug!("settings: {:?}", settings);
    Ok(settings)
}

#[instrument(skip(container))]
fn cmd_apply(container: &ServiceContainer, path: &Path, in_place: bool) -> CliResult<()> {
    let service = &container.definitions;
    service.prepare_logs()?;

    let outputs = service.apply_path(path)?;
    let experiments: usize = outputs.iter().map(|o| o.experiments.len()).sum();

    if in_place {
        let written = service.write_in_place(&outputs)?;
        output::success(&format!(
            "applied {} experiments to {} files",
            experiments, written
        ));
        for out in &outputs {
            for summary in &out.experiments {
                output::detail(&format!("{}: {} entries", summary.id, summary.entries_added));
            }
        }
        return Ok(());
    }

    let with_headers = outputs.len() > 1;
    for out in &outputs {
        if let (true, Some(p)) = (with_headers, &out.path) {
            output::info(&format!("// {}", p.display()));
        }
        output::raw(&out.to_cfg_string());
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_flatten(
    container: &ServiceContainer,
    path: &Path,
    experiment: Option<&str>,
) -> CliResult<()> {
    let flattened = container.definitions.flatten_path(path)?;
    let selected: Vec<_> = flattened
        .iter()
        .filter(|f| experiment.map_or(true, |id| f.id == id))
        .collect();

    if let (Some(id), true) = (experiment, selected.is_empty()) {
        return Err(CliError::InvalidArgs(format!("experiment not found: {id}")));
    }

    for exp in selected {
        let distinct = exp.entries.keys().unique().count();
        output::header(&format!(
            "{} ({} entries, {} keys)",
            exp.id,
            exp.entries.len(),
            distinct
        ));
        for (key, value) in &exp.entries {
            output::entry(key, value);
        }
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_tree(container: &ServiceContainer, path: &Path) -> CliResult<()> {
    let trees = container.definitions.situation_trees(path)?;
    for exp in &trees {
        output::info(&experiment_tree(exp));
    }
    Ok(())
}

/// One experiment's situation trees under a header with their size.
fn experiment_tree(exp: &ExperimentTrees) -> Tree<String> {
    let situations: usize = exp.roots.iter().map(|r| r.node_count()).sum();
    let depth = exp.roots.iter().map(|r| r.depth()).max().unwrap_or(0);
    let mut tree = Tree::new(format!(
        "{} ({} situations, depth {})",
        exp.id, situations, depth
    ));
    for root in &exp.roots {
        tree.push(root.to_tree());
    }
    tree
}

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::raw(&settings.to_toml()?);
        }
        ConfigCommands::Template => output::raw(&Settings::template()),
        ConfigCommands::Path => {
            let global = global_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(unavailable)".to_string());
            output::info(&format!("global: {}", global));
            if let Some(local) = &cli.config {
                output::info(&format!("local:  {}", local.display()));
            }
        }
    }
    Ok(())
}
