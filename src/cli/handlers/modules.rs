use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::{io::Write, path::Path};

use crate::{
    core::{config_loader, dependency_sort, discovery, orchestrator, report},
    models::ModuleInfo,
    system::executor::CommandRunner,
};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Lists the workspace modules in dependency order."
)]
struct ModulesArgs {
    /// Print the list as JSON instead of a summary.
    #[arg(long)]
    json: bool,

    /// Include modules excluded by the project configuration.
    #[arg(long)]
    all: bool,
}

#[derive(Serialize, Debug)]
struct ModuleEntry<'a> {
    #[serde(flatten)]
    module: &'a ModuleInfo,
    dependencies: &'a [String],
}

pub fn handle(root: &Path, args: Vec<String>, _runner: &dyn CommandRunner) -> Result<()> {
    let modules_args = ModulesArgs::try_parse_from(&args)?;
    let stdout = std::io::stdout();
    list_modules(root, &modules_args, &mut stdout.lock())
}

/// Discovers, filters and sorts the modules. The JSON listing goes to `out`.
fn list_modules(root: &Path, modules_args: &ModulesArgs, out: &mut dyn Write) -> Result<()> {
    let mut modules = discovery::find_all_modules_in(root).context("failed to find modules")?;
    if modules.is_empty() {
        report::warn("No Go modules found");
        return Ok(());
    }
    if !modules_args.all {
        let config = config_loader::load_project_config(root).context("failed to get config")?;
        modules = orchestrator::filter_modules_for_processing(modules, &config, "listing");
        if modules.is_empty() {
            report::warn("No modules to process for listing after exclusions");
            return Ok(());
        }
    }

    let order = dependency_sort::sort_modules_by_dependency(modules)
        .context("failed to sort modules by dependency")?;

    if modules_args.json {
        let entries: Vec<ModuleEntry<'_>> = order
            .modules
            .iter()
            .map(|module| ModuleEntry {
                module,
                dependencies: order
                    .dependencies
                    .get(&module.module)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]),
            })
            .collect();
        writeln!(out, "{}", serde_json::to_string_pretty(&entries)?)?;
    } else {
        orchestrator::display_module_summary(&order);
    }
    Ok(())
}
