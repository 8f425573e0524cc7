use anyhow::{Context, Result, anyhow};
use colored::Colorize;
use std::{env, path::Path};

use crate::{cli::handlers, system::executor::CommandRunner};

// --- Command Definition and Registry ---

/// Defines a system command, its aliases, and its handler.
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    summary: &'static str,
    handler: fn(&Path, Vec<String>, &dyn CommandRunner) -> Result<()>,
}

/// The single source of truth for all system commands.
static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "graph",
        aliases: &[],
        summary: "Render the `go mod graph` of the current module.",
        handler: handlers::graph::handle,
    },
    CommandDefinition {
        name: "modules",
        aliases: &["ls"],
        summary: "List workspace modules in dependency order.",
        handler: handlers::modules::handle,
    },
    CommandDefinition {
        name: "run",
        aliases: &[],
        summary: "Run a command in every module.",
        handler: handlers::run::handle,
    },
];

/// Finds a command definition in the registry by its name or alias.
fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

fn print_usage() {
    println!("{}", "Usage: modx <command> [args...]".yellow().bold());
    for cmd in COMMAND_REGISTRY {
        let aliases = if cmd.aliases.is_empty() {
            String::new()
        } else {
            format!(" ({})", cmd.aliases.join(", "))
        };
        println!("  {:<16} {}", format!("{}{}", cmd.name, aliases).cyan(), cmd.summary);
    }
}

/// Routes the raw arguments to a registered handler, rooted at the current directory.
pub fn dispatch(all_args: Vec<String>, runner: &dyn CommandRunner) -> Result<()> {
    let root = env::current_dir().context("failed to get working directory")?;
    dispatch_in(&root, all_args, runner)
}

pub fn dispatch_in(root: &Path, all_args: Vec<String>, runner: &dyn CommandRunner) -> Result<()> {
    log::debug!("Dispatching args: {:?}", all_args);

    let mut args = all_args.into_iter();
    let Some(action) = args.next() else {
        print_usage();
        return Ok(());
    };

    let command = find_command(&action).ok_or_else(|| {
        anyhow!(
            "Unknown command '{}'. Available commands: {}",
            action,
            COMMAND_REGISTRY
                .iter()
                .map(|c| c.name)
                .collect::<Vec<_>>()
                .join(", ")
        )
    })?;
    (command.handler)(root, args.collect(), runner)
}
