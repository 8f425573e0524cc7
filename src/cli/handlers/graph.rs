use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use colored::Colorize;
use std::{fs, io::Write, path::Path};

use crate::{
    constants::{MANIFEST_FILENAME, ROOT_RELATIVE},
    core::{
        config_loader,
        graph_display::{self, DisplayOptions, GraphError, GraphFormat},
        manifest,
        mod_graph::DependencyGraph,
        report,
    },
    models::ModuleInfo,
    system::{executor::CommandRunner, module_runner},
};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Renders the module dependency graph of the current module."
)]
struct GraphArgs {
    /// Limit the depth of the tree display (0 = unlimited).
    #[arg(long, short, default_value_t = 0)]
    depth: usize,

    /// Output format: tree, json, dot or mermaid.
    #[arg(long, short, default_value = "tree")]
    format: String,

    /// Only keep modules whose name contains this text (case-insensitive).
    #[arg(long)]
    filter: Option<String>,

    /// Show versions next to module names in the tree.
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    show_versions: bool,
}

pub fn handle(root: &Path, args: Vec<String>, runner: &dyn CommandRunner) -> Result<()> {
    // 1. Parse this handler's specific arguments. The format is validated before any work is done.
    let graph_args = GraphArgs::try_parse_from(&args)?;
    let format: GraphFormat = graph_args.format.parse()?;
    let config = config_loader::load_project_config(root).context("failed to get config")?;

    report::header("Generating Dependency Graph");

    // 2. Resolve the main module; the graph is rooted at its bare name.
    let root_module = manifest::read_module_name(&root.join(MANIFEST_FILENAME)).unwrap_or_else(|e| {
        log::debug!("Failed to get module name: {}", e);
        "unknown".to_string()
    });
    let module = ModuleInfo::new(root, root_module.clone(), ROOT_RELATIVE);

    report::info("Analyzing dependencies...");
    let output = module_runner::run_command_in_module_output(
        &module,
        runner,
        "go",
        &["mod".to_string(), "graph".to_string()],
    )
    .context("failed to generate dependency graph")?;

    // 3. Build, filter and render.
    let mut graph = DependencyGraph::parse(&output);
    if let Some(pattern) = graph_args.filter.as_deref().filter(|p| !p.is_empty()) {
        graph = graph.filter(pattern);
    }

    let options = DisplayOptions {
        show_versions: graph_args.show_versions,
        max_depth: graph_args.depth,
    };
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out)?;
    match graph_display::render(&graph, &root_module, format, &options, &mut out) {
        Err(GraphError::RootNotFound(name)) => {
            report::warn(&format!("Root module not found in graph: {}", name));
        }
        other => other?,
    }
    drop(out);

    display_graph_stats(&graph, &root_module);

    // 4. Optionally keep the raw output around.
    if let Some(file) = &config.graph.file {
        let target = root.join(file);
        fs::write(&target, &output)
            .with_context(|| format!("failed to write graph file '{}'", target.display()))?;
        report::success(&format!("Full dependency graph saved to: {}", target.display()));
    }

    Ok(())
}

fn display_graph_stats(graph: &DependencyGraph, root_module: &str) {
    report::header("Dependency Statistics");
    report::info(&format!("Direct dependencies: {}", graph.direct_dependencies(root_module)));
    report::info(&format!("Total unique modules: {}", graph.total_modules()));
    report::info(&format!("Maximum dependency depth: {}", graph.max_depth(root_module)));

    let duplicates = graph.duplicate_versions();
    if !duplicates.is_empty() {
        report::warn("Modules with multiple versions:");
        for (module, versions) in duplicates {
            println!("    {}: {}", module.yellow(), versions.join(", "));
        }
    }
}
