//! # Module Command Orchestrator
//!
//! The shared setup and iteration logic for commands that operate on every module
//! of a workspace: discovery, configuration, exclusion filtering, per-module
//! timing/reporting and aggregation of failures into one `ModuleErrors`.
//!
//! Dependency ordering is not applied here. Callers that need it pass the module
//! list through `dependency_sort::sort_modules_by_dependency` themselves.

use crate::{
    core::{config_loader, dependency_sort::DependencyOrder, discovery, report},
    models::{ModuleInfo, ProjectConfig, short_module_name},
};
use anyhow::{Context, Result};
use rayon::prelude::*;
use thiserror::Error;
use std::{
    env,
    path::Path,
    time::{Duration, Instant},
};

/// Display labels for a module-iterating command.
#[derive(Debug, Clone, Default)]
pub struct ModuleCommandConfig {
    /// Printed as the section header (e.g. "Running Linters").
    pub header: String,
    /// Used in log lines about the operation (e.g. "linting").
    pub operation: String,
}

/// Initialized command state: the loaded configuration and the modules to process.
#[derive(Debug, Clone)]
pub struct ModuleCommandContext {
    pub config: ProjectConfig,
    pub modules: Vec<ModuleInfo>,
}

/// Sets up a module command rooted at the current working directory.
pub fn prepare_module_command(cfg: &ModuleCommandConfig) -> Result<Option<ModuleCommandContext>> {
    let root = env::current_dir().context("failed to get working directory")?;
    prepare_module_command_in(&root, cfg)
}

/// Prints the header, loads configuration, discovers and filters modules.
///
/// Returns `Ok(None)` when there is nothing to process (no modules, or all excluded);
/// whether that is an error is up to the caller.
pub fn prepare_module_command_in(root: &Path, cfg: &ModuleCommandConfig) -> Result<Option<ModuleCommandContext>> {
    report::header(&cfg.header);

    let config = config_loader::load_project_config(root).context("failed to get config")?;
    let modules = discovery::find_all_modules_in(root).context("failed to discover modules")?;

    if modules.is_empty() {
        report::warn("No Go modules found");
        return Ok(None);
    }
    if modules.len() > 1 {
        report::info(&format!("Found {} Go modules", modules.len()));
    }

    let modules = filter_modules_for_processing(modules, &config, &cfg.operation);
    if modules.is_empty() {
        report::warn(&format!("No modules to process for {} after exclusions", cfg.operation));
        return Ok(None);
    }

    Ok(Some(ModuleCommandContext { config, modules }))
}

/// Drops modules whose short name is listed in `modules.exclude`.
pub fn filter_modules_for_processing(
    modules: Vec<ModuleInfo>,
    config: &ProjectConfig,
    operation: &str,
) -> Vec<ModuleInfo> {
    if config.modules.exclude.is_empty() {
        return modules;
    }
    modules
        .into_iter()
        .filter(|module| {
            let excluded = config.modules.exclude.iter().any(|name| *name == module.name);
            if excluded {
                report::info(&format!("Skipping module {} (excluded from {})", module.name, operation));
            }
            !excluded
        })
        .collect()
}

// --- Aggregated errors ---

/// A failure attributed to one module.
#[derive(Debug)]
pub struct ModuleError {
    pub module: ModuleInfo,
    pub error: anyhow::Error,
}

/// Every module failure from one multi-module operation.
#[derive(Error, Debug)]
#[error("{}", render_module_errors(.0))]
pub struct ModuleErrors(pub Vec<ModuleError>);

impl ModuleErrors {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Relative paths of the failed modules, in failure order.
    pub fn failed_modules(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.module.relative.as_str()).collect()
    }
}

fn render_module_errors(failures: &[ModuleError]) -> String {
    let mut message = format!("multiple module errors: errors in {} module(s):", failures.len());
    for failure in failures {
        message.push_str(&format!("\n  - {}: {:#}", failure.module.location(), failure.error));
    }
    message
}

// --- Iteration ---

/// Labels used while iterating modules.
#[derive(Debug, Clone)]
pub struct ModuleIteratorOptions {
    /// E.g. "Linting", "Running tests for".
    pub operation: String,
    /// Success verb for the overall line, e.g. "passed" or "completed".
    pub verb: String,
    /// Stop at the first failing module. Only sequential iteration honours it.
    pub fail_fast: bool,
}

impl Default for ModuleIteratorOptions {
    fn default() -> Self {
        Self {
            operation: "Running".to_string(),
            verb: "passed".to_string(),
            fail_fast: false,
        }
    }
}

pub fn display_module_header(module: &ModuleInfo, operation: &str) {
    if module.is_root {
        report::info(&format!("\n{} main module...", operation));
    } else {
        report::info(&format!("\n{} module in {}...", operation, module.relative));
    }
}

pub fn display_module_completion(module: &ModuleInfo, operation: &str, elapsed: Duration, failed: bool) {
    let duration = report::format_duration(elapsed);
    if failed {
        report::error(&format!("{} failed for {} in {}", operation, module.relative, duration));
    } else {
        report::success(&format!("{} passed for {} in {}", operation, module.relative, duration));
    }
}

pub fn display_overall_completion(operation: &str, verb: &str, elapsed: Duration) {
    report::success(&format!(
        "All {} {} in {}",
        operation.to_lowercase(),
        verb,
        report::format_duration(elapsed)
    ));
}

fn finish(
    modules_total: usize,
    failures: Vec<ModuleError>,
    opts: &ModuleIteratorOptions,
    started: Instant,
) -> Result<(), ModuleErrors> {
    if failures.is_empty() {
        display_overall_completion(&opts.operation, &opts.verb, started.elapsed());
        return Ok(());
    }
    report::error(&format!(
        "{} failed in {}/{} modules",
        opts.operation,
        failures.len(),
        modules_total
    ));
    Err(ModuleErrors(failures))
}

/// Runs `action` for each module in order. Every failure is collected unless `opts.fail_fast` is set.
pub fn for_each_module<F>(modules: &[ModuleInfo], opts: &ModuleIteratorOptions, action: F) -> Result<(), ModuleErrors>
where
    F: Fn(&ModuleInfo) -> Result<()>,
{
    let started = Instant::now();
    let mut failures = Vec::new();

    for (index, module) in modules.iter().enumerate() {
        display_module_header(module, &opts.operation);
        let module_started = Instant::now();
        let result = action(module);
        display_module_completion(module, &opts.operation, module_started.elapsed(), result.is_err());
        if let Err(error) = result {
            failures.push(ModuleError {
                module: module.clone(),
                error,
            });
            if opts.fail_fast {
                let remaining = modules.len() - index - 1;
                if remaining > 0 {
                    report::warn(&format!("Stopping after first failure; {} module(s) skipped", remaining));
                }
                break;
            }
        }
    }

    finish(modules.len(), failures, opts, started)
}

/// Like `for_each_module`, but runs the actions on the rayon pool.
///
/// Completion lines are printed in input order once all modules are done. The action
/// must be safe to run concurrently; commands routed through `module_runner` are.
pub fn for_each_module_parallel<F>(
    modules: &[ModuleInfo],
    opts: &ModuleIteratorOptions,
    action: F,
) -> Result<(), ModuleErrors>
where
    F: Fn(&ModuleInfo) -> Result<()> + Sync,
{
    let started = Instant::now();
    report::info(&format!("\n{} {} module(s) in parallel...", opts.operation, modules.len()));

    let outcomes: Vec<(Duration, Result<()>)> = modules
        .par_iter()
        .map(|module| {
            let module_started = Instant::now();
            let result = action(module);
            (module_started.elapsed(), result)
        })
        .collect();

    let mut failures = Vec::new();
    for (module, (elapsed, result)) in modules.iter().zip(outcomes) {
        display_module_completion(module, &opts.operation, elapsed, result.is_err());
        if let Err(error) = result {
            failures.push(ModuleError {
                module: module.clone(),
                error,
            });
        }
    }

    finish(modules.len(), failures, opts, started)
}

/// Prints the modules in execution order with their local dependencies.
pub fn display_module_summary(order: &DependencyOrder) {
    report::info(&format!("\nFound {} modules (dependency order):", order.modules.len()));
    for (i, module) in order.modules.iter().enumerate() {
        let location = if module.is_root {
            "./".to_string()
        } else {
            format!("./{}", module.relative)
        };
        let deps = order
            .dependencies
            .get(&module.module)
            .filter(|deps| !deps.is_empty());
        match deps {
            Some(deps) => {
                let short: Vec<&str> = deps.iter().map(|d| short_module_name(d)).collect();
                report::info(&format!(
                    "  {}. {:<20} ({}) → depends on: {}",
                    i + 1,
                    location,
                    module.module,
                    short.join(", ")
                ));
            }
            None => report::info(&format!("  {}. {:<20} ({})", i + 1, location, module.module)),
        }
    }
    if order.cycle_detected {
        report::warn("Circular dependencies detected; modules are listed in root-first order");
    }
}
