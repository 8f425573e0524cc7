use anyhow::{Context, Result, anyhow};
use clap::Parser;
use colored::Colorize;
use std::path::Path;

use crate::{
    core::{
        dependency_sort,
        orchestrator::{self, ModuleCommandConfig, ModuleIteratorOptions},
        report,
    },
    models::ModuleInfo,
    system::{
        executor::{CommandRunner, display_command},
        module_runner,
    },
};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Runs a command in every module of the workspace."
)]
struct RunArgs {
    /// Run modules after the local modules they depend on.
    #[arg(long)]
    ordered: bool,

    /// Run all modules concurrently.
    #[arg(long, conflicts_with = "ordered")]
    parallel: bool,

    /// Stop at the first module that fails.
    #[arg(long, conflicts_with = "parallel")]
    fail_fast: bool,

    /// Print the dependency order and exit without running anything.
    #[arg(long)]
    dry_run: bool,

    /// Label used in progress and summary lines.
    #[arg(long, default_value = "Running")]
    operation: String,

    /// The command to run. A single quoted argument is split shell-style.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

/// Splits the command into program and arguments. `"go test ./..."` as one argument is accepted.
fn split_command(mut command: Vec<String>) -> Result<(String, Vec<String>)> {
    if command.len() == 1 {
        let line = command.remove(0);
        command = shlex::split(&line).ok_or_else(|| anyhow!("Command could not be parsed: {}", line))?;
    }
    let mut parts = command.into_iter();
    let program = parts.next().ok_or_else(|| anyhow!("No command specified to run."))?;
    Ok((program, parts.collect()))
}

pub fn handle(root: &Path, args: Vec<String>, runner: &dyn CommandRunner) -> Result<()> {
    // 1. Parse this handler's specific arguments.
    let run_args = RunArgs::try_parse_from(&args)?;
    let (program, program_args) = split_command(run_args.command)?;
    let command_line = display_command(&program, &program_args);

    // 2. Discover and filter modules.
    let cfg = ModuleCommandConfig {
        header: format!("{} '{}'", run_args.operation, command_line),
        operation: run_args.operation.to_lowercase(),
    };
    let Some(ctx) = orchestrator::prepare_module_command_in(root, &cfg)? else {
        println!("{}", "No modules to process. Nothing to execute.".yellow());
        return Ok(());
    };

    // 3. Order by local dependencies when asked to. A dry run stops after the summary.
    let modules = if run_args.ordered || run_args.dry_run {
        let order = dependency_sort::sort_modules_by_dependency(ctx.modules)
            .context("failed to sort modules by dependency")?;
        orchestrator::display_module_summary(&order);
        if run_args.dry_run {
            report::info("Dry-run mode: no commands will be run");
            return Ok(());
        }
        order.modules
    } else {
        ctx.modules
    };

    // 4. Run the command in each module.
    let opts = ModuleIteratorOptions {
        operation: run_args.operation,
        verb: "passed".to_string(),
        fail_fast: run_args.fail_fast,
    };
    let action = |module: &ModuleInfo| -> Result<()> {
        module_runner::run_command_in_module(module, runner, &program, &program_args)?;
        Ok(())
    };
    let outcome = if run_args.parallel {
        orchestrator::for_each_module_parallel(&modules, &opts, action)
    } else {
        orchestrator::for_each_module(&modules, &opts, action)
    };

    outcome.map_err(anyhow::Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::orchestrator::ModuleErrors,
        system::executor::{DirRunner, ExecutionError},
    };
    use std::{fs, path::PathBuf, sync::Mutex};
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeRunner {
        runs: Mutex<Vec<(PathBuf, String, Vec<String>)>>,
        fail_in: Option<&'static str>,
    }

    impl CommandRunner for FakeRunner {
        fn run_cmd(&self, _program: &str, _args: &[String]) -> Result<(), ExecutionError> {
            unreachable!("FakeRunner always runs in a directory")
        }

        fn run_cmd_output(&self, _program: &str, _args: &[String]) -> Result<String, ExecutionError> {
            unreachable!("FakeRunner always runs in a directory")
        }

        fn as_dir_runner(&self) -> Option<&dyn DirRunner> {
            Some(self)
        }
    }

    impl DirRunner for FakeRunner {
        fn run_cmd_in_dir(&self, dir: &Path, program: &str, args: &[String]) -> Result<(), ExecutionError> {
            self.runs
                .lock()
                .unwrap()
                .push((dir.to_path_buf(), program.to_string(), args.to_vec()));
            if self.fail_in.is_some_and(|name| dir.ends_with(name)) {
                return Err(ExecutionError::NonZeroExitStatus(program.to_string(), "exit status: 1".into()));
            }
            Ok(())
        }

        fn run_cmd_output_in_dir(&self, _dir: &Path, _program: &str, _args: &[String]) -> Result<String, ExecutionError> {
            Ok(String::new())
        }
    }

    fn workspace() -> TempDir {
        let ws = TempDir::new().unwrap();
        let modules = [
            (".", "module github.com/x/root\nreplace github.com/x/api => ./api\n"),
            ("api", "module github.com/x/api\nreplace github.com/x/core => ../core\n"),
            ("core", "module github.com/x/core\n"),
        ];
        for (relative, content) in modules {
            let dir = ws.path().join(relative);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("go.mod"), content).unwrap();
        }
        ws
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_command_accepts_single_quoted_line() {
        let (program, args) = split_command(strings(&["go test -run 'Test A' ./..."])).unwrap();
        assert_eq!(program, "go");
        assert_eq!(args, strings(&["test", "-run", "Test A", "./..."]));

        let (program, args) = split_command(strings(&["go", "vet"])).unwrap();
        assert_eq!((program.as_str(), args), ("go", strings(&["vet"])));
    }

    #[test]
    fn test_ordered_run_follows_dependencies() {
        let ws = workspace();
        let runner = FakeRunner::default();
        handle(ws.path(), strings(&["--ordered", "go", "build", "./..."]), &runner).unwrap();

        let runs = runner.runs.lock().unwrap();
        let dirs: Vec<PathBuf> = runs.iter().map(|(d, _, _)| d.clone()).collect();
        assert_eq!(
            dirs,
            vec![ws.path().join("core"), ws.path().join("api"), ws.path().to_path_buf()]
        );
        assert!(runs.iter().all(|(_, p, a)| p == "go" && *a == strings(&["build", "./..."])));
    }

    #[test]
    fn test_default_run_is_root_first() {
        let ws = workspace();
        let runner = FakeRunner::default();
        handle(ws.path(), strings(&["go vet ./..."]), &runner).unwrap();

        let dirs: Vec<PathBuf> = runner.runs.lock().unwrap().iter().map(|(d, _, _)| d.clone()).collect();
        assert_eq!(
            dirs,
            vec![ws.path().to_path_buf(), ws.path().join("api"), ws.path().join("core")]
        );
    }

    #[test]
    fn test_failures_are_aggregated() {
        let ws = workspace();
        let runner = FakeRunner {
            fail_in: Some("api"),
            ..Default::default()
        };
        let err = handle(ws.path(), strings(&["--parallel", "go", "test"]), &runner).unwrap_err();

        let module_errors = err.downcast_ref::<ModuleErrors>().unwrap();
        assert_eq!(module_errors.failed_modules(), vec!["api"]);
        assert_eq!(runner.runs.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_fail_fast_skips_dependents_of_a_failed_module() {
        let ws = workspace();
        let runner = FakeRunner {
            fail_in: Some("core"),
            ..Default::default()
        };
        let err = handle(ws.path(), strings(&["--ordered", "--fail-fast", "go", "build"]), &runner).unwrap_err();

        let module_errors = err.downcast_ref::<ModuleErrors>().unwrap();
        assert_eq!(module_errors.failed_modules(), vec!["core"]);
        let runs = runner.runs.lock().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].0, ws.path().join("core"));
    }

    #[test]
    fn test_dry_run_runs_nothing() {
        let ws = workspace();
        let runner = FakeRunner::default();
        handle(ws.path(), strings(&["--dry-run", "go", "build"]), &runner).unwrap();
        assert!(runner.runs.lock().unwrap().is_empty());
    }

    #[test]
    fn test_fail_fast_and_parallel_conflict() {
        let ws = workspace();
        assert!(handle(ws.path(), strings(&["--parallel", "--fail-fast", "go"]), &FakeRunner::default()).is_err());
    }

    #[test]
    fn test_ordered_and_parallel_conflict() {
        let ws = workspace();
        assert!(handle(ws.path(), strings(&["--ordered", "--parallel", "go"]), &FakeRunner::default()).is_err());
    }
}
