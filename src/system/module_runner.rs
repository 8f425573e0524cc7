//! # Module Command Runner
//!
//! Runs an external command with a module's directory as the effective working
//! directory. Runners that can spawn directly into a directory are used as-is;
//! for the rest, the process working directory is changed under a process-wide
//! lock and restored afterwards, which serializes those calls.

use crate::{
    models::ModuleInfo,
    system::executor::{CommandRunner, DirRunner, ExecutionError},
};
use lazy_static::lazy_static;
use std::{
    env,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};
use thiserror::Error;

lazy_static! {
    /// Guards every change of the process working directory made by this module.
    static ref CHDIR_LOCK: Mutex<()> = Mutex::new(());
}

#[derive(Error, Debug)]
pub enum ModuleRunError {
    #[error("failed to get current directory: {0}")]
    CurrentDirectory(#[source] std::io::Error),
    #[error("failed to change to directory {}: {source}", path.display())]
    ChangeDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to run command '{command}' in module {module}: {source}")]
    Command {
        command: String,
        module: String,
        #[source]
        source: ExecutionError,
    },
}

fn run_in_module_dir<T>(
    module: &ModuleInfo,
    runner: &dyn CommandRunner,
    command: &str,
    dir_fn: impl FnOnce(&dyn DirRunner, &Path) -> Result<T, ExecutionError>,
    fallback_fn: impl FnOnce(&dyn CommandRunner) -> Result<T, ExecutionError>,
) -> Result<T, ModuleRunError> {
    let wrap = |source| ModuleRunError::Command {
        command: command.to_string(),
        module: module.relative.clone(),
        source,
    };

    if let Some(dir_runner) = runner.as_dir_runner() {
        return dir_fn(dir_runner, &module.path).map_err(wrap);
    }

    log::trace!("Runner lacks directory support, switching into '{}'", module.path.display());
    let _lock = CHDIR_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

    let original_dir = env::current_dir().map_err(ModuleRunError::CurrentDirectory)?;
    env::set_current_dir(&module.path).map_err(|source| ModuleRunError::ChangeDirectory {
        path: module.path.clone(),
        source,
    })?;

    // Declared after the lock so the directory is restored before the lock is released.
    let _restore = scopeguard::guard(original_dir, |dir| {
        if let Err(e) = env::set_current_dir(&dir) {
            log::error!("Failed to change back to original directory '{}': {}", dir.display(), e);
        }
    });

    fallback_fn(runner).map_err(wrap)
}

/// Runs `program args...` inside `module`'s directory.
pub fn run_command_in_module(
    module: &ModuleInfo,
    runner: &dyn CommandRunner,
    program: &str,
    args: &[String],
) -> Result<(), ModuleRunError> {
    run_in_module_dir(
        module,
        runner,
        program,
        |dir_runner, path| dir_runner.run_cmd_in_dir(path, program, args),
        |runner| runner.run_cmd(program, args),
    )
}

/// Runs `program args...` inside `module`'s directory and returns its standard output.
pub fn run_command_in_module_output(
    module: &ModuleInfo,
    runner: &dyn CommandRunner,
    program: &str,
    args: &[String],
) -> Result<String, ModuleRunError> {
    run_in_module_dir(
        module,
        runner,
        program,
        |dir_runner, path| dir_runner.run_cmd_output_in_dir(path, program, args),
        |runner| runner.run_cmd_output(program, args),
    )
}
