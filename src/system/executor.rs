// EN: src/system/executor.rs

use dunce;
use std::path::Path;
use std::process::{Command as StdCommand, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("No command specified to run.")]
    EmptyCommand,
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, std::io::Error),
    #[error("Command '{0}' exited with a non-zero error code ({1}).")]
    NonZeroExitStatus(String, String),
    #[error("Command '{command}' produced output that was not valid UTF-8")]
    InvalidUtf8Output {
        command: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// Runs commands in the current process working directory.
pub trait CommandRunner: Sync {
    /// Runs a command with inherited stdout/stderr.
    fn run_cmd(&self, program: &str, args: &[String]) -> Result<(), ExecutionError>;

    /// Runs a command and returns its captured standard output.
    fn run_cmd_output(&self, program: &str, args: &[String]) -> Result<String, ExecutionError>;

    /// Exposes the directory-scoped capability, if this runner has it.
    fn as_dir_runner(&self) -> Option<&dyn DirRunner> {
        None
    }
}

/// Runs commands in an explicit directory without touching the process working directory.
pub trait DirRunner {
    fn run_cmd_in_dir(&self, dir: &Path, program: &str, args: &[String]) -> Result<(), ExecutionError>;

    fn run_cmd_output_in_dir(
        &self,
        dir: &Path,
        program: &str,
        args: &[String],
    ) -> Result<String, ExecutionError>;
}

/// The process-spawning backend. Supports both plain and directory-scoped execution.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

/// Renders `program args...` for error messages and logs.
pub fn display_command(program: &str, args: &[String]) -> String {
    let parts = std::iter::once(program).chain(args.iter().map(String::as_str));
    shlex::try_join(parts).unwrap_or_else(|_| {
        let mut line = program.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    })
}

fn build_command(cwd: Option<&Path>, program: &str, args: &[String]) -> Result<StdCommand, ExecutionError> {
    if program.trim().is_empty() {
        return Err(ExecutionError::EmptyCommand);
    }
    let mut command = StdCommand::new(program);
    command.args(args);
    if let Some(dir) = cwd {
        command.current_dir(dunce::simplified(dir));
    }
    Ok(command)
}

/// Executes a command to completion with inherited stdio.
fn execute_command(cwd: Option<&Path>, program: &str, args: &[String]) -> Result<(), ExecutionError> {
    let command_line = display_command(program, args);
    log::debug!(
        "Executing '{}'{}",
        command_line,
        cwd.map(|d| format!(" in '{}'", d.display())).unwrap_or_default()
    );

    let status = build_command(cwd, program, args)?
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| ExecutionError::CommandFailed(command_line.clone(), e))?;

    if !status.success() {
        return Err(ExecutionError::NonZeroExitStatus(command_line, status.to_string()));
    }
    Ok(())
}

/// Executes a command and captures its standard output.
/// Stderr is passed through to the user's terminal.
fn execute_and_capture_output(
    cwd: Option<&Path>,
    program: &str,
    args: &[String],
) -> Result<String, ExecutionError> {
    let command_line = display_command(program, args);
    log::debug!("Capturing output of '{}'", command_line);

    let command_output = build_command(cwd, program, args)?
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .output()
        .map_err(|e| ExecutionError::CommandFailed(command_line.clone(), e))?;

    if !command_output.status.success() {
        return Err(ExecutionError::NonZeroExitStatus(
            command_line,
            command_output.status.to_string(),
        ));
    }

    String::from_utf8(command_output.stdout)
        .map(|out| out.trim_end().to_string())
        .map_err(|e| ExecutionError::InvalidUtf8Output {
            command: command_line,
            source: e,
        })
}

impl CommandRunner for SystemRunner {
    fn run_cmd(&self, program: &str, args: &[String]) -> Result<(), ExecutionError> {
        execute_command(None, program, args)
    }

    fn run_cmd_output(&self, program: &str, args: &[String]) -> Result<String, ExecutionError> {
        execute_and_capture_output(None, program, args)
    }

    fn as_dir_runner(&self) -> Option<&dyn DirRunner> {
        Some(self)
    }
}

impl DirRunner for SystemRunner {
    fn run_cmd_in_dir(&self, dir: &Path, program: &str, args: &[String]) -> Result<(), ExecutionError> {
        execute_command(Some(dir), program, args)
    }

    fn run_cmd_output_in_dir(
        &self,
        dir: &Path,
        program: &str,
        args: &[String],
    ) -> Result<String, ExecutionError> {
        execute_and_capture_output(Some(dir), program, args)
    }
}
