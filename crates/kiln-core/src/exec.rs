//! Child process execution.
//!
//! Build tools, git and the privilege helper all run through a
//! [`CommandRunner`]. [`CommandRunner::run`] inherits the caller's stdio so
//! build logs stream live; [`CommandRunner::capture`] is only used for short
//! queries whose stdout is parsed (commit ids, pkg-config flags).

use std::process::{Command, Stdio};
use thiserror::Error;

/// A child process that could not be started or did not succeed.
#[derive(Error, Debug)]
pub enum ExecError {
    /// The program could not be spawned (usually: not installed).
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// Program name.
        program: String,
        /// Underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited unsuccessfully.
    #[error("{program} exited with {}", describe_code(.code))]
    Status {
        /// Program name.
        program: String,
        /// Exit code, or None when killed by a signal.
        code: Option<i32>,
    },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "signal".to_string(),
    }
}

/// Name of the program a command will run, for diagnostics.
pub fn program_name(cmd: &Command) -> String {
    cmd.get_program().to_string_lossy().into_owned()
}

/// Runs child processes to completion.
pub trait CommandRunner: Send + Sync {
    /// Run with inherited stdin/stdout/stderr and wait for exit.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError`] if the program cannot be started or exits non-zero.
    fn run(&self, cmd: &mut Command) -> Result<(), ExecError>;

    /// Run with stdout captured (stderr discarded) and return it as text.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError`] if the program cannot be started or exits non-zero.
    fn capture(&self, cmd: &mut Command) -> Result<String, ExecError>;
}

/// [`CommandRunner`] that spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostRunner;

impl CommandRunner for HostRunner {
    fn run(&self, cmd: &mut Command) -> Result<(), ExecError> {
        let program = program_name(cmd);
        tracing::debug!(?cmd, "running");
        let status = cmd
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| ExecError::Spawn {
                program: program.clone(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(ExecError::Status {
                program,
                code: status.code(),
            })
        }
    }

    fn capture(&self, cmd: &mut Command) -> Result<String, ExecError> {
        let program = program_name(cmd);
        tracing::debug!(?cmd, "capturing");
        let output = cmd
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|source| ExecError::Spawn {
                program: program.clone(),
                source,
            })?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(ExecError::Status {
                program,
                code: output.status.code(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_stdout() {
        let out = HostRunner
            .capture(Command::new("sh").args(["-c", "echo hello"]))
            .unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[test]
    fn test_nonzero_exit_is_status_error() {
        let err = HostRunner
            .capture(Command::new("sh").args(["-c", "exit 3"]))
            .unwrap_err();
        assert!(matches!(err, ExecError::Status { code: Some(3), .. }));
        assert_eq!(err.to_string(), "sh exited with status 3");
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let err = HostRunner
            .run(&mut Command::new("kiln-definitely-not-a-real-program"))
            .unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
    }
}
