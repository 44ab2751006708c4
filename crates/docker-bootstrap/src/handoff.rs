//! Terminal transfer of control to the process supervisor.

use std::io;
use std::process::Command;

use thiserror::Error;

const HANDOFF_TARGET: &str = "docker_bootstrap::handoff";

/// Supervisor executable, resolved through `PATH`.
pub const SUPERVISOR_PROGRAM: &str = "circusd";
/// Supervisor configuration file, relative to the working directory.
pub const SUPERVISOR_CONFIG: &str = "circus.ini";

const SUPERVISOR_ARGS: &[&str] = &[SUPERVISOR_CONFIG];

/// Program and arguments that replace the bootstrapper.
///
/// The target is fixed and does not depend on configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandoffTarget {
    program: &'static str,
    args: &'static [&'static str],
}

impl Default for HandoffTarget {
    fn default() -> Self {
        Self::supervisor()
    }
}

impl HandoffTarget {
    /// The `circusd circus.ini` supervisor invocation.
    #[must_use]
    pub const fn supervisor() -> Self {
        Self {
            program: SUPERVISOR_PROGRAM,
            args: SUPERVISOR_ARGS,
        }
    }

    /// Program name.
    #[must_use]
    pub const fn program(&self) -> &'static str {
        self.program
    }

    /// Program arguments, excluding the program name.
    #[must_use]
    pub const fn args(&self) -> &'static [&'static str] {
        self.args
    }

    fn command(&self) -> Command {
        let mut command = Command::new(self.program);
        command.args(self.args);
        command
    }
}

/// Errors raised when control cannot be transferred.
#[derive(Debug, Error)]
pub enum HandoffError {
    /// Replacing the process image failed.
    #[error("failed to hand off to {program}: {source}")]
    Exec {
        /// Program that could not be started.
        program: &'static str,
        /// Operating system error.
        #[source]
        source: io::Error,
    },
}

/// Irreversible transfer of control.
pub trait Handoff {
    /// Replaces the current process with `target`.
    ///
    /// Production implementations never return `Ok`; only test doubles do.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError`] when the target cannot be started.
    fn hand_off(&self, target: &HandoffTarget) -> Result<(), HandoffError>;
}

/// Handoff that replaces the process image.
///
/// On Unix this is `execvp`; on other platforms the target is spawned, waited
/// for, and its exit code becomes the bootstrapper's.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExecHandoff;

impl Handoff for ExecHandoff {
    fn hand_off(&self, target: &HandoffTarget) -> Result<(), HandoffError> {
        tracing::info!(
            target: HANDOFF_TARGET,
            program = target.program(),
            args = ?target.args(),
            "handing off to supervisor"
        );
        Err(HandoffError::Exec {
            program: target.program(),
            source: replace_process(target),
        })
    }
}

#[cfg(unix)]
fn replace_process(target: &HandoffTarget) -> io::Error {
    use std::os::unix::process::CommandExt;

    target.command().exec()
}

#[cfg(not(unix))]
fn replace_process(target: &HandoffTarget) -> io::Error {
    match target.command().status() {
        Ok(status) => std::process::exit(status.code().unwrap_or(1)),
        Err(error) => error,
    }
}
