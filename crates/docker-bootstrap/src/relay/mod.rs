//! Lifecycle of the syslog relay child.
//!
//! The sequencer launches the relay through a [`RelayLauncher`] and then owns
//! the returned [`RelayProcess`] exclusively. Both output streams are drained
//! by background reader threads so a chatty relay can never block on a full
//! pipe; the captured bytes are reported as a [`RelayOutput`] when something
//! goes wrong.

mod handle;
mod launch;
mod output;

use std::fmt;
use std::io;
use std::process::ExitStatus;

use thiserror::Error;

pub use handle::RelayProcessHandle;
pub use launch::{RelayCommand, SystemRelayLauncher};
pub use output::RelayOutput;

pub(crate) const RELAY_TARGET: &str = "docker_bootstrap::relay";

/// Starts the relay.
pub trait RelayLauncher {
    /// Spawns `command` without waiting for it to exit.
    ///
    /// # Errors
    ///
    /// Returns a [`RelaySpawnError`] when the process cannot be started or its
    /// output cannot be captured.
    fn launch(&self, command: &RelayCommand) -> Result<Box<dyn RelayProcess>, RelaySpawnError>;
}

/// A running (or finished) relay child.
pub trait RelayProcess {
    /// Operating system process identifier.
    fn pid(&self) -> u32;

    /// Checks, without blocking, whether the relay has exited.
    ///
    /// Once an exit has been observed the same value is returned on every
    /// subsequent call.
    ///
    /// # Errors
    ///
    /// Propagates failures of the underlying wait call.
    fn poll_exit(&mut self) -> io::Result<Option<RelayExit>>;

    /// Terminates the relay if still running, reaps it and returns everything
    /// it wrote.
    fn collect_output(&mut self) -> RelayOutput;
}

/// Observed termination of the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayExit {
    code: Option<i32>,
}

impl RelayExit {
    /// Wraps an exit code; `None` means the relay was terminated by a signal.
    #[must_use]
    pub const fn new(code: Option<i32>) -> Self {
        Self { code }
    }

    /// Exit code, when the relay exited normally.
    #[must_use]
    pub const fn code(self) -> Option<i32> {
        self.code
    }

    /// Returns `true` for a zero exit code.
    ///
    /// A launcher that forks into the background exits successfully while
    /// the relay itself keeps running.
    #[must_use]
    pub const fn success(self) -> bool {
        matches!(self.code, Some(0))
    }
}

impl From<ExitStatus> for RelayExit {
    fn from(status: ExitStatus) -> Self {
        Self::new(status.code())
    }
}

impl fmt::Display for RelayExit {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(formatter, "exit code {code}"),
            None => formatter.write_str("terminated by signal"),
        }
    }
}

/// Failures raised while starting the relay.
#[derive(Debug, Error)]
pub enum RelaySpawnError {
    /// The operating system refused to start the process.
    #[error("{0}")]
    Spawn(#[source] io::Error),
    /// A piped stream was not available on the child handle.
    #[error("relay {stream} was not captured")]
    MissingPipe {
        /// Stream name.
        stream: &'static str,
    },
    /// A reader thread could not be started.
    #[error("failed to start output reader: {0}")]
    Reader(#[source] io::Error),
}
