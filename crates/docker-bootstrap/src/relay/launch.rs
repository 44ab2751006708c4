//! Spawning the relay child.

use std::process::{Child, Command, Stdio};

use bootstrap_config::BootstrapConfig;
use camino::{Utf8Path, Utf8PathBuf};

use super::handle::RelayProcessHandle;
use super::output::StreamCapture;
use super::{RELAY_TARGET, RelayLauncher, RelayProcess, RelaySpawnError};

/// Command line used to start the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayCommand {
    binary: String,
    pid_path: Utf8PathBuf,
    config_path: Utf8PathBuf,
}

impl RelayCommand {
    /// Builds the command for `binary` with explicit pid and config paths.
    #[must_use]
    pub fn new(binary: impl Into<String>, pid_path: &Utf8Path, config_path: &Utf8Path) -> Self {
        Self {
            binary: binary.into(),
            pid_path: pid_path.to_path_buf(),
            config_path: config_path.to_path_buf(),
        }
    }

    /// Builds the command described by `config`.
    #[must_use]
    pub fn from_config(config: &BootstrapConfig) -> Self {
        Self::new(
            config.relay_binary(),
            config.relay_pid_path(),
            config.relay_config_path(),
        )
    }

    /// Executable, resolved through `PATH` when not absolute.
    #[must_use]
    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Arguments passed to the executable: `-i <pid> -f <config>`.
    #[must_use]
    pub fn args(&self) -> [&str; 4] {
        ["-i", self.pid_path.as_str(), "-f", self.config_path.as_str()]
    }
}

/// Launcher that spawns the relay with both output streams piped.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRelayLauncher;

impl RelayLauncher for SystemRelayLauncher {
    fn launch(&self, command: &RelayCommand) -> Result<Box<dyn RelayProcess>, RelaySpawnError> {
        tracing::debug!(
            target: RELAY_TARGET,
            binary = command.binary(),
            args = ?command.args(),
            "spawning relay"
        );
        let mut child = Command::new(command.binary())
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(RelaySpawnError::Spawn)?;

        match capture_streams(&mut child) {
            Ok((stdout, stderr)) => Ok(Box::new(RelayProcessHandle::new(child, stdout, stderr))),
            Err(error) => {
                abandon(&mut child);
                Err(error)
            }
        }
    }
}

fn capture_streams(child: &mut Child) -> Result<(StreamCapture, StreamCapture), RelaySpawnError> {
    let stdout = child
        .stdout
        .take()
        .ok_or(RelaySpawnError::MissingPipe { stream: "stdout" })?;
    let stderr = child
        .stderr
        .take()
        .ok_or(RelaySpawnError::MissingPipe { stream: "stderr" })?;
    let stdout = StreamCapture::spawn("stdout", stdout).map_err(RelaySpawnError::Reader)?;
    let stderr = StreamCapture::spawn("stderr", stderr).map_err(RelaySpawnError::Reader)?;
    Ok((stdout, stderr))
}

/// Kills and reaps a child whose output could not be captured.
fn abandon(child: &mut Child) {
    if let Err(error) = child.kill() {
        tracing::warn!(target: RELAY_TARGET, %error, "failed to signal relay");
    }
    if let Err(error) = child.wait() {
        tracing::warn!(target: RELAY_TARGET, %error, "failed to reap relay");
    }
}
