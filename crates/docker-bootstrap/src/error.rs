//! Errors surfaced by the bootstrap sequence.

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::artifacts::{RenderError, TemplateId};
use crate::handoff::HandoffError;
use crate::relay::{RelayExit, RelayOutput, RelaySpawnError};

/// Terminal failures of [`crate::bootstrap`].
///
/// Relay failures carry the relay's drained output, available through
/// [`BootstrapError::diagnostics`].
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// A template could not be rendered.
    #[error("failed to render {template}: {source}")]
    ConfigurationRender {
        /// Template being rendered.
        template: TemplateId,
        /// Rendering failure.
        #[source]
        source: RenderError,
    },
    /// A rendered artefact could not be written.
    #[error("failed to write {path}: {source}")]
    ArtifactWrite {
        /// Destination path.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The relay process could not be started.
    #[error("failed to start relay '{binary}': {source}")]
    RelaySpawn {
        /// Relay executable.
        binary: String,
        /// Spawn failure.
        #[source]
        source: RelaySpawnError,
        /// Always empty; nothing ran.
        diagnostics: RelayOutput,
    },
    /// The relay socket never appeared.
    #[error("could not find relay socket {socket} after {attempts} checks")]
    RelayReadinessTimeout {
        /// Socket path that was polled.
        socket: Utf8PathBuf,
        /// Checks performed.
        attempts: u32,
        /// Relay output captured up to termination.
        diagnostics: RelayOutput,
    },
    /// The relay exited unsuccessfully before becoming ready.
    #[error("relay exited before becoming ready ({exit})")]
    RelayExited {
        /// Observed exit.
        exit: RelayExit,
        /// Relay output.
        diagnostics: RelayOutput,
    },
    /// The relay's status could not be queried.
    #[error("failed to monitor relay: {source}")]
    RelayMonitor {
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
        /// Relay output captured up to termination.
        diagnostics: RelayOutput,
    },
    /// Control could not be transferred to the supervisor.
    #[error(transparent)]
    Handoff(#[from] HandoffError),
}

impl BootstrapError {
    /// Relay output attached to relay failures.
    #[must_use]
    pub fn diagnostics(&self) -> Option<&RelayOutput> {
        match self {
            Self::RelaySpawn { diagnostics, .. }
            | Self::RelayReadinessTimeout { diagnostics, .. }
            | Self::RelayExited { diagnostics, .. }
            | Self::RelayMonitor { diagnostics, .. } => Some(diagnostics),
            Self::ConfigurationRender { .. } | Self::ArtifactWrite { .. } | Self::Handoff(_) => {
                None
            }
        }
    }
}
