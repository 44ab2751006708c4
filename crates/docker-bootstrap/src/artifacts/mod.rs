//! Generated configuration artefacts.
//!
//! - [`context`] gathers the named values each template consumes.
//! - [`render`] turns a template identifier and context into text.
//! - [`store`] persists the rendered payload with full-overwrite semantics.

pub mod context;
mod render;
mod store;

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

pub use context::{ContextValue, TemplateContext};
pub use render::{BuiltinRenderer, TemplateRenderer};
pub use store::{ArtifactStore, FsArtifactStore};

/// Templates known to the bootstrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateId {
    /// Logging configuration loaded by programs under the supervisor.
    LoggingConfig,
    /// Configuration file passed to the relay.
    RelayConfig,
}

impl fmt::Display for TemplateId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoggingConfig => formatter.write_str("logging.conf"),
            Self::RelayConfig => formatter.write_str("rsyslog.conf"),
        }
    }
}

/// Errors reported by a [`TemplateRenderer`].
#[derive(Debug, Error)]
pub enum RenderError {
    /// A value the template requires was absent from the context.
    #[error("template {template} requires value '{key}'")]
    MissingValue {
        /// Template being rendered.
        template: TemplateId,
        /// Name of the missing value.
        key: &'static str,
    },
    /// A value was present with the wrong kind.
    #[error("template {template} expected {expected} value '{key}' but found {found}")]
    UnexpectedKind {
        /// Template being rendered.
        template: TemplateId,
        /// Name of the offending value.
        key: &'static str,
        /// Kind the template expected.
        expected: &'static str,
        /// Kind present in the context.
        found: &'static str,
    },
    /// A value could not be interpreted.
    #[error("template {template} cannot use '{value}' for '{key}'")]
    InvalidValue {
        /// Template being rendered.
        template: TemplateId,
        /// Name of the offending value.
        key: &'static str,
        /// Raw value supplied.
        value: String,
    },
    /// Encoding the rendered document failed.
    #[error("template {template} failed to serialise: {message}")]
    Serialise {
        /// Template being rendered.
        template: TemplateId,
        /// Encoder message.
        message: String,
    },
}

/// A rendered configuration file awaiting persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    path: Utf8PathBuf,
    payload: Vec<u8>,
}

impl RenderedArtifact {
    /// Pairs a destination with its payload.
    #[must_use]
    pub fn new(path: Utf8PathBuf, payload: Vec<u8>) -> Self {
        Self { path, payload }
    }

    /// Renders `template` and targets `path`.
    ///
    /// # Errors
    ///
    /// Returns the renderer's [`RenderError`] when a required value is
    /// missing or has the wrong kind.
    pub fn render(
        renderer: &dyn TemplateRenderer,
        template: TemplateId,
        context: &TemplateContext,
        path: &Utf8Path,
    ) -> Result<Self, RenderError> {
        let text = renderer.render(template, context)?;
        Ok(Self::new(path.to_path_buf(), text.into_bytes()))
    }

    /// Destination path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Payload bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}
