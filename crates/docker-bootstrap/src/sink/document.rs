//! Schema of the generated logging configuration.

use bootstrap_config::LogLevel;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Schema revision written by this crate.
pub const DOCUMENT_VERSION: u32 = 1;

/// Logging configuration document shared by the bootstrapper and the sink.
///
/// The bootstrapper serialises it to YAML; programs running under the
/// supervisor load it back through [`crate::sink::setup_logging`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingDocument {
    /// Schema revision; only [`DOCUMENT_VERSION`] is understood.
    pub version: u32,
    /// Minimum severity routed to any destination.
    pub level: LogLevel,
    /// Console destination.
    pub console: ConsoleSection,
    /// Syslog destination.
    pub syslog: SyslogSection,
}

/// Console destination settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSection {
    /// Whether records are written to standard error.
    pub enabled: bool,
}

/// Syslog destination settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyslogSection {
    /// Whether records are sent to the relay socket.
    pub enabled: bool,
    /// Datagram socket the relay listens on.
    pub socket: Utf8PathBuf,
}

/// Errors raised while encoding or decoding a [`LoggingDocument`].
#[derive(Debug, Error)]
pub enum DocumentError {
    /// YAML serialisation failed.
    #[error("failed to serialise logging document: {message}")]
    Serialise {
        /// Serialiser message.
        message: String,
    },
    /// YAML parsing failed.
    #[error("failed to parse logging document: {message}")]
    Parse {
        /// Parser message.
        message: String,
    },
    /// The document was written by an incompatible schema revision.
    #[error("unsupported logging document version {found} (expected {DOCUMENT_VERSION})")]
    UnsupportedVersion {
        /// Version found in the document.
        found: u32,
    },
}

impl LoggingDocument {
    /// Builds a current-revision document.
    #[must_use]
    pub fn new(level: LogLevel, console: bool, syslog: bool, socket: Utf8PathBuf) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            level,
            console: ConsoleSection { enabled: console },
            syslog: SyslogSection {
                enabled: syslog,
                socket,
            },
        }
    }

    /// Serialises the document to YAML.
    pub fn to_yaml(&self) -> Result<String, DocumentError> {
        serde_saphyr::to_string(self).map_err(|error| DocumentError::Serialise {
            message: error.to_string(),
        })
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml(text: &str) -> Result<Self, DocumentError> {
        let document: Self = serde_saphyr::from_str(text).map_err(|error| DocumentError::Parse {
            message: error.to_string(),
        })?;
        if document.version != DOCUMENT_VERSION {
            return Err(DocumentError::UnsupportedVersion {
                found: document.version,
            });
        }
        Ok(document)
    }
}
