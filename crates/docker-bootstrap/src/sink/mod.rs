//! Logging sink for programs running under the supervisor.
//!
//! The bootstrapper writes a [`LoggingDocument`] before handing off. Rust
//! programs started by the supervisor call [`setup_logging`] with the same
//! path to route their `tracing` output to the console, the relay socket, or
//! both.

mod document;
mod fatal;
#[cfg(unix)]
mod syslog;

use std::fs;
use std::io::{self, IsTerminal};

use camino::{Utf8Path, Utf8PathBuf};
use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;

pub use document::{ConsoleSection, DOCUMENT_VERSION, DocumentError, LoggingDocument, SyslogSection};
pub use fatal::install_fatal_hook;
#[cfg(unix)]
pub use syslog::{SyslogMakeWriter, SyslogWriter, frame, priority, severity_for};

const SINK_TARGET: &str = "docker_bootstrap::sink";

static SINK_GUARD: OnceCell<()> = OnceCell::new();

/// Errors raised while installing the logging sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The logging configuration could not be read.
    #[error("failed to read logging configuration {path}: {source}")]
    Read {
        /// Path that was read.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The logging configuration is not a valid document.
    #[error("invalid logging configuration {path}: {source}")]
    Document {
        /// Path that was read.
        path: Utf8PathBuf,
        /// Decoding failure.
        #[source]
        source: DocumentError,
    },
    /// The derived filter expression was rejected.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// The relay socket writer could not be created.
    #[error("failed to open syslog transport: {0}")]
    Transport(#[source] io::Error),
    /// A global subscriber is already installed.
    #[error("failed to install logging subscriber: {0}")]
    Subscriber(#[source] SetGlobalDefaultError),
}

/// Layers derived from a [`LoggingDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkPlan {
    filter: String,
    console: bool,
    syslog_socket: Option<Utf8PathBuf>,
}

impl SinkPlan {
    /// Builds the plan for `document`.
    #[must_use]
    pub fn from_document(document: &LoggingDocument) -> Self {
        Self {
            filter: String::from(document.level.filter_directive()),
            console: document.console.enabled,
            syslog_socket: document
                .syslog
                .enabled
                .then(|| document.syslog.socket.clone()),
        }
    }

    /// Reads and plans the document stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Read`] or [`SinkError::Document`] when the file is
    /// missing or malformed.
    pub fn load(path: &Utf8Path) -> Result<Self, SinkError> {
        let text = fs::read_to_string(path).map_err(|source| SinkError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let document = LoggingDocument::from_yaml(&text).map_err(|source| SinkError::Document {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_document(&document))
    }

    /// Filter directive applied to every layer.
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Whether records go to standard error.
    #[must_use]
    pub fn console(&self) -> bool {
        self.console
    }

    /// Relay socket receiving records, when enabled.
    #[must_use]
    pub fn syslog_socket(&self) -> Option<&Utf8Path> {
        self.syslog_socket.as_deref()
    }
}

/// Installs the process-wide logging configuration stored at `path`.
///
/// The first successful call installs the subscriber and the fatal hook;
/// later calls return immediately.
///
/// # Errors
///
/// Returns a [`SinkError`] when the document cannot be loaded or the
/// subscriber cannot be installed.
pub fn setup_logging(path: &Utf8Path) -> Result<(), SinkError> {
    SINK_GUARD.get_or_try_init(|| {
        let plan = SinkPlan::load(path)?;
        install(&plan)?;
        install_fatal_hook();
        tracing::debug!(
            target: SINK_TARGET,
            config = %path,
            filter = plan.filter(),
            console = plan.console(),
            syslog = plan.syslog_socket().map(Utf8Path::as_str),
            "logging configured"
        );
        Ok(())
    })?;
    Ok(())
}

fn install(plan: &SinkPlan) -> Result<(), SinkError> {
    let filter =
        EnvFilter::try_new(plan.filter()).map_err(|error| SinkError::Filter(error.to_string()))?;

    let console = plan.console().then(|| {
        fmt::layer()
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
            .with_timer(fmt::time::UtcTime::rfc_3339())
    });

    #[cfg(unix)]
    let syslog = match plan.syslog_socket() {
        Some(socket) => Some(
            SyslogMakeWriter::new(socket, program_tag()).map_err(SinkError::Transport)?,
        ),
        None => None,
    }
    .map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .without_time()
    });
    #[cfg(not(unix))]
    let syslog: Option<tracing_subscriber::layer::Identity> = {
        if plan.syslog_socket().is_some() {
            tracing::warn!(target: SINK_TARGET, "syslog output requires unix sockets; skipped");
        }
        None
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(syslog);

    tracing::subscriber::set_global_default(subscriber).map_err(SinkError::Subscriber)
}

/// Name of the running executable, used as the syslog tag.
#[cfg(unix)]
fn program_tag() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
        .unwrap_or_else(|| String::from("docker-bootstrap"))
}
