//! The bootstrapper's own diagnostics.
//!
//! These go to stderr of the bootstrap process and disappear with it at the
//! handoff; supervised programs configure their logging from the generated
//! `logging.conf` through [`crate::sink::setup_logging`] instead.

use std::io::{self, IsTerminal};

use bootstrap_config::{BootstrapConfig, LogFormat, LogLevel};
use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

const TELEMETRY_TARGET: &str = "docker_bootstrap::telemetry";

static INSTALLED: OnceCell<TelemetryHandle> = OnceCell::new();

/// Settings the diagnostics subscriber was installed with.
///
/// The first successful [`initialise`] call fixes these for the lifetime of
/// the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle {
    level: LogLevel,
    format: LogFormat,
}

impl TelemetryHandle {
    /// Threshold applied to the bootstrapper's events.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }

    /// Output format of the bootstrapper's events.
    #[must_use]
    pub const fn format(&self) -> LogFormat {
        self.format
    }
}

/// Errors raised while installing the diagnostics subscriber.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The level could not be turned into a filter.
    #[error("invalid diagnostics filter: {0}")]
    Filter(String),
    /// Some other subscriber already owns the global default.
    #[error("failed to install diagnostics subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global diagnostics subscriber for the bootstrap run.
///
/// Events at or above the configured level are written to stderr, as JSON
/// lines or compact text, with colour only when stderr is a terminal. Once
/// installed, repeated calls return the original [`TelemetryHandle`] and
/// ignore the new configuration.
///
/// # Examples
///
/// ```rust
/// use bootstrap_config::{BootstrapConfig, LogFormat, LogLevel};
/// use docker_bootstrap::telemetry;
///
/// # fn main() -> Result<(), docker_bootstrap::telemetry::TelemetryError> {
/// let config = BootstrapConfig {
///     log_level: LogLevel::Debug,
///     log_format: LogFormat::Json,
///     ..BootstrapConfig::default()
/// };
/// let handle = telemetry::initialise(&config)?;
/// assert_eq!(handle.format(), LogFormat::Json);
///
/// let again = telemetry::initialise(&BootstrapConfig::default())?;
/// assert_eq!(again, handle);
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter cannot be built or another
/// global subscriber is already installed.
pub fn initialise(config: &BootstrapConfig) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED
        .get_or_try_init(|| {
            let handle = TelemetryHandle {
                level: config.log_level(),
                format: config.log_format(),
            };
            install(handle)?;
            tracing::debug!(
                target: TELEMETRY_TARGET,
                level = %handle.level,
                format = ?handle.format,
                "bootstrap diagnostics enabled"
            );
            Ok(handle)
        })
        .copied()
}

fn diagnostics_filter(level: LogLevel) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(level.filter_directive())
        .map_err(|error| TelemetryError::Filter(error.to_string()))
}

fn install(handle: TelemetryHandle) -> Result<(), TelemetryError> {
    let filter = diagnostics_filter(handle.level)?;
    let stderr_is_terminal = io::stderr().is_terminal();

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .with_ansi(stderr_is_terminal)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match handle.format {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}
