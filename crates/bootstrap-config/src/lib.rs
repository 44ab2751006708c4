//! Shared configuration for the container bootstrapper.
//!
//! [`BootstrapConfig`] is loaded once at startup through `ortho_config`, which
//! layers built-in defaults, an optional configuration file, `BOOTSTRAP_*`
//! environment variables and command-line flags (highest precedence). The
//! resulting value is an immutable snapshot: the bootstrap sequence only ever
//! borrows it.
//!
//! | Key | Environment | Default |
//! |-----|-------------|---------|
//! | `log_level` | `BOOTSTRAP_LOG_LEVEL` | `INFO` |
//! | `log_format` | `BOOTSTRAP_LOG_FORMAT` | `compact` |
//! | `console` | `BOOTSTRAP_CONSOLE` | `true` |
//! | `rsyslog` | `BOOTSTRAP_RSYSLOG` | `true` |
//! | `logging` | `BOOTSTRAP_LOGGING` | `true` |
//! | `handoff` | `BOOTSTRAP_HANDOFF` | `true` |
//! | `logentries_token` | `BOOTSTRAP_LOGENTRIES_TOKEN` | unset |
//! | `rsyslog_debug` | `BOOTSTRAP_RSYSLOG_DEBUG` | `false` |
//! | `relay_binary` | `BOOTSTRAP_RELAY_BINARY` | `rsyslogd` |
//! | `logging_config_path` | `BOOTSTRAP_LOGGING_CONFIG_PATH` | `logging.conf` |
//! | `relay_config_path` | `BOOTSTRAP_RELAY_CONFIG_PATH` | `/rsyslog.conf` |
//! | `relay_pid_path` | `BOOTSTRAP_RELAY_PID_PATH` | `/rsyslog.pid` |
//! | `relay_socket_path` | `BOOTSTRAP_RELAY_SOCKET_PATH` | `/dev/log` |
//!
//! The on/off keys are [`Toggle`] values and always take an argument on the
//! command line (`--rsyslog false`). An omitted flag leaves the lower layers
//! in charge.

mod defaults;
mod logging;
mod toggle;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOGGING_CONFIG_PATH, DEFAULT_RELAY_BINARY, DEFAULT_RELAY_CONFIG_PATH,
    DEFAULT_RELAY_PID_PATH, DEFAULT_RELAY_SOCKET_PATH, ENV_PREFIX, default_disabled,
    default_enabled, default_log_format, default_log_level, default_logging_config_path,
    default_relay_binary, default_relay_config_path, default_relay_pid_path,
    default_relay_socket_path,
};
pub use logging::{LogFormat, LogLevel, LogSettingParseError};
pub use toggle::Toggle;

/// Immutable snapshot of the inputs driving a bootstrap run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "BOOTSTRAP")]
pub struct BootstrapConfig {
    /// Severity threshold written into the logging configuration.
    #[serde(default = "default_log_level")]
    #[ortho_config(default = default_log_level())]
    pub log_level: LogLevel,
    /// Output format for the bootstrapper's own diagnostics.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Whether the logging configuration routes records to the console.
    #[serde(default = "default_enabled")]
    #[ortho_config(default = default_enabled())]
    pub console: Toggle,
    /// Whether the syslog relay is launched and used as a log sink.
    #[serde(default = "default_enabled")]
    #[ortho_config(default = default_enabled())]
    pub rsyslog: Toggle,
    /// Whether the logging configuration artefact is generated at all.
    #[serde(default = "default_enabled")]
    #[ortho_config(default = default_enabled())]
    pub logging: Toggle,
    /// Whether the process hands off to the supervisor once prepared.
    #[serde(default = "default_enabled")]
    #[ortho_config(default = default_enabled())]
    pub handoff: Toggle,
    /// Credential token for forwarding relay output to Logentries.
    #[serde(default)]
    pub logentries_token: Option<String>,
    /// Enables verbose relay output for local debugging.
    #[serde(default = "default_disabled")]
    #[ortho_config(default = default_disabled())]
    pub rsyslog_debug: Toggle,
    /// Relay executable, resolved through `PATH` when not absolute.
    #[serde(default = "default_relay_binary")]
    #[ortho_config(default = default_relay_binary())]
    pub relay_binary: String,
    /// Destination of the generated logging configuration.
    #[serde(default = "default_logging_config_path")]
    #[ortho_config(default = default_logging_config_path())]
    pub logging_config_path: Utf8PathBuf,
    /// Destination of the generated relay configuration.
    #[serde(default = "default_relay_config_path")]
    #[ortho_config(default = default_relay_config_path())]
    pub relay_config_path: Utf8PathBuf,
    /// Pid file handed to the relay.
    #[serde(default = "default_relay_pid_path")]
    #[ortho_config(default = default_relay_pid_path())]
    pub relay_pid_path: Utf8PathBuf,
    /// Socket whose appearance signals relay readiness.
    #[serde(default = "default_relay_socket_path")]
    #[ortho_config(default = default_relay_socket_path())]
    pub relay_socket_path: Utf8PathBuf,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            console: Toggle::On,
            rsyslog: Toggle::On,
            logging: Toggle::On,
            handoff: Toggle::On,
            logentries_token: None,
            rsyslog_debug: Toggle::Off,
            relay_binary: default_relay_binary(),
            logging_config_path: default_logging_config_path(),
            relay_config_path: default_relay_config_path(),
            relay_pid_path: default_relay_pid_path(),
            relay_socket_path: default_relay_socket_path(),
        }
    }
}

impl BootstrapConfig {
    /// Severity threshold for the generated logging configuration.
    #[must_use]
    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    /// Output format for the bootstrapper's own diagnostics.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Whether the generated logging configuration writes to the console.
    #[must_use]
    pub fn console_enabled(&self) -> bool {
        self.console.is_on()
    }

    /// Whether the relay is launched.
    #[must_use]
    pub fn relay_enabled(&self) -> bool {
        self.rsyslog.is_on()
    }

    /// Whether the logging configuration is generated.
    #[must_use]
    pub fn logging_enabled(&self) -> bool {
        self.logging.is_on()
    }

    /// Whether the supervisor handoff is performed.
    #[must_use]
    pub fn handoff_enabled(&self) -> bool {
        self.handoff.is_on()
    }

    /// Logentries credential token, when configured and non-blank.
    #[must_use]
    pub fn logentries_token(&self) -> Option<&str> {
        self.logentries_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    /// Whether relay debugging is enabled.
    #[must_use]
    pub fn relay_debug(&self) -> bool {
        self.rsyslog_debug.is_on()
    }

    /// Relay executable name or path.
    #[must_use]
    pub fn relay_binary(&self) -> &str {
        &self.relay_binary
    }

    /// Destination of the generated logging configuration.
    #[must_use]
    pub fn logging_config_path(&self) -> &Utf8Path {
        &self.logging_config_path
    }

    /// Destination of the generated relay configuration.
    #[must_use]
    pub fn relay_config_path(&self) -> &Utf8Path {
        &self.relay_config_path
    }

    /// Pid file handed to the relay.
    #[must_use]
    pub fn relay_pid_path(&self) -> &Utf8Path {
        &self.relay_pid_path
    }

    /// Socket whose appearance signals relay readiness.
    #[must_use]
    pub fn relay_socket_path(&self) -> &Utf8Path {
        &self.relay_socket_path
    }
}
