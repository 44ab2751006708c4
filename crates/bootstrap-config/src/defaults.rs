use camino::Utf8PathBuf;

use crate::logging::{LogFormat, LogLevel};
use crate::toggle::Toggle;

/// Environment prefix shared by every configuration key.
pub const ENV_PREFIX: &str = "BOOTSTRAP_";

/// Default relay executable.
pub const DEFAULT_RELAY_BINARY: &str = "rsyslogd";

/// Default destination of the generated logging configuration.
pub const DEFAULT_LOGGING_CONFIG_PATH: &str = "logging.conf";

/// Default destination of the generated relay configuration.
pub const DEFAULT_RELAY_CONFIG_PATH: &str = "/rsyslog.conf";

/// Default pid file handed to the relay.
pub const DEFAULT_RELAY_PID_PATH: &str = "/rsyslog.pid";

/// Default socket the relay listens on.
pub const DEFAULT_RELAY_SOCKET_PATH: &str = "/dev/log";

/// Default severity threshold for the generated logging configuration.
pub fn default_log_level() -> LogLevel {
    LogLevel::Info
}

/// Default format for the bootstrapper's own diagnostics.
pub fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Switches that are on unless explicitly turned off.
pub fn default_enabled() -> Toggle {
    Toggle::On
}

/// Switches that are off unless explicitly turned on.
pub fn default_disabled() -> Toggle {
    Toggle::Off
}

/// Owned relay binary name used where allocation is required (e.g. serde).
pub fn default_relay_binary() -> String {
    DEFAULT_RELAY_BINARY.to_owned()
}

/// Default destination of the generated logging configuration.
pub fn default_logging_config_path() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_LOGGING_CONFIG_PATH)
}

/// Default destination of the generated relay configuration.
pub fn default_relay_config_path() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_RELAY_CONFIG_PATH)
}

/// Default pid file handed to the relay.
pub fn default_relay_pid_path() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_RELAY_PID_PATH)
}

/// Default socket the relay listens on.
pub fn default_relay_socket_path() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_RELAY_SOCKET_PATH)
}
