use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Severity threshold written into the generated logging configuration.
///
/// The names follow the conventional syslog-style levels understood by the
/// logging sink, so they serialise in upper case.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Deserialize,
    Serialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumString,
    Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum LogLevel {
    /// Verbose diagnostics.
    #[serde(alias = "debug")]
    Debug,
    /// Routine operational messages.
    #[default]
    #[serde(alias = "info")]
    Info,
    /// Recoverable problems.
    #[serde(alias = "warning", alias = "WARN", alias = "warn")]
    #[strum(to_string = "WARNING", serialize = "WARN")]
    Warning,
    /// Failed operations.
    #[serde(alias = "error")]
    Error,
    /// Failures that stop the program.
    #[serde(alias = "critical")]
    Critical,
}

impl LogLevel {
    /// Returns the `tracing` filter directive matching this level.
    ///
    /// `tracing` has no level above `error`, so `Critical` maps onto it.
    #[must_use]
    pub const fn filter_directive(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error | Self::Critical => "error",
        }
    }
}

/// Supported output formats for the bootstrapper's own diagnostics.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    Json,
    /// Human-readable single line output.
    #[default]
    Compact,
}

/// Errors encountered while parsing a [`LogLevel`] or [`LogFormat`] from text.
pub type LogSettingParseError = strum::ParseError;
