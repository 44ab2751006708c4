//! Named values handed to the template renderer.

use std::collections::BTreeMap;

use bootstrap_config::BootstrapConfig;

use super::{RenderError, TemplateId};

/// Severity threshold, as text.
pub const LOG_LEVEL: &str = "log_level";
/// Path of the relay socket.
pub const SYSLOG_SOCKET: &str = "syslog_socket";
/// Console logging toggle.
pub const CONSOLE: &str = "console";
/// Relay logging toggle.
pub const RSYSLOG: &str = "rsyslog";
/// Optional Logentries credential token.
pub const LOGENTRIES_TOKEN: &str = "logentries_token";
/// Relay debug toggle.
pub const RSYSLOG_DEBUG: &str = "rsyslog_debug";

/// A single value stored in a [`TemplateContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextValue {
    /// Free-form text.
    Text(String),
    /// Boolean toggle.
    Flag(bool),
}

impl ContextValue {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Flag(_) => "flag",
        }
    }
}

/// Ordered mapping of named values consumed by a renderer.
///
/// The map is ordered so rendering never depends on insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateContext {
    values: BTreeMap<&'static str, ContextValue>,
}

impl TemplateContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Values consumed by the logging configuration template.
    #[must_use]
    pub fn for_logging(config: &BootstrapConfig) -> Self {
        Self::new()
            .with_text(LOG_LEVEL, config.log_level().to_string())
            .with_text(SYSLOG_SOCKET, config.relay_socket_path().as_str())
            .with_flag(CONSOLE, config.console_enabled())
            .with_flag(RSYSLOG, config.relay_enabled())
    }

    /// Values consumed by the relay configuration template.
    #[must_use]
    pub fn for_relay(config: &BootstrapConfig) -> Self {
        Self::new()
            .with_text(SYSLOG_SOCKET, config.relay_socket_path().as_str())
            .with_flag(RSYSLOG_DEBUG, config.relay_debug())
            .with_optional_text(LOGENTRIES_TOKEN, config.logentries_token())
    }

    /// Adds or replaces a text value.
    #[must_use]
    pub fn with_text(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.values.insert(key, ContextValue::Text(value.into()));
        self
    }

    /// Adds or replaces a boolean value.
    #[must_use]
    pub fn with_flag(mut self, key: &'static str, value: bool) -> Self {
        self.values.insert(key, ContextValue::Flag(value));
        self
    }

    /// Adds a text value only when one is present.
    #[must_use]
    pub fn with_optional_text(self, key: &'static str, value: Option<&str>) -> Self {
        match value {
            Some(text) => self.with_text(key, text),
            None => self,
        }
    }

    /// Looks up a raw value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.values.get(key)
    }

    pub(crate) fn text(&self, template: TemplateId, key: &'static str) -> Result<&str, RenderError> {
        self.optional_text(template, key)?
            .ok_or(RenderError::MissingValue { template, key })
    }

    pub(crate) fn optional_text(
        &self,
        template: TemplateId,
        key: &'static str,
    ) -> Result<Option<&str>, RenderError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(ContextValue::Text(text)) => Ok(Some(text.as_str())),
            Some(other) => Err(RenderError::UnexpectedKind {
                template,
                key,
                expected: "text",
                found: other.kind(),
            }),
        }
    }

    pub(crate) fn flag(&self, template: TemplateId, key: &'static str) -> Result<bool, RenderError> {
        match self.values.get(key) {
            None => Err(RenderError::MissingValue { template, key }),
            Some(ContextValue::Flag(flag)) => Ok(*flag),
            Some(other) => Err(RenderError::UnexpectedKind {
                template,
                key,
                expected: "flag",
                found: other.kind(),
            }),
        }
    }
}
