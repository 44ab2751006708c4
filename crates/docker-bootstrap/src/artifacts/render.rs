//! Built-in templates for the generated configuration files.

use bootstrap_config::LogLevel;
use camino::Utf8PathBuf;

use super::context::{
    CONSOLE, LOG_LEVEL, LOGENTRIES_TOKEN, RSYSLOG, RSYSLOG_DEBUG, SYSLOG_SOCKET, TemplateContext,
};
use super::{RenderError, TemplateId};
use crate::sink::LoggingDocument;

/// Logentries ingestion endpoint used for token-based forwarding.
const LOGENTRIES_HOST: &str = "data.logentries.com";
const LOGENTRIES_PORT: u16 = 10000;

/// Renders a template into text.
///
/// Implementations must be pure: identical inputs always yield identical
/// output.
pub trait TemplateRenderer {
    /// Renders `template` using the values in `context`.
    fn render(
        &self,
        template: TemplateId,
        context: &TemplateContext,
    ) -> Result<String, RenderError>;
}

/// Renderer backed by the templates compiled into this crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinRenderer;

impl TemplateRenderer for BuiltinRenderer {
    fn render(
        &self,
        template: TemplateId,
        context: &TemplateContext,
    ) -> Result<String, RenderError> {
        match template {
            TemplateId::LoggingConfig => render_logging(context),
            TemplateId::RelayConfig => render_relay(context),
        }
    }
}

fn render_logging(context: &TemplateContext) -> Result<String, RenderError> {
    let template = TemplateId::LoggingConfig;
    let raw_level = context.text(template, LOG_LEVEL)?;
    let level = raw_level
        .parse::<LogLevel>()
        .map_err(|_| RenderError::InvalidValue {
            template,
            key: LOG_LEVEL,
            value: raw_level.to_owned(),
        })?;
    let socket = Utf8PathBuf::from(context.text(template, SYSLOG_SOCKET)?);
    let console = context.flag(template, CONSOLE)?;
    let syslog = context.flag(template, RSYSLOG)?;

    LoggingDocument::new(level, console, syslog, socket)
        .to_yaml()
        .map_err(|source| RenderError::Serialise {
            template,
            message: source.to_string(),
        })
}

fn render_relay(context: &TemplateContext) -> Result<String, RenderError> {
    let template = TemplateId::RelayConfig;
    let socket = context.text(template, SYSLOG_SOCKET)?;
    let debug = context.flag(template, RSYSLOG_DEBUG)?;
    let token = context.optional_text(template, LOGENTRIES_TOKEN)?;

    let console_template = if debug {
        "RSYSLOG_DebugFormat"
    } else {
        "ConsoleFormat"
    };

    let mut lines = vec![
        String::from("# Generated at container start; manual edits are overwritten."),
        String::from("global(workDirectory=\"/tmp\")"),
        format!(
            "module(load=\"imuxsock\" SysSock.Name=\"{}\" SysSock.UsePIDFromSystem=\"on\")",
            escape(socket)
        ),
        String::new(),
        String::from(
            "template(name=\"ConsoleFormat\" type=\"string\" string=\"%TIMESTAMP:::date-rfc3339% %syslogseverity-text:::uppercase% %syslogtag%%msg%\\n\")",
        ),
        format!(
            "*.* action(type=\"omfile\" file=\"/dev/stdout\" template=\"{console_template}\")"
        ),
    ];

    if let Some(token) = token {
        lines.push(String::new());
        lines.push(format!(
            "template(name=\"LogentriesFormat\" type=\"string\" string=\"{} %HOSTNAME% %syslogtag%%msg%\\n\")",
            escape(token)
        ));
        lines.push(format!(
            "*.* action(type=\"omfwd\" target=\"{LOGENTRIES_HOST}\" port=\"{LOGENTRIES_PORT}\" protocol=\"tcp\" template=\"LogentriesFormat\")"
        ));
    }

    let mut rendered = lines.join("\n");
    rendered.push('\n');
    Ok(rendered)
}

/// Escapes a value for inclusion in a double-quoted rsyslog parameter.
fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bootstrap_config::{BootstrapConfig, Toggle};
    use rstest::rstest;

    fn render(template: TemplateId, context: &TemplateContext) -> String {
        BuiltinRenderer
            .render(template, context)
            .expect("built-in template renders")
    }

    #[test]
    fn logging_render_is_deterministic() {
        let config = BootstrapConfig {
            log_level: LogLevel::Debug,
            console: Toggle::Off,
            ..BootstrapConfig::default()
        };
        let context = TemplateContext::for_logging(&config);
        let first = render(TemplateId::LoggingConfig, &context);
        let second = render(TemplateId::LoggingConfig, &context);
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn logging_render_round_trips_through_the_sink_schema() {
        let config = BootstrapConfig {
            log_level: LogLevel::Error,
            ..BootstrapConfig::default()
        };
        let text = render(
            TemplateId::LoggingConfig,
            &TemplateContext::for_logging(&config),
        );
        let document = LoggingDocument::from_yaml(&text).expect("rendered yaml parses");
        assert_eq!(document.level, LogLevel::Error);
        assert!(document.console.enabled);
        assert!(document.syslog.enabled);
        assert_eq!(document.syslog.socket, "/dev/log");
    }

    #[test]
    fn logging_render_fails_loudly_on_missing_values() {
        let context = TemplateContext::new().with_text(LOG_LEVEL, "INFO");
        let error = BuiltinRenderer
            .render(TemplateId::LoggingConfig, &context)
            .expect_err("socket is required");
        assert!(matches!(
            error,
            RenderError::MissingValue {
                template: TemplateId::LoggingConfig,
                key: SYSLOG_SOCKET,
            }
        ));
    }

    #[test]
    fn logging_render_rejects_unknown_levels() {
        let context = TemplateContext::for_logging(&BootstrapConfig::default())
            .with_text(LOG_LEVEL, "LOUD");
        let error = BuiltinRenderer
            .render(TemplateId::LoggingConfig, &context)
            .expect_err("unknown level");
        assert!(matches!(error, RenderError::InvalidValue { key: LOG_LEVEL, .. }));
    }

    #[test]
    fn relay_render_listens_on_configured_socket() {
        let config = BootstrapConfig {
            relay_socket_path: "/run/relay.sock".into(),
            ..BootstrapConfig::default()
        };
        let text = render(TemplateId::RelayConfig, &TemplateContext::for_relay(&config));
        assert!(text.contains("SysSock.Name=\"/run/relay.sock\""), "{text}");
        assert!(text.contains("template=\"ConsoleFormat\")"), "{text}");
        assert!(!text.contains("omfwd"), "no forwarding without a token: {text}");
    }

    #[rstest]
    #[case(true, "RSYSLOG_DebugFormat")]
    #[case(false, "ConsoleFormat")]
    fn relay_render_selects_console_format(#[case] debug: bool, #[case] expected: &str) {
        let config = BootstrapConfig {
            rsyslog_debug: Toggle::from(debug),
            ..BootstrapConfig::default()
        };
        let text = render(TemplateId::RelayConfig, &TemplateContext::for_relay(&config));
        assert!(
            text.contains(&format!("file=\"/dev/stdout\" template=\"{expected}\"")),
            "{text}"
        );
    }

    #[test]
    fn relay_render_forwards_to_logentries_when_token_is_set() {
        let config = BootstrapConfig {
            logentries_token: Some(String::from("tok\"en")),
            ..BootstrapConfig::default()
        };
        let text = render(TemplateId::RelayConfig, &TemplateContext::for_relay(&config));
        assert!(text.contains("string=\"tok\\\"en %HOSTNAME%"), "{text}");
        assert!(text.contains("target=\"data.logentries.com\""), "{text}");
    }
}
