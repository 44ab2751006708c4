//! Structured reporting of bootstrap lifecycle events.

use std::sync::Arc;

use bootstrap_config::BootstrapConfig;

use crate::error::BootstrapError;
use crate::sequencer::SequencerState;

const HEALTH_TARGET: &str = "docker_bootstrap::health";

/// Observer notified as the sequencer advances.
pub trait BootstrapReporter: Send + Sync {
    /// Invoked once before any work begins.
    fn bootstrap_starting(&self, config: &BootstrapConfig);

    /// Invoked on every state transition, including into a terminal state.
    fn state_changed(&self, from: SequencerState, to: SequencerState);

    /// Invoked when the sequence fails.
    fn bootstrap_failed(&self, error: &BootstrapError);
}

impl<T> BootstrapReporter for Arc<T>
where
    T: BootstrapReporter,
{
    fn bootstrap_starting(&self, config: &BootstrapConfig) {
        (**self).bootstrap_starting(config);
    }

    fn state_changed(&self, from: SequencerState, to: SequencerState) {
        (**self).state_changed(from, to);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredBootstrapReporter;

impl StructuredBootstrapReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl BootstrapReporter for StructuredBootstrapReporter {
    fn bootstrap_starting(&self, config: &BootstrapConfig) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            log_level = %config.log_level(),
            logging = config.logging_enabled(),
            rsyslog = config.relay_enabled(),
            handoff = config.handoff_enabled(),
            socket = %config.relay_socket_path(),
            "starting container bootstrap"
        );
    }

    fn state_changed(&self, from: SequencerState, to: SequencerState) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "state_changed",
            from = %from,
            to = %to,
            "bootstrap state changed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "container bootstrap failed"
        );
    }
}
