//! Test double for [`BootstrapReporter`] that records lifecycle events.

use std::sync::Mutex;

use bootstrap_config::BootstrapConfig;

use crate::error::BootstrapError;
use crate::health::BootstrapReporter;
use crate::sequencer::SequencerState;

/// Lifecycle events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReporterEvent {
    /// The sequence started.
    Starting,
    /// The sequencer changed state.
    Transition {
        /// Previous state.
        from: SequencerState,
        /// New state.
        to: SequencerState,
    },
    /// The sequence failed with an error description.
    Failed(String),
}

/// Records reporter events for assertions.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ReporterEvent>>,
}

impl RecordingReporter {
    /// Captures a copy of the recorded events.
    pub fn events(&self) -> Vec<ReporterEvent> {
        self.events
            .lock()
            .expect("reporter mutex poisoned")
            .clone()
    }

    /// Target state of every recorded transition.
    pub fn transitions(&self) -> Vec<SequencerState> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ReporterEvent::Transition { to, .. } => Some(to),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: ReporterEvent) {
        self.events
            .lock()
            .expect("reporter mutex poisoned")
            .push(event);
    }
}

impl BootstrapReporter for RecordingReporter {
    fn bootstrap_starting(&self, _config: &BootstrapConfig) {
        self.record(ReporterEvent::Starting);
    }

    fn state_changed(&self, from: SequencerState, to: SequencerState) {
        self.record(ReporterEvent::Transition { from, to });
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(ReporterEvent::Failed(error.to_string()));
    }
}
