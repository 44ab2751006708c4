//! BDD test world: configuration, doubles and the outcome of one bootstrap
//! run.

use std::cell::RefCell;
use std::sync::{Arc, Mutex};

use bootstrap_config::{BootstrapConfig, LogLevel};

use crate::artifacts::BuiltinRenderer;
use crate::error::BootstrapError;
use crate::readiness::ReadinessPolicy;
use crate::sequencer::{
    ArtifactServices, BootstrapOutcome, RelayServices, Sequencer, SequencerPlan, SequencerState,
};

use super::doubles::{MemoryStore, RecordingHandoff, RecordingSleeper, ScriptedProbe};
use super::relay::{FakeRelay, RecordingLauncher, RelayLog};
use super::reporter::RecordingReporter;

/// Scenario world shared across BDD steps.
pub struct TestWorld {
    pub config: BootstrapConfig,
    pub store: MemoryStore,
    pub sleeper: RecordingSleeper,
    pub handoff: RecordingHandoff,
    pub reporter: Arc<RecordingReporter>,
    probe: ScriptedProbe,
    relay: Option<FakeRelay>,
    relay_log: Option<Arc<Mutex<RelayLog>>>,
    launcher: Option<RecordingLauncher>,
    outcome: Option<Result<BootstrapOutcome, BootstrapError>>,
    state: SequencerState,
}

impl TestWorld {
    /// Builds a world with default configuration, a running relay and a
    /// socket that appears on the first check.
    pub fn new() -> Self {
        Self {
            config: BootstrapConfig::default(),
            store: MemoryStore::default(),
            sleeper: RecordingSleeper::default(),
            handoff: RecordingHandoff::default(),
            reporter: Arc::new(RecordingReporter::default()),
            probe: ScriptedProbe::ready_on(1),
            relay: Some(FakeRelay::running()),
            relay_log: None,
            launcher: None,
            outcome: None,
            state: SequencerState::Init,
        }
    }

    /// Sets the configured log level.
    pub fn set_log_level(&mut self, level: LogLevel) {
        self.config.log_level = level;
    }

    /// Replaces the relay double.
    pub fn use_relay(&mut self, relay: FakeRelay) {
        self.relay = Some(relay);
    }

    /// Makes the relay spawn fail.
    pub fn fail_spawn(&mut self) {
        self.relay = None;
    }

    /// Adds scripted output to the relay double.
    pub fn set_relay_output(&mut self, stdout: &str, stderr: &str) {
        if let Some(relay) = self.relay.take() {
            self.relay = Some(relay.with_output(stdout, stderr));
        }
    }

    /// Replaces the readiness probe.
    pub fn use_probe(&mut self, probe: ScriptedProbe) {
        self.probe = probe;
    }

    /// Runs the sequence once.
    pub fn bootstrap(&mut self) {
        if self.outcome.is_some() {
            return;
        }
        let launcher = match self.relay.take() {
            Some(relay) => {
                self.relay_log = Some(relay.log());
                RecordingLauncher::with_relay(relay)
            }
            None => RecordingLauncher::failing(),
        };
        let reporter: Arc<RecordingReporter> = Arc::clone(&self.reporter);
        let plan = SequencerPlan {
            artifacts: ArtifactServices {
                renderer: Box::new(BuiltinRenderer),
                store: Box::new(self.store.clone()),
            },
            relay: RelayServices {
                launcher: Box::new(launcher.clone()),
                probe: Box::new(self.probe.clone()),
                sleeper: Box::new(self.sleeper.clone()),
                policy: ReadinessPolicy::default(),
            },
            handoff: Box::new(self.handoff.clone()),
            reporter,
        };
        let mut sequencer = Sequencer::new(plan);
        self.outcome = Some(sequencer.run(&self.config));
        self.state = sequencer.state();
        self.launcher = Some(launcher);
    }

    /// Successful outcome, if any.
    pub fn outcome(&self) -> Option<BootstrapOutcome> {
        self.outcome.as_ref().and_then(|result| result.as_ref().ok().copied())
    }

    /// Failure, if any.
    pub fn error(&self) -> Option<&BootstrapError> {
        self.outcome.as_ref().and_then(|result| result.as_ref().err())
    }

    /// Final sequencer state.
    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Number of relay launches attempted.
    pub fn launch_count(&self) -> usize {
        self.launcher
            .as_ref()
            .map_or(0, |launcher| launcher.launches().len())
    }

    /// Observations of the launched relay.
    pub fn relay_log(&self) -> RelayLog {
        self.relay_log
            .as_ref()
            .map(|log| log.lock().expect("relay log mutex poisoned").clone())
            .unwrap_or_default()
    }

    /// Checks performed by the readiness probe.
    pub fn probe_checks(&self) -> u32 {
        self.probe.checks()
    }
}

/// Fixture constructor used by the behaviour suite.
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
