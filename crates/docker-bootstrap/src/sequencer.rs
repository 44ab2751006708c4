//! Readiness-gated handoff sequence.
//!
//! The sequencer writes the generated configuration, launches the syslog
//! relay, waits for its socket and finally replaces the process with the
//! supervisor:
//!
//! ```text
//! Init -> ArtifactsWritten -> RelayLaunched -> RelayReady -> HandedOff
//!                        \______________________________/^
//!                          (relay disabled)
//! ```
//!
//! Any failure moves the sequencer to [`SequencerState::Failed`]. Both
//! terminal states are final and nothing is retried.

use std::fmt;
use std::sync::Arc;

use bootstrap_config::BootstrapConfig;
use camino::Utf8Path;

use crate::artifacts::{
    ArtifactStore, BuiltinRenderer, FsArtifactStore, RenderedArtifact, TemplateContext, TemplateId,
    TemplateRenderer,
};
use crate::error::BootstrapError;
use crate::handoff::{ExecHandoff, Handoff, HandoffTarget};
use crate::health::{BootstrapReporter, StructuredBootstrapReporter};
use crate::readiness::{
    ReadinessFailure, ReadinessPolicy, ReadinessProbe, SocketPathProbe, Sleeper, ThreadSleeper,
    wait_for_ready,
};
use crate::relay::{RelayCommand, RelayLauncher, RelayOutput, RelayProcess, SystemRelayLauncher};

const SEQUENCER_TARGET: &str = "docker_bootstrap::sequencer";

/// Progress through the bootstrap sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    /// Nothing has happened yet.
    Init,
    /// Configuration artefacts are on disk.
    ArtifactsWritten,
    /// The relay has been spawned.
    RelayLaunched,
    /// The relay socket exists.
    RelayReady,
    /// Control was transferred to the supervisor.
    HandedOff,
    /// The sequence failed.
    Failed,
}

impl SequencerState {
    /// Returns `true` for states the sequencer never leaves.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::HandedOff | Self::Failed)
    }
}

impl fmt::Display for SequencerState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::ArtifactsWritten => "artifacts_written",
            Self::RelayLaunched => "relay_launched",
            Self::RelayReady => "relay_ready",
            Self::HandedOff => "handed_off",
            Self::Failed => "failed",
        };
        formatter.write_str(name)
    }
}

/// How a successful run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The handoff returned control; only possible with a test double.
    HandedOff,
    /// Everything was prepared and the handoff is disabled.
    Prepared,
}

/// Collaborators producing the configuration files.
pub struct ArtifactServices {
    /// Template renderer.
    pub renderer: Box<dyn TemplateRenderer>,
    /// Destination for rendered files.
    pub store: Box<dyn ArtifactStore>,
}

/// Collaborators starting and watching the relay.
pub struct RelayServices {
    /// Spawns the relay.
    pub launcher: Box<dyn RelayLauncher>,
    /// Source of the readiness signal.
    pub probe: Box<dyn ReadinessProbe>,
    /// Pause between readiness checks.
    pub sleeper: Box<dyn Sleeper>,
    /// Number and spacing of readiness checks.
    pub policy: ReadinessPolicy,
}

/// Everything a [`Sequencer`] needs.
pub struct SequencerPlan {
    /// Artefact generation.
    pub artifacts: ArtifactServices,
    /// Relay lifecycle.
    pub relay: RelayServices,
    /// Terminal transfer of control.
    pub handoff: Box<dyn Handoff>,
    /// Lifecycle observer.
    pub reporter: Arc<dyn BootstrapReporter>,
}

impl SequencerPlan {
    /// Production collaborators for `config`.
    #[must_use]
    pub fn production(config: &BootstrapConfig) -> Self {
        Self {
            artifacts: ArtifactServices {
                renderer: Box::new(BuiltinRenderer),
                store: Box::new(FsArtifactStore),
            },
            relay: RelayServices {
                launcher: Box::new(SystemRelayLauncher),
                probe: Box::new(SocketPathProbe::new(config.relay_socket_path())),
                sleeper: Box::new(ThreadSleeper),
                policy: ReadinessPolicy::default(),
            },
            handoff: Box::new(ExecHandoff),
            reporter: Arc::new(StructuredBootstrapReporter::new()),
        }
    }
}

/// Runs the bootstrap sequence once.
pub struct Sequencer {
    plan: SequencerPlan,
    state: SequencerState,
}

impl Sequencer {
    /// Builds a sequencer in the [`SequencerState::Init`] state.
    #[must_use]
    pub fn new(plan: SequencerPlan) -> Self {
        Self {
            plan,
            state: SequencerState::Init,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Executes the sequence for `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`BootstrapError`] describing the first failing step.
    pub fn run(&mut self, config: &BootstrapConfig) -> Result<BootstrapOutcome, BootstrapError> {
        self.plan.reporter.bootstrap_starting(config);
        match self.advance(config) {
            Ok(outcome) => Ok(outcome),
            Err(error) => {
                self.transition(SequencerState::Failed);
                self.plan.reporter.bootstrap_failed(&error);
                Err(error)
            }
        }
    }

    fn advance(&mut self, config: &BootstrapConfig) -> Result<BootstrapOutcome, BootstrapError> {
        if config.logging_enabled() {
            self.write_artifact(
                TemplateId::LoggingConfig,
                &TemplateContext::for_logging(config),
                config.logging_config_path(),
            )?;
        }
        self.transition(SequencerState::ArtifactsWritten);

        if config.relay_enabled() {
            self.start_relay(config)?;
        } else {
            tracing::info!(target: SEQUENCER_TARGET, "relay disabled; skipping launch");
        }

        if !config.handoff_enabled() {
            tracing::info!(target: SEQUENCER_TARGET, "handoff disabled; preparation complete");
            return Ok(BootstrapOutcome::Prepared);
        }
        self.plan.handoff.hand_off(&HandoffTarget::supervisor())?;
        self.transition(SequencerState::HandedOff);
        Ok(BootstrapOutcome::HandedOff)
    }

    fn write_artifact(
        &self,
        template: TemplateId,
        context: &TemplateContext,
        path: &Utf8Path,
    ) -> Result<(), BootstrapError> {
        let artifact =
            RenderedArtifact::render(self.plan.artifacts.renderer.as_ref(), template, context, path)
                .map_err(|source| BootstrapError::ConfigurationRender { template, source })?;
        self.plan
            .artifacts
            .store
            .persist(&artifact)
            .map_err(|source| BootstrapError::ArtifactWrite {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::debug!(
            target: SEQUENCER_TARGET,
            %template,
            path = %path,
            bytes = artifact.payload().len(),
            "artefact written"
        );
        Ok(())
    }

    fn start_relay(&mut self, config: &BootstrapConfig) -> Result<(), BootstrapError> {
        self.write_artifact(
            TemplateId::RelayConfig,
            &TemplateContext::for_relay(config),
            config.relay_config_path(),
        )?;

        let command = RelayCommand::from_config(config);
        let mut relay = self
            .plan
            .relay
            .launcher
            .launch(&command)
            .map_err(|source| BootstrapError::RelaySpawn {
                binary: command.binary().to_owned(),
                source,
                diagnostics: RelayOutput::default(),
            })?;
        tracing::info!(
            target: SEQUENCER_TARGET,
            pid = relay.pid(),
            binary = command.binary(),
            "relay launched"
        );
        self.transition(SequencerState::RelayLaunched);

        let services = &self.plan.relay;
        let waited = wait_for_ready(
            services.policy,
            services.probe.as_ref(),
            services.sleeper.as_ref(),
            relay.as_mut(),
        );
        match waited {
            Ok(report) => {
                tracing::info!(
                    target: SEQUENCER_TARGET,
                    attempts = report.attempts,
                    daemonised = report.daemonised,
                    socket = %config.relay_socket_path(),
                    "relay ready"
                );
            }
            Err(failure) => {
                let diagnostics = relay.collect_output();
                return Err(readiness_error(failure, config, diagnostics));
            }
        }

        confirm_relay_status(relay.as_mut())?;
        self.transition(SequencerState::RelayReady);
        Ok(())
    }

    fn transition(&mut self, to: SequencerState) {
        let from = self.state;
        tracing::debug!(target: SEQUENCER_TARGET, %from, %to, "state transition");
        self.plan.reporter.state_changed(from, to);
        self.state = to;
    }
}

/// Observes the relay's exit status immediately before the handoff.
///
/// A relay that is still running is accepted; it carries on under the
/// supervisor. Its stdout and stderr remain the capture pipes, whose read
/// ends close on exec, so relay console output is lost after the handoff.
// TODO: hand the capture pipes' write side back to the inherited stdio before
// exec so the relay's console action keeps reaching the container log.
fn confirm_relay_status(relay: &mut dyn RelayProcess) -> Result<(), BootstrapError> {
    match relay.poll_exit() {
        Ok(None) => {
            tracing::debug!(target: SEQUENCER_TARGET, pid = relay.pid(), "relay still running");
            Ok(())
        }
        Ok(Some(exit)) if exit.success() => {
            let output = relay.collect_output();
            tracing::debug!(
                target: SEQUENCER_TARGET,
                %exit,
                output = %output,
                "relay launcher has exited"
            );
            Ok(())
        }
        Ok(Some(exit)) => Err(BootstrapError::RelayExited {
            exit,
            diagnostics: relay.collect_output(),
        }),
        Err(source) => Err(BootstrapError::RelayMonitor {
            source,
            diagnostics: relay.collect_output(),
        }),
    }
}

fn readiness_error(
    failure: ReadinessFailure,
    config: &BootstrapConfig,
    diagnostics: RelayOutput,
) -> BootstrapError {
    match failure {
        ReadinessFailure::TimedOut { attempts } => BootstrapError::RelayReadinessTimeout {
            socket: config.relay_socket_path().to_path_buf(),
            attempts,
            diagnostics,
        },
        ReadinessFailure::Exited(exit) => BootstrapError::RelayExited { exit, diagnostics },
        ReadinessFailure::Monitor(source) => BootstrapError::RelayMonitor {
            source,
            diagnostics,
        },
    }
}

/// Runs the sequence for `config` with the production collaborators.
///
/// With the handoff enabled this only returns on failure.
///
/// # Errors
///
/// Returns a [`BootstrapError`] describing the first failing step.
pub fn bootstrap(config: &BootstrapConfig) -> Result<BootstrapOutcome, BootstrapError> {
    Sequencer::new(SequencerPlan::production(config)).run(config)
}
