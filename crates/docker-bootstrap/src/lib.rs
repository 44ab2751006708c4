//! Container bootstrap helper.
//!
//! A container entrypoint prepares its logging before any real work starts.
//! [`bootstrap`] renders the logging configuration consumed by the programs
//! under supervision, launches a local syslog relay (`rsyslogd`), waits for the
//! relay socket to appear and finally replaces the current process with the
//! `circusd circus.ini` supervisor.
//!
//! The relay is given a fixed readiness budget of ten checks, 200 ms apart. If
//! the socket does not appear, or the relay exits unsuccessfully first, the
//! relay's captured output is attached to the returned [`BootstrapError`] and
//! the binary exits with status 1. Nothing is retried.
//!
//! Each step is a collaborator behind a trait ([`TemplateRenderer`],
//! [`ArtifactStore`], [`RelayLauncher`], [`ReadinessProbe`], [`Sleeper`],
//! [`Handoff`] and [`BootstrapReporter`]) so the [`Sequencer`] can be driven
//! without touching the filesystem or spawning processes.
//!
//! Rust programs running under the supervisor can call
//! [`sink::setup_logging`] with the generated configuration to route their
//! `tracing` output to the console and the relay socket.

pub mod artifacts;
mod error;
pub mod handoff;
mod health;
pub mod readiness;
pub mod relay;
mod runner;
mod sequencer;
pub mod sink;
pub mod telemetry;

pub use artifacts::{
    ArtifactStore, BuiltinRenderer, FsArtifactStore, RenderError, RenderedArtifact,
    TemplateContext, TemplateId, TemplateRenderer,
};
pub use error::BootstrapError;
pub use handoff::{ExecHandoff, Handoff, HandoffError, HandoffTarget};
pub use health::{BootstrapReporter, StructuredBootstrapReporter};
pub use readiness::{
    ReadinessFailure, ReadinessPolicy, ReadinessProbe, ReadinessReport, Sleeper, SocketPathProbe,
    ThreadSleeper, wait_for_ready,
};
pub use relay::{
    RelayCommand, RelayExit, RelayLauncher, RelayOutput, RelayProcess, RelayProcessHandle,
    RelaySpawnError, SystemRelayLauncher,
};
pub use runner::run;
pub use sequencer::{
    ArtifactServices, BootstrapOutcome, RelayServices, Sequencer, SequencerPlan, SequencerState,
    bootstrap,
};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
