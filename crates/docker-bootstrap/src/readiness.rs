//! Bounded polling for the relay readiness signal.

use std::io;
use std::thread;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

use crate::relay::{RelayExit, RelayProcess};

const READINESS_TARGET: &str = "docker_bootstrap::readiness";

/// Number of checks performed before giving up.
pub const DEFAULT_ATTEMPTS: u32 = 10;
/// Pause between consecutive checks.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(200);

/// How often and how long to wait for readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    attempts: u32,
    interval: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPTS, DEFAULT_INTERVAL)
    }
}

impl ReadinessPolicy {
    /// Builds a policy of `attempts` checks separated by `interval`.
    #[must_use]
    pub const fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }

    /// Maximum number of checks.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Pause after each unsuccessful check.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Total time slept when the signal never appears.
    #[must_use]
    pub fn budget(&self) -> Duration {
        self.interval.saturating_mul(self.attempts)
    }
}

/// Source of the readiness signal.
pub trait ReadinessProbe {
    /// Returns `true` once the dependent process is ready.
    fn is_ready(&self) -> bool;

    /// Human-readable description of what is being checked.
    fn describe(&self) -> String;
}

/// Probe satisfied once a filesystem path exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketPathProbe {
    path: Utf8PathBuf,
}

impl SocketPathProbe {
    /// Watches `path`.
    #[must_use]
    pub fn new(path: &Utf8Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl ReadinessProbe for SocketPathProbe {
    fn is_ready(&self) -> bool {
        self.path.exists()
    }

    fn describe(&self) -> String {
        self.path.to_string()
    }
}

/// Blocking pause between checks.
pub trait Sleeper {
    /// Blocks the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Sleeper backed by [`std::thread::sleep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Successful wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessReport {
    /// Checks performed, including the successful one.
    pub attempts: u32,
    /// Whether the launcher exited cleanly before the signal appeared.
    pub daemonised: bool,
}

/// Reasons a wait ends without readiness.
#[derive(Debug, Error)]
pub enum ReadinessFailure {
    /// The signal never appeared.
    #[error("not ready after {attempts} checks")]
    TimedOut {
        /// Checks performed.
        attempts: u32,
    },
    /// The relay exited unsuccessfully before becoming ready.
    #[error("relay exited before becoming ready ({0})")]
    Exited(RelayExit),
    /// The relay's status could not be queried.
    #[error("failed to query relay status: {0}")]
    Monitor(#[source] io::Error),
}

/// Polls `probe` until it reports ready or the policy is exhausted.
///
/// Each attempt checks the probe, then the relay's exit status, then sleeps
/// for the policy interval. A probe that is already satisfied therefore
/// causes no sleep at all, and a probe that never succeeds causes exactly
/// `attempts` sleeps. A zero exit is treated as the launcher forking into the
/// background and polling continues; any other exit ends the wait.
///
/// # Errors
///
/// Returns [`ReadinessFailure`] on timeout, on an unsuccessful relay exit, or
/// when the exit status cannot be queried.
pub fn wait_for_ready(
    policy: ReadinessPolicy,
    probe: &dyn ReadinessProbe,
    sleeper: &dyn Sleeper,
    relay: &mut dyn RelayProcess,
) -> Result<ReadinessReport, ReadinessFailure> {
    let mut daemonised = false;
    for attempt in 1..=policy.attempts() {
        if probe.is_ready() {
            tracing::debug!(
                target: READINESS_TARGET,
                attempt,
                signal = %probe.describe(),
                "readiness signal present"
            );
            return Ok(ReadinessReport {
                attempts: attempt,
                daemonised,
            });
        }

        match relay.poll_exit().map_err(ReadinessFailure::Monitor)? {
            Some(exit) if exit.success() => {
                if !daemonised {
                    tracing::debug!(
                        target: READINESS_TARGET,
                        pid = relay.pid(),
                        "relay launcher exited cleanly; waiting for the daemon"
                    );
                }
                daemonised = true;
            }
            Some(exit) => return Err(ReadinessFailure::Exited(exit)),
            None => {}
        }

        tracing::trace!(
            target: READINESS_TARGET,
            attempt,
            remaining = policy.attempts() - attempt,
            "readiness signal absent"
        );
        sleeper.sleep(policy.interval());
    }

    Err(ReadinessFailure::TimedOut {
        attempts: policy.attempts(),
    })
}
