//! Recording doubles for the artefact store, readiness probe, sleeper and
//! handoff.

use std::collections::BTreeMap;
use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use mockall::mock;

use crate::artifacts::{ArtifactStore, RenderedArtifact};
use crate::handoff::{Handoff, HandoffError, HandoffTarget};
use crate::readiness::{ReadinessProbe, Sleeper};

/// Probe that becomes ready on a given check.
#[derive(Debug, Clone)]
pub struct ScriptedProbe {
    ready_on: Option<u32>,
    checks: Arc<AtomicU32>,
}

impl ScriptedProbe {
    /// Ready from the `check`-th check onwards (1-based).
    pub fn ready_on(check: u32) -> Self {
        Self {
            ready_on: Some(check),
            checks: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Never ready.
    pub fn never() -> Self {
        Self {
            ready_on: None,
            checks: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Checks performed so far.
    pub fn checks(&self) -> u32 {
        self.checks.load(Ordering::SeqCst)
    }
}

impl ReadinessProbe for ScriptedProbe {
    fn is_ready(&self) -> bool {
        let check = self.checks.fetch_add(1, Ordering::SeqCst) + 1;
        self.ready_on.is_some_and(|ready_on| check >= ready_on)
    }

    fn describe(&self) -> String {
        String::from("scripted probe")
    }
}

/// Sleeper that records requested pauses without blocking.
#[derive(Debug, Default, Clone)]
pub struct RecordingSleeper {
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    /// Pauses requested so far.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().expect("sleeper mutex poisoned").clone()
    }

    /// Sum of all requested pauses.
    pub fn total(&self) -> Duration {
        self.sleeps().iter().sum()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .expect("sleeper mutex poisoned")
            .push(duration);
    }
}

/// In-memory artefact store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    files: Arc<Mutex<BTreeMap<Utf8PathBuf, Vec<u8>>>>,
    writes: Arc<Mutex<Vec<Utf8PathBuf>>>,
    failing: Arc<Mutex<Option<Utf8PathBuf>>>,
}

impl MemoryStore {
    /// Makes writes to `path` fail with a permission error.
    pub fn fail_on(&self, path: &Utf8Path) {
        *self.failing.lock().expect("store mutex poisoned") = Some(path.to_path_buf());
    }

    /// Content stored at `path`.
    pub fn read(&self, path: &Utf8Path) -> Option<String> {
        self.files
            .lock()
            .expect("store mutex poisoned")
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Paths written, in order.
    pub fn writes(&self) -> Vec<Utf8PathBuf> {
        self.writes.lock().expect("store mutex poisoned").clone()
    }
}

impl ArtifactStore for MemoryStore {
    fn persist(&self, artifact: &RenderedArtifact) -> io::Result<()> {
        let failing = self.failing.lock().expect("store mutex poisoned").clone();
        if failing.as_deref() == Some(artifact.path()) {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        self.writes
            .lock()
            .expect("store mutex poisoned")
            .push(artifact.path().to_path_buf());
        self.files
            .lock()
            .expect("store mutex poisoned")
            .insert(artifact.path().to_path_buf(), artifact.payload().to_vec());
        Ok(())
    }
}

mock! {
    /// Scriptable handoff for expectation-driven tests.
    pub Handoff {}

    impl Handoff for Handoff {
        fn hand_off(&self, target: &HandoffTarget) -> Result<(), HandoffError>;
    }
}

/// Handoff double that records its targets and returns control.
#[derive(Debug, Default, Clone)]
pub struct RecordingHandoff {
    targets: Arc<Mutex<Vec<(String, Vec<String>)>>>,
    missing_program: Arc<Mutex<bool>>,
}

impl RecordingHandoff {
    /// Makes every handoff fail as if the program were not on `PATH`.
    pub fn fail_with_missing_program(&self) {
        *self.missing_program.lock().expect("handoff mutex poisoned") = true;
    }

    /// Program and arguments of each handoff attempt.
    pub fn targets(&self) -> Vec<(String, Vec<String>)> {
        self.targets.lock().expect("handoff mutex poisoned").clone()
    }
}

impl Handoff for RecordingHandoff {
    fn hand_off(&self, target: &HandoffTarget) -> Result<(), HandoffError> {
        self.targets.lock().expect("handoff mutex poisoned").push((
            target.program().to_owned(),
            target.args().iter().map(|arg| (*arg).to_owned()).collect(),
        ));
        if *self.missing_program.lock().expect("handoff mutex poisoned") {
            return Err(HandoffError::Exec {
                program: target.program(),
                source: io::Error::from(io::ErrorKind::NotFound),
            });
        }
        Ok(())
    }
}
