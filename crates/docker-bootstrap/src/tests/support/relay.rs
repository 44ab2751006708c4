//! Scripted relay process and launcher.

use std::io;
use std::sync::{Arc, Mutex};

use crate::relay::{
    RelayCommand, RelayExit, RelayLauncher, RelayOutput, RelayProcess, RelaySpawnError,
};

/// Observations shared between a [`FakeRelay`] and the test.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RelayLog {
    /// Number of exit status queries.
    pub polls: u32,
    /// Whether the output was collected.
    pub collected: bool,
    /// Whether collection had to terminate a running relay.
    pub terminated: bool,
}

#[derive(Debug)]
enum Script {
    Running,
    ExitsAfter { polls: u32, exit: RelayExit },
    Unmonitorable,
}

/// Relay whose exit behaviour is scripted per poll.
#[derive(Debug)]
pub struct FakeRelay {
    script: Script,
    exited: Option<RelayExit>,
    output: RelayOutput,
    log: Arc<Mutex<RelayLog>>,
}

impl FakeRelay {
    fn with_script(script: Script) -> Self {
        Self {
            script,
            exited: None,
            output: RelayOutput::default(),
            log: Arc::new(Mutex::new(RelayLog::default())),
        }
    }

    /// A relay that never exits on its own.
    pub fn running() -> Self {
        Self::with_script(Script::Running)
    }

    /// A relay that reports `code` on the poll following `polls` quiet polls.
    pub fn exits_after(polls: u32, code: Option<i32>) -> Self {
        Self::with_script(Script::ExitsAfter {
            polls,
            exit: RelayExit::new(code),
        })
    }

    /// A relay whose status cannot be queried.
    pub fn unmonitorable() -> Self {
        Self::with_script(Script::Unmonitorable)
    }

    /// Sets the output returned by [`RelayProcess::collect_output`].
    pub fn with_output(mut self, stdout: &str, stderr: &str) -> Self {
        self.output = RelayOutput::new(stdout.as_bytes().to_vec(), stderr.as_bytes().to_vec());
        self
    }

    /// Handle onto the shared observations.
    pub fn log(&self) -> Arc<Mutex<RelayLog>> {
        Arc::clone(&self.log)
    }

    fn update(&self, change: impl FnOnce(&mut RelayLog)) {
        change(&mut self.log.lock().expect("relay log mutex poisoned"));
    }
}

impl RelayProcess for FakeRelay {
    fn pid(&self) -> u32 {
        4242
    }

    fn poll_exit(&mut self) -> io::Result<Option<RelayExit>> {
        let polls = {
            let mut log = self.log.lock().expect("relay log mutex poisoned");
            log.polls += 1;
            log.polls
        };
        if self.exited.is_some() {
            return Ok(self.exited);
        }
        match self.script {
            Script::Running => Ok(None),
            Script::ExitsAfter {
                polls: quiet,
                exit,
            } => {
                if polls > quiet {
                    self.exited = Some(exit);
                }
                Ok(self.exited)
            }
            Script::Unmonitorable => Err(io::Error::other("wait failed")),
        }
    }

    fn collect_output(&mut self) -> RelayOutput {
        let terminated = self.exited.is_none();
        if terminated {
            self.exited = Some(RelayExit::new(None));
        }
        self.update(|log| {
            log.collected = true;
            log.terminated = terminated;
        });
        self.output.clone()
    }
}

/// Launcher that hands out a prepared [`FakeRelay`] and records commands.
#[derive(Debug, Clone)]
pub struct RecordingLauncher {
    relay: Arc<Mutex<Option<FakeRelay>>>,
    launches: Arc<Mutex<Vec<RelayCommand>>>,
}

impl RecordingLauncher {
    /// Launcher returning `relay` on the first launch.
    pub fn with_relay(relay: FakeRelay) -> Self {
        Self {
            relay: Arc::new(Mutex::new(Some(relay))),
            launches: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Launcher whose spawn always fails as if the binary were missing.
    pub fn failing() -> Self {
        Self {
            relay: Arc::new(Mutex::new(None)),
            launches: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Commands received so far.
    pub fn launches(&self) -> Vec<RelayCommand> {
        self.launches
            .lock()
            .expect("launch log mutex poisoned")
            .clone()
    }
}

impl RelayLauncher for RecordingLauncher {
    fn launch(&self, command: &RelayCommand) -> Result<Box<dyn RelayProcess>, RelaySpawnError> {
        self.launches
            .lock()
            .expect("launch log mutex poisoned")
            .push(command.clone());
        match self.relay.lock().expect("relay mutex poisoned").take() {
            Some(relay) => Ok(Box::new(relay)),
            None => Err(RelaySpawnError::Spawn(io::Error::from(
                io::ErrorKind::NotFound,
            ))),
        }
    }
}

