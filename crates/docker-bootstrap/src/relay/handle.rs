//! Owned handle over a spawned relay child.

use std::io;
use std::process::{Child, ExitStatus};
use std::time::Duration;

use super::output::{RelayOutput, StreamCapture};
use super::{RELAY_TARGET, RelayExit, RelayProcess};

/// How long a drain waits for each pipe to reach end of stream.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Production [`RelayProcess`] backed by [`std::process::Child`].
#[derive(Debug)]
pub struct RelayProcessHandle {
    child: Child,
    stdout: StreamCapture,
    stderr: StreamCapture,
    exit: Option<RelayExit>,
}

impl RelayProcessHandle {
    pub(crate) fn new(child: Child, stdout: StreamCapture, stderr: StreamCapture) -> Self {
        Self {
            child,
            stdout,
            stderr,
            exit: None,
        }
    }

    fn record(&mut self, status: ExitStatus) -> RelayExit {
        let exit = RelayExit::from(status);
        self.exit = Some(exit);
        exit
    }
}

impl RelayProcess for RelayProcessHandle {
    fn pid(&self) -> u32 {
        self.child.id()
    }

    fn poll_exit(&mut self) -> io::Result<Option<RelayExit>> {
        if let Some(exit) = self.exit {
            return Ok(Some(exit));
        }
        Ok(self.child.try_wait()?.map(|status| self.record(status)))
    }

    fn collect_output(&mut self) -> RelayOutput {
        if matches!(self.poll_exit(), Ok(None)) {
            tracing::warn!(
                target: RELAY_TARGET,
                pid = self.child.id(),
                "terminating relay before collecting output"
            );
            if let Err(error) = self.child.kill() {
                tracing::warn!(target: RELAY_TARGET, %error, "failed to signal relay");
            }
        }
        if self.exit.is_none() {
            match self.child.wait() {
                Ok(status) => {
                    self.record(status);
                }
                Err(error) => {
                    tracing::warn!(target: RELAY_TARGET, %error, "failed to reap relay");
                }
            }
        }
        RelayOutput::new(
            self.stdout.drain(DRAIN_GRACE),
            self.stderr.drain(DRAIN_GRACE),
        )
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::{Command, Stdio};
    use std::thread;
    use std::time::Instant;

    fn spawn_shell(script: &str) -> RelayProcessHandle {
        let mut child = Command::new("sh")
            .args(["-c", script])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("spawn sh");
        let stdout = StreamCapture::spawn("stdout", child.stdout.take().expect("stdout pipe"))
            .expect("stdout reader");
        let stderr = StreamCapture::spawn("stderr", child.stderr.take().expect("stderr pipe"))
            .expect("stderr reader");
        RelayProcessHandle::new(child, stdout, stderr)
    }

    fn wait_for_exit(handle: &mut RelayProcessHandle) -> RelayExit {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            if let Some(exit) = handle.poll_exit().expect("poll exit") {
                return exit;
            }
            assert!(Instant::now() < deadline, "child did not exit");
            thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn reports_exit_code_and_captured_streams() {
        let mut handle = spawn_shell("echo out; echo err >&2; exit 3");
        assert_eq!(wait_for_exit(&mut handle), RelayExit::new(Some(3)));

        let output = handle.collect_output();
        assert_eq!(output.stdout(), b"out\n");
        assert_eq!(output.stderr(), b"err\n");
    }

    #[test]
    fn exit_status_is_sticky() {
        let mut handle = spawn_shell("exit 0");
        let first = wait_for_exit(&mut handle);
        assert!(first.success());
        assert_eq!(handle.poll_exit().expect("poll again"), Some(first));
    }

    #[test]
    fn collect_output_kills_running_relay() {
        let mut handle = spawn_shell("echo booting; exec sleep 30");
        let started = Instant::now();
        let output = handle.collect_output();
        assert!(started.elapsed() < Duration::from_secs(10));
        let exit = handle.poll_exit().expect("poll").expect("relay was reaped");
        assert!(!exit.success());
        assert_eq!(exit.code(), None, "terminated by signal");
        assert!(output.stderr().is_empty());
    }
}
