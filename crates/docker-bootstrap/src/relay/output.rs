//! Captured relay output.

use std::fmt;
use std::io::{ErrorKind, Read};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const READ_CHUNK: usize = 4096;
const JOIN_POLL: Duration = Duration::from_millis(10);

/// Drained stdout and stderr of the relay.
///
/// Attached to every relay failure, including when both streams are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayOutput {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl RelayOutput {
    /// Bundles the two streams.
    #[must_use]
    pub fn new(stdout: Vec<u8>, stderr: Vec<u8>) -> Self {
        Self { stdout, stderr }
    }

    /// Bytes written to standard output.
    #[must_use]
    pub fn stdout(&self) -> &[u8] {
        &self.stdout
    }

    /// Bytes written to standard error.
    #[must_use]
    pub fn stderr(&self) -> &[u8] {
        &self.stderr
    }

    /// Returns `true` when neither stream carried any output.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty() && self.stderr.is_empty()
    }
}

impl fmt::Display for RelayOutput {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_stream(formatter, "stdout", &self.stdout)?;
        formatter.write_str("\n")?;
        write_stream(formatter, "stderr", &self.stderr)
    }
}

fn write_stream(formatter: &mut fmt::Formatter<'_>, name: &str, bytes: &[u8]) -> fmt::Result {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim_end();
    if trimmed.is_empty() {
        write!(formatter, "relay {name}: (empty)")
    } else {
        write!(formatter, "relay {name}:\n{trimmed}")
    }
}

/// Background reader that accumulates one pipe into a shared buffer.
///
/// The buffer fills incrementally so a snapshot can be taken even when a
/// forked descendant keeps the pipe open.
#[derive(Debug)]
pub(crate) struct StreamCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
    reader: Option<JoinHandle<()>>,
}

impl StreamCapture {
    /// Starts a named reader thread draining `source`.
    pub(crate) fn spawn<R>(name: &str, mut source: R) -> std::io::Result<Self>
    where
        R: Read + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);
        let reader = thread::Builder::new()
            .name(format!("relay-{name}"))
            .spawn(move || {
                let mut chunk = [0_u8; READ_CHUNK];
                loop {
                    match source.read(&mut chunk) {
                        Ok(0) => break,
                        Ok(count) => sink
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .extend_from_slice(chunk.get(..count).unwrap_or_default()),
                        Err(error) if error.kind() == ErrorKind::Interrupted => {}
                        Err(_) => break,
                    }
                }
            })?;
        Ok(Self {
            buffer,
            reader: Some(reader),
        })
    }

    /// Waits up to `grace` for the reader to reach end of stream, then
    /// returns everything captured so far.
    pub(crate) fn drain(&mut self, grace: Duration) -> Vec<u8> {
        let deadline = Instant::now() + grace;
        if let Some(reader) = self.reader.take() {
            while !reader.is_finished() && Instant::now() < deadline {
                thread::sleep(JOIN_POLL);
            }
            if reader.is_finished() {
                // Reader threads never panic; a join error leaves the buffer as is.
                drop(reader.join());
            } else {
                self.reader = Some(reader);
            }
        }
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
