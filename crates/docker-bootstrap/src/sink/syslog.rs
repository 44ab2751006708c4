//! RFC 3164 datagram writer for the relay socket.

use std::io::{self, Write};
use std::os::unix::net::UnixDatagram;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;

/// The `user` facility.
const FACILITY_USER: u8 = 1;

/// Syslog severities used by [`severity_for`].
const SEVERITY_ERROR: u8 = 3;
const SEVERITY_WARNING: u8 = 4;
const SEVERITY_INFO: u8 = 6;
const SEVERITY_DEBUG: u8 = 7;

/// Maps a `tracing` level onto a syslog severity.
#[must_use]
pub fn severity_for(level: &Level) -> u8 {
    match *level {
        Level::ERROR => SEVERITY_ERROR,
        Level::WARN => SEVERITY_WARNING,
        Level::INFO => SEVERITY_INFO,
        _ => SEVERITY_DEBUG,
    }
}

/// Combines the `user` facility with `severity`.
#[must_use]
pub const fn priority(severity: u8) -> u8 {
    FACILITY_USER * 8 + severity
}

/// Frames one message as `<PRI>tag[pid]: message`.
///
/// Trailing line breaks are stripped; the relay terminates records itself.
#[must_use]
pub fn frame(priority: u8, tag: &str, pid: u32, message: &[u8]) -> Vec<u8> {
    let trimmed = message
        .iter()
        .rposition(|byte| !matches!(byte, b'\n' | b'\r'))
        .map_or(&message[..0], |last| &message[..=last]);
    let mut datagram = format!("<{priority}>{tag}[{pid}]: ").into_bytes();
    datagram.extend_from_slice(trimmed);
    datagram
}

#[derive(Debug)]
struct Transport {
    socket: UnixDatagram,
    path: Utf8PathBuf,
    tag: String,
    pid: u32,
}

impl Transport {
    fn send(&self, severity: u8, message: &[u8]) -> io::Result<()> {
        let datagram = frame(priority(severity), &self.tag, self.pid, message);
        self.socket.send_to(&datagram, self.path.as_std_path())?;
        Ok(())
    }
}

/// `MakeWriter` that emits one datagram per formatted event.
#[derive(Debug, Clone)]
pub struct SyslogMakeWriter {
    transport: Arc<Transport>,
}

impl SyslogMakeWriter {
    /// Creates a writer targeting `socket` and tagging records with `tag`.
    ///
    /// # Errors
    ///
    /// Returns an error when the unbound datagram socket cannot be created.
    pub fn new(socket: &Utf8Path, tag: impl Into<String>) -> io::Result<Self> {
        Ok(Self {
            transport: Arc::new(Transport {
                socket: UnixDatagram::unbound()?,
                path: socket.to_path_buf(),
                tag: tag.into(),
                pid: std::process::id(),
            }),
        })
    }

    fn writer(&self, severity: u8) -> SyslogWriter {
        SyslogWriter {
            transport: Arc::clone(&self.transport),
            severity,
            buffer: Vec::new(),
        }
    }
}

impl<'a> MakeWriter<'a> for SyslogMakeWriter {
    type Writer = SyslogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.writer(SEVERITY_INFO)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        self.writer(severity_for(meta.level()))
    }
}

/// Buffers one event and sends it when flushed or dropped.
#[derive(Debug)]
pub struct SyslogWriter {
    transport: Arc<Transport>,
    severity: u8,
    buffer: Vec<u8>,
}

impl Write for SyslogWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let message = std::mem::take(&mut self.buffer);
        self.transport.send(self.severity, &message)
    }
}

impl Drop for SyslogWriter {
    fn drop(&mut self) {
        // A missing relay must never take the program down with it.
        if self.flush().is_err() {
            self.buffer.clear();
        }
    }
}
