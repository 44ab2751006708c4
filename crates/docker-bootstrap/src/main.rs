//! CLI entrypoint for the container bootstrapper.
//!
//! The binary delegates to [`docker_bootstrap::run`], which loads
//! configuration, prepares logging, starts the syslog relay and hands off to
//! the process supervisor.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    docker_bootstrap::run(std::env::args_os(), &mut stdout, &mut stderr)
}
