//! Binary entry point: configuration, telemetry and exit status mapping.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use bootstrap_config::BootstrapConfig;
use ortho_config::OrthoConfig;

use crate::error::BootstrapError;
use crate::sequencer::{BootstrapOutcome, bootstrap};
use crate::telemetry;

const PROGRAM: &str = "docker-bootstrap";

/// Loads configuration from `args` and the environment, then runs the
/// bootstrap sequence.
///
/// Returns [`ExitCode::FAILURE`] for every failure after writing the error
/// and any captured relay output to `stderr`. On a successful handoff this
/// never returns.
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with(args, stdout, stderr, bootstrap)
}

pub(crate) fn run_with<I, W, E, F>(args: I, stdout: &mut W, stderr: &mut E, sequence: F) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    F: FnOnce(&BootstrapConfig) -> Result<BootstrapOutcome, BootstrapError>,
{
    let config = match BootstrapConfig::load_from_iter(args) {
        Ok(config) => config,
        Err(error) => {
            let _ = writeln!(stderr, "{PROGRAM}: failed to load configuration: {error}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(error) = telemetry::initialise(&config) {
        let _ = writeln!(stderr, "{PROGRAM}: {error}");
    }

    match sequence(&config) {
        Ok(BootstrapOutcome::Prepared) => {
            let _ = writeln!(
                stdout,
                "{PROGRAM}: configuration prepared; supervisor handoff disabled"
            );
            ExitCode::SUCCESS
        }
        Ok(BootstrapOutcome::HandedOff) => ExitCode::SUCCESS,
        Err(error) => {
            report_failure(stderr, &error);
            ExitCode::FAILURE
        }
    }
}

fn report_failure<E: Write>(stderr: &mut E, error: &BootstrapError) {
    let _ = writeln!(stderr, "{PROGRAM}: {error}");
    if let Some(diagnostics) = error.diagnostics() {
        let _ = writeln!(stderr, "{diagnostics}");
    }
}
