//! Process-wide hook that records panics before the default report.

use std::any::Any;
use std::panic;

use once_cell::sync::OnceCell;

const FATAL_TARGET: &str = "docker_bootstrap::fatal";

static HOOK_GUARD: OnceCell<()> = OnceCell::new();

/// Installs the panic hook once per process.
///
/// The hook logs the panic message and location at `error` level, then
/// delegates to whichever hook was installed before it.
pub fn install_fatal_hook() {
    HOOK_GUARD.get_or_init(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let location = info
                .location()
                .map(|location| format!("{}:{}", location.file(), location.line()));
            tracing::error!(
                target: FATAL_TARGET,
                location = location.as_deref().unwrap_or("unknown"),
                "unhandled panic: {}",
                payload_message(info.payload())
            );
            previous(info);
        }));
    });
}

fn payload_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
