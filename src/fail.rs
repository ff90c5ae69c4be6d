// src/fail.rs
// Process-wide sink for fatal and best-effort failures.

use std::fmt::Display;
use std::sync::{Arc, RwLock};
use tracing::{error, warn};

/// Receives a single formatted error string.
pub type FailLogger = Arc<dyn Fn(&str) + Send + Sync>;

static FAIL_LOGGER: RwLock<Option<FailLogger>> = RwLock::new(None);

/// Install the process-wide fail logger.
///
/// Once installed, fatal configuration errors are handed to `logger` instead of
/// terminating the process.
pub fn set_fail_logger<F>(logger: F)
where
    F: Fn(&str) + Send + Sync + 'static,
{
    if let Ok(mut guard) = FAIL_LOGGER.write() {
        *guard = Some(Arc::new(logger));
    }
}

/// Remove the process-wide fail logger, restoring the terminate-on-fatal behavior.
pub fn clear_fail_logger() {
    if let Ok(mut guard) = FAIL_LOGGER.write() {
        *guard = None;
    }
}

pub(crate) fn installed() -> Option<FailLogger> {
    FAIL_LOGGER.read().ok().and_then(|guard| guard.clone())
}

/// Tests that install the process-wide logger hold this for their whole body.
#[cfg(test)]
pub(crate) static GLOBAL_LOGGER_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Fatal path: hand the failure to `local` or the installed logger, otherwise log it and
/// exit the process.
pub(crate) fn fail_on_error(local: Option<&FailLogger>, msg: &str, err: &dyn Display) {
    let message = format!("{}: {}", msg, err);

    match local.cloned().or_else(installed) {
        Some(logger) => logger(&message),
        None => {
            error!("{}", message);
            std::process::exit(1);
        }
    }
}

/// Best-effort path: never exits.
pub(crate) fn report(msg: &str, err: &dyn Display) {
    let message = format!("{}: {}", msg, err);
    warn!("{}", message);

    if let Some(logger) = installed() {
        logger(&message);
    }
}
