//! Daily log files for debug output.
//!
//! With `debug` on and `log_file_path` set, client events are written to
//! `<log_file_path>/YYYY-MM-DD.log`, one file per (UTC) day.

use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

use crate::error::ClientError;
use crate::settings::Settings;

/// Appender writing `YYYY-MM-DD.log` files under `settings.log_file_path`.
///
/// Returns `None` unless debug logging to a file is configured.
pub fn file_appender(settings: &Settings) -> Result<Option<RollingFileAppender>, ClientError> {
    let Some(dir) = settings.log_file_path.as_ref().filter(|_| settings.debug) else {
        return Ok(None);
    };
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_suffix("log")
        .build(dir)
        .map(Some)
        .map_err(|e| ClientError::Logging(format!("{}: {e}", dir.display())))
}

/// Subscriber writing synchronously into the daily file.
///
/// Suited to scoped use with `tracing::subscriber::with_default`.
pub fn file_subscriber(
    settings: &Settings,
) -> Result<Option<impl Subscriber + Send + Sync + 'static>, ClientError> {
    Ok(file_appender(settings)?.map(|appender| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(appender)
            .finish()
    }))
}

/// Install a global subscriber logging into the daily file.
///
/// Writes go through a background worker; keep the returned guard alive
/// for as long as events should be flushed.
///
/// # Errors
/// `ClientError::Logging` when the directory cannot be used or a global
/// subscriber is already set.
pub fn init_file_logging(settings: &Settings) -> Result<Option<WorkerGuard>, ClientError> {
    let Some(appender) = file_appender(settings)? else {
        return Ok(None);
    };
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(writer)
        .try_init()
        .map_err(|e| ClientError::Logging(e.to_string()))?;
    Ok(Some(guard))
}
