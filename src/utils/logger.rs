//! Process-wide tracing setup.
//!
//! Engine and storage code log under `app::conflict`, `app::assembly`,
//! `app::config` and `app::db`; `RUST_LOG` overrides the default directives.

use std::path::Path;

use once_cell::sync::OnceCell;
use tracing_subscriber::{
    fmt, fmt::time::UtcTime, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use crate::error::{AppError, AppResult};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();
// Dropping the guard stops the file writer, so it lives for the whole process.
static LOGGER_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

const LOG_FILE_NAME: &str = "confsched.log";
const DEFAULT_LOG_DIRECTIVES: &str = "info,app::conflict=debug,app::assembly=debug,app::db=info";

/// Installs the global subscriber once: a daily rolling file under `log_dir`
/// plus stdout. Later calls are no-ops.
pub fn init_logging(log_dir: impl AsRef<Path>) -> AppResult<()> {
    let log_dir = log_dir.as_ref();
    LOGGER_INIT
        .get_or_try_init(|| {
            std::fs::create_dir_all(log_dir)?;

            let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let env_filter = EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_DIRECTIVES))
                .map_err(|err| AppError::other(format!("invalid log directives: {err}")))?;

            LOGGER_GUARD
                .set(guard)
                .map_err(|_| AppError::other("logger already initialized"))?;

            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true)
                        .with_timer(UtcTime::rfc_3339()),
                )
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_timer(UtcTime::rfc_3339()),
                )
                .try_init()
                .map_err(|err| AppError::other(format!("failed to install subscriber: {err}")))?;

            Ok::<(), AppError>(())
        })
        .map(|_| ())
}
