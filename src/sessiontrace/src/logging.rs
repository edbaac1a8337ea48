use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, time::SystemTime},
    prelude::*,
    EnvFilter,
};

/// Installs the global subscriber. `RUST_LOG` overrides the level picked
/// from `debug`.
pub fn setup_logging(debug: bool, log_file: Option<&Path>) -> Result<()> {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // sqlx and friends log through the `log` facade
    tracing_log::LogTracer::init().context("Failed to install log bridge")?;

    let layer = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(true)
        .with_level(true)
        .with_timer(SystemTime);

    match log_file {
        Some(path) => {
            let directory = path.parent().unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .with_context(|| format!("log file {:?} has no file name", path))?;
            let file_appender = RollingFileAppender::new(Rotation::NEVER, directory, file_name);

            let subscriber = tracing_subscriber::registry()
                .with(filter)
                .with(layer.with_ansi(false).with_writer(file_appender));
            tracing::subscriber::set_global_default(subscriber)
                .context("Failed to set tracing subscriber")?;
            tracing::info!("Logging system initialized. Writing to {:?}", path);
        }
        None => {
            let subscriber = tracing_subscriber::registry()
                .with(filter)
                .with(layer.with_writer(std::io::stderr));
            tracing::subscriber::set_global_default(subscriber)
                .context("Failed to set tracing subscriber")?;
        }
    }

    Ok(())
}
