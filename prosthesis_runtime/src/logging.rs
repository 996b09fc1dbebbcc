//! Subscriber setup: pretty console output plus an optional JSON-lines file.

use std::path::Path;
use std::sync::OnceLock;

use eyre::WrapErr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Keeps the non-blocking file writer flushing until process exit.
pub static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Expects a value already checked by `Config::validate`.
pub fn rotation_from(s: Option<&str>) -> Rotation {
    match s {
        Some("daily") => Rotation::DAILY,
        Some("hourly") => Rotation::HOURLY,
        _ => Rotation::NEVER,
    }
}

/// `RUST_LOG` wins over the configured level.
pub fn filter_from(level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or("info")))
}

pub fn init(cfg: &prosthesis_config::Logging) -> eyre::Result<()> {
    let console = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_filter(filter_from(cfg.level.as_deref()));

    let file_layer = match cfg.file.as_deref() {
        Some(path) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|d| !d.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file has no file name: {}", path.display()))?;
            std::fs::create_dir_all(dir)
                .wrap_err_with(|| format!("create log dir {}", dir.display()))?;
            let appender = RollingFileAppender::new(rotation_from(cfg.rotation.as_deref()), dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_filter(filter_from(cfg.level.as_deref())),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init()
        .wrap_err("install tracing subscriber")?;
    Ok(())
}
