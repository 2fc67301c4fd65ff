// src/log.rs
//
// tracing setup: human-readable lines on stderr plus a plain-text copy in
// `<store>/.log/debug.log`. Filter comes from `SEAT_WATCH_LOG` (EnvFilter
// syntax), default `info`.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::consts::{LOG_ENV, LOG_FILE, LOG_SUBDIR};
use crate::file::ensure_directory;

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Hold the returned guard until exit so the
/// file writer flushes; `None` means stderr only (log dir unusable).
pub fn init(store_dir: &Path) -> Option<WorkerGuard> {
    let log_dir = store_dir.join(LOG_SUBDIR);

    if let Err(e) = ensure_directory(&log_dir) {
        eprintln!("Cannot create log directory {}: {}; logging to stderr only", log_dir.display(), e);
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .with(filter())
            .try_init();
        return None;
    }

    let appender = tracing_appender::rolling::never(&log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file_layer = fmt::layer().with_writer(writer).with_ansi(false);

    let _ = tracing_subscriber::registry()
        .with(file_layer)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter())
        .try_init();

    tracing::debug!(log_file = %log_dir.join(LOG_FILE).display(), "logging initialized");
    Some(guard)
}
