//! Tracing initialization and subscriber setup.

use super::file_writer::FileWriter;
use crate::infrastructure::expand_tilde;
use crate::Config;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LEVEL: &str = "info";

fn env_filter(config: &Config) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(config.trace_level.as_deref().unwrap_or(DEFAULT_LEVEL))
    })
}

/// Initializes the global tracing subscriber.
///
/// Sets up a subscriber pipeline that:
/// 1. Filters events by `RUST_LOG`, else `config.trace_level`, else `"info"`
/// 2. Formats them as text lines
/// 3. Writes them to `config.log_file` if set, otherwise to stderr
///
/// # Initialization Behavior
///
/// - Creates the log file's parent directory if it doesn't exist
/// - Falls back to stderr if that directory cannot be created
/// - Idempotent: Safe to call multiple times (only first call takes effect)
pub fn init_tracing(config: &Config) {
    let filter = env_filter(config);

    let log_file = config.log_file.as_deref().map(|path| PathBuf::from(expand_tilde(path)));
    let log_file = log_file.filter(|path| {
        path.parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map_or(true, |parent| std::fs::create_dir_all(parent).is_ok())
    });

    let result = match log_file {
        Some(path) => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_ansi(false).with_writer(FileWriter::new(path)))
            .try_init(),
        None => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };

    if result.is_ok() {
        tracing::debug!("tracing initialized");
    }
}
