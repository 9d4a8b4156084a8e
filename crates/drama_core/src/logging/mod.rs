//! Logging infrastructure.
//!
//! Process-wide output goes through `tracing`; each unit additionally gets
//! a [`UnitLogger`] file holding its tool commands and output.
//!
//! # Example
//!
//! ```no_run
//! use drama_core::logging::{init_tracing, LogConfig, LogLevel, UnitLogger};
//!
//! init_tracing(LogLevel::Info);
//!
//! let logger = UnitLogger::new("drama-0001", "merge", "/dramas/.logs", LogConfig::default())
//!     .unwrap();
//! logger.phase("Concatenate");
//! logger.command("ffmpeg -f concat -safe 0 -i concat_list.txt -c copy out.mp4");
//! ```

mod types;
mod unit_logger;

pub use types::{LogConfig, LogLevel, MessagePrefix};
pub use unit_logger::UnitLogger;

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// File name prefix of the rolling process log.
pub const LOG_FILE_PREFIX: &str = "drama_processor.log";

/// Initialize the global subscriber writing to stderr.
///
/// `RUST_LOG` wins over `default_level`. Call once at startup.
pub fn init_tracing(default_level: LogLevel) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_names(true))
        .with(env_filter(default_level))
        .init();
}

/// Like [`init_tracing`], plus a daily-rolling file in `log_dir`.
///
/// Keep the returned guard alive; dropping it flushes and stops the
/// background writer.
pub fn init_tracing_with_file(default_level: LogLevel, log_dir: &Path) -> WorkerGuard {
    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_names(true))
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .with(env_filter(default_level))
        .init();

    guard
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

fn env_filter(default_level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()))
}
