//! Logging infrastructure.
//!
//! This module provides:
//! - Per-job loggers writing to a file (or memory) plus an optional GUI callback
//! - Compact mode keeping external tool output in a tail buffer
//! - Global `tracing` initialisation for library-level diagnostics
//!
//! # Example
//!
//! ```no_run
//! use vam_core::logging::{JobLogger, LogConfig};
//!
//! let logger = JobLogger::new("intro_mix", "/path/to/logs", LogConfig::default(), None).unwrap();
//! logger.phase("Mixdown");
//! logger.command("ffmpeg -i intro.mp4 ...");
//! logger.success("Mix written");
//! ```

mod job_logger;
mod types;

use std::path::Path;

pub use job_logger::{format_tokens_pretty, JobLogger};
pub use types::{GuiLogCallback, LogConfig, LogLevel, MessagePrefix};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// File name of the application-wide log inside the logs folder.
pub const APP_LOG_FILE: &str = "vam.log";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_level`. Output goes to stderr
/// and, when `log_dir` is given, to `<log_dir>/vam.log`. Keep the returned
/// guard alive for as long as file logging is wanted. Calling this twice is
/// harmless; the second subscriber is discarded.
pub fn init_tracing(default_level: LogLevel, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter()));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, APP_LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(file_layer)
        .try_init();

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_does_not_panic() {
        init_test_tracing();
        let guard = init_tracing(LogLevel::Info, None);
        assert!(guard.is_none());
    }
}
