//! # Logging Initialization
//!
//! One entry point, [`init_logging`], installs the global `tracing` subscriber.
//! It is guarded by a `std::sync::Once`, so calling it again (for example from
//! several tests) is harmless.
//!
//! ## Sinks
//!
//! 1.  **Filter**: `RUST_LOG` wins when set. Otherwise the requested level
//!     applies to every crate, including `polyfmt`.
//!
//! 2.  **Stderr (default)**: formatted output owns stdout, so diagnostics go to
//!     stderr. ANSI colors are enabled only when stderr is a terminal.
//!
//! 3.  **File (opt-in)**: with `log_to_file = true` a daily rolling
//!     `polyfmt.log` is written to the user cache directory found through the
//!     `directories` crate. When that directory is missing or not writable the
//!     logger falls back to stderr.

use anyhow::Result;
use directories::ProjectDirs;
use std::{
    io::{IsTerminal, stderr},
    path::Path,
    sync::Once,
};
use tracing_subscriber::{EnvFilter, fmt::layer, prelude::*};

static INIT: Once = Once::new();

const LOG_FILE_NAME: &str = "polyfmt.log";

/// Verbose stderr logging for tests.
pub fn init_test_logging() {
    // The Once guard makes repeated calls no-ops; the result is always Ok.
    let _ = init_logging("trace", false);
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Currently infallible; the `Result` leaves room for sinks that can fail.
pub fn init_logging(log_level: &str, log_to_file: bool) -> Result<()> {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("{log_level},polyfmt={log_level}")));

        if log_to_file && let Some(log_dir) = log_directory() {
            // tracing_appender::rolling::daily panics on permission errors,
            // so probe the directory first.
            if can_write(&log_dir) {
                let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_NAME);
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(layer().with_writer(non_blocking).with_ansi(false))
                    .init();
                // Leaked so buffered lines are flushed at exit.
                Box::leak(Box::new(guard));
                return;
            }
        }

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                layer()
                    .with_writer(stderr)
                    .with_ansi(stderr().is_terminal()),
            )
            .init();
    });

    Ok(())
}

/// Cache directory that receives `polyfmt.log`.
pub fn log_directory() -> Option<std::path::PathBuf> {
    ProjectDirs::from("com", "Polyfmt", "polyfmt").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Creates `dir` if needed and checks that a file can be written into it.
fn can_write(dir: &Path) -> bool {
    if std::fs::create_dir_all(dir).is_err() {
        return false;
    }
    let probe = dir.join(".polyfmt_log_probe");
    match std::fs::write(&probe, b"probe") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}
