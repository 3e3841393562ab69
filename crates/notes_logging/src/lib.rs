#![deny(missing_docs)]
//! Shared logging utilities for the notes2md workspace.
//!
//! This crate provides the `notes_*` logging macros used across the codebase
//! a [`ScopedTimer`] that reports how long a block of work took, and a
//! minimal test initializer for the global logger.

use std::time::{Duration, Instant};

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! notes_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! notes_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! notes_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! notes_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! notes_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

/// Logs the wall-clock time spent in a scope when dropped.
///
/// The report is emitted on every exit path, including early returns with `?`.
#[must_use = "the timer reports when it is dropped"]
pub struct ScopedTimer {
    label: String,
    started: Instant,
}

impl ScopedTimer {
    /// Starts timing a scope identified by `label`.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            started: Instant::now(),
        }
    }

    /// Time elapsed since the timer was started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        log::info!(
            "{} took {:.4} seconds",
            self.label,
            self.started.elapsed().as_secs_f64()
        );
    }
}
