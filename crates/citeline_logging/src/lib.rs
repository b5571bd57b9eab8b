#![deny(missing_docs)]
//! Shared logging utilities for the citeline workspace.
//!
//! This crate provides the `citeline_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Messages logged while
//! a turn is active carry a `[turn N]` prefix so interleaved stream, search and
//! viewer activity can be told apart in one log.

use std::sync::atomic::{AtomicU64, Ordering};

/// Turn currently being streamed; 0 when idle.
static ACTIVE_TURN: AtomicU64 = AtomicU64::new(0);

/// Records the turn whose events are currently being applied.
/// Pass 0 once the turn has reached its terminal event.
pub fn set_active_turn(turn: u64) {
    ACTIVE_TURN.store(turn, Ordering::Relaxed);
}

/// Retrieves the active turn, or 0 if none is streaming.
pub fn active_turn() -> u64 {
    ACTIVE_TURN.load(Ordering::Relaxed)
}

/// Prefix prepended by the logging macros.
#[doc(hidden)]
pub fn turn_prefix() -> String {
    match active_turn() {
        0 => String::new(),
        turn => format!("[turn {turn}] "),
    }
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! citeline_trace {
    ($($arg:tt)*) => {{
        log::trace!("{}{}", $crate::turn_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! citeline_info {
    ($($arg:tt)*) => {{
        log::info!("{}{}", $crate::turn_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! citeline_debug {
    ($($arg:tt)*) => {{
        log::debug!("{}{}", $crate::turn_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! citeline_warn {
    ($($arg:tt)*) => {{
        log::warn!("{}{}", $crate::turn_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! citeline_error {
    ($($arg:tt)*) => {{
        log::error!("{}{}", $crate::turn_prefix(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
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

#[cfg(test)]
mod tests {
    use super::{active_turn, set_active_turn, turn_prefix};

    #[test]
    fn prefix_follows_active_turn() {
        set_active_turn(0);
        assert_eq!(turn_prefix(), "");
        set_active_turn(4);
        assert_eq!(active_turn(), 4);
        assert_eq!(turn_prefix(), "[turn 4] ");
        set_active_turn(0);
    }
}
