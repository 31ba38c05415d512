//! This crate used to wrap `slog`; it now sits directly on top of `tracing`.
//! The `log_*!` macros below keep the old slog-style call sites (which pass
//! a logger handle as the first argument) working without touching every
//! call site in the workspace — the logger argument is accepted and ignored,
//! since `tracing` dispatches through thread-local subscribers instead.

use std::sync::Once;

/// Placeholder for the logger handle that used to carry structured key-value
/// context under slog. `tracing`'s spans fill that role now; this type only
/// exists so `log_*!` call sites that pass a logger value keep compiling.
#[derive(Clone, Copy, Debug, Default)]
pub struct Logger;

/// Macros mirroring the old `slog`-style `log_info!(logger, "msg {}", x)`
/// call convention, forwarding straight to the matching `tracing` macro.
pub mod log {
    #[macro_export]
    macro_rules! log_crit {
        ($logger:expr, $($arg:tt)*) => {{ let _ = &$logger; tracing::error!($($arg)*); }};
    }
    #[macro_export]
    macro_rules! log_error {
        ($logger:expr, $($arg:tt)*) => {{ let _ = &$logger; tracing::error!($($arg)*); }};
    }
    #[macro_export]
    macro_rules! log_warn {
        ($logger:expr, $($arg:tt)*) => {{ let _ = &$logger; tracing::warn!($($arg)*); }};
    }
    #[macro_export]
    macro_rules! log_info {
        ($logger:expr, $($arg:tt)*) => {{ let _ = &$logger; tracing::info!($($arg)*); }};
    }
    #[macro_export]
    macro_rules! log_debug {
        ($logger:expr, $($arg:tt)*) => {{ let _ = &$logger; tracing::debug!($($arg)*); }};
    }
    #[macro_export]
    macro_rules! log_trace {
        ($logger:expr, $($arg:tt)*) => {{ let _ = &$logger; tracing::trace!($($arg)*); }};
    }

    /// Logs at error level and then panics. Reserved for the invariant
    /// violations the error-handling design calls fatal: a node that hits
    /// one cannot make safe forward progress.
    #[macro_export]
    macro_rules! fatal {
        ($logger:expr, $($arg:tt)*) => {{
            let _ = &$logger;
            tracing::error!($($arg)*);
            panic!($($arg)*);
        }};
    }
}

pub use crate::{fatal, log_crit, log_debug, log_error, log_info, log_trace, log_warn};

static INIT: Once = Once::new();

fn init_tracing_subscriber(use_json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("FBC_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = fmt().with_env_filter(filter).with_target(true);
        let result = if use_json {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        };
        // A subscriber may already be installed by a test harness; that's fine.
        let _ = result;
    });
}

/// Installs the process-wide tracing subscriber, honoring `FBC_LOG_JSON`.
pub fn create_root_logger() -> Logger {
    let use_json = std::env::var("FBC_LOG_JSON").is_ok();
    init_tracing_subscriber(use_json);
    Logger
}

/// Installs a subscriber suitable for test output (never JSON).
pub fn create_test_logger(_test_name: &str) -> Logger {
    init_tracing_subscriber(false);
    Logger
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_logger_does_not_panic() {
        let _ = create_root_logger();
    }

    #[test]
    fn test_logger_does_not_panic() {
        let _ = create_test_logger("logger::tests");
    }

    #[test]
    fn macros_accept_ignored_logger_arg() {
        let logger = Logger;
        log_info!(logger, "hello {}", 1);
        log_debug!(logger, "debug");
        log_warn!(logger, "warn");
        log_error!(logger, "error");
        log_trace!(logger, "trace");
    }
}
