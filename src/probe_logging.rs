//! Compile-time gated debug logging utilities for the probe.

/// Emit probe debug logs only when the `probe_debug_logs` Cargo feature is
/// enabled.
///
/// With the feature disabled (default), this macro compiles to a no-op while
/// still type-checking format arguments.
#[macro_export]
macro_rules! probe_debug_log {
    ($($arg:tt)*) => {{
        #[cfg(feature = "probe_debug_logs")]
        {
            eprintln!($($arg)*);
        }
        #[cfg(not(feature = "probe_debug_logs"))]
        {
            let _ = format_args!($($arg)*);
        }
    }};
}
