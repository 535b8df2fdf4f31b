//! Module-level configuration: the debug-logging toggle.
//!
//! Single writer (the host's module-parameter mechanism, or a test),
//! many readers (every create-path log call site). `Relaxed` ordering is
//! enough since the toggle only gates optional diagnostic output and has
//! no effect on correctness.

use core::sync::atomic::{AtomicBool, Ordering};

static DEBUG: AtomicBool = AtomicBool::new(false);

pub fn set_debug(enabled: bool) {
    DEBUG.store(enabled, Ordering::Relaxed);
}

pub fn debug_enabled() -> bool {
    DEBUG.load(Ordering::Relaxed)
}

/// Trace a create-transaction step when the debug toggle is on. A macro
/// rather than a function so the format arguments are never evaluated when
/// debug logging is off.
macro_rules! ksvc_debug {
    ($($arg:tt)*) => {
        if $crate::drivers::ksvc::config::debug_enabled() {
            log::debug!($($arg)*);
        }
    };
}

pub(crate) use ksvc_debug;
