//! Debug tracing for table construction and the GLR driver.
//!
//! Mirrors the teacher's `rustemo::debug::{log, logn}` macros used throughout
//! `glr/parser.rs`: cheap to call, a no-op unless the parser was built with
//! `debug: true`, colored with `colored` when printed.

use std::cell::Cell;

thread_local! {
    static DEBUG_ENABLED: Cell<bool> = Cell::new(false);
}

/// Enables or disables tracing for the current thread. Called once by a
/// parser whose `Settings::debug` is `true` before it starts a parse.
pub fn set_enabled(enabled: bool) {
    DEBUG_ENABLED.with(|c| c.set(enabled));
}

pub fn enabled() -> bool {
    DEBUG_ENABLED.with(|c| c.get())
}

/// Prints a line, only when debug tracing is enabled.
#[macro_export]
macro_rules! log {
    ($($arg:tt)*) => {
        if $crate::debug::enabled() {
            eprintln!($($arg)*);
        }
    };
}

/// Prints without a trailing newline, only when debug tracing is enabled.
#[macro_export]
macro_rules! logn {
    ($($arg:tt)*) => {
        if $crate::debug::enabled() {
            eprint!($($arg)*);
        }
    };
}

pub use crate::log;
pub use crate::logn;
