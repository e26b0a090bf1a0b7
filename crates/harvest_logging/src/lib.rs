#![deny(missing_docs)]
//! Logging front end for the well harvest crates.
//!
//! The `harvest_*` macros log through the `log` facade re-exported here, so
//! calling crates need no `log` dependency of their own. Every record is
//! tagged with [`TARGET`] unless the call names a sub-target such as
//! [`PROGRESS_TARGET`]; a single prefix filter on [`TARGET`] therefore keeps
//! harvest output apart from the HTTP stack's.

#[doc(hidden)]
pub use log;

pub use log::LevelFilter;

/// Target of every record logged through the `harvest_*` macros.
pub const TARGET: &str = "well_harvest";

/// Sub-target for per-cycle and per-record progress lines.
pub const PROGRESS_TARGET: &str = "well_harvest::progress";

#[doc(hidden)]
#[macro_export]
macro_rules! __harvest_log {
    ($level:expr, target: $target:expr, $($arg:tt)+) => {
        $crate::log::log!(target: $target, $level, $($arg)+)
    };
    ($level:expr, $($arg:tt)+) => {
        $crate::log::log!(target: $crate::TARGET, $level, $($arg)+)
    };
}

/// Logs at trace level; accepts an optional leading `target: ...`.
#[macro_export]
macro_rules! harvest_trace {
    ($($arg:tt)+) => { $crate::__harvest_log!($crate::log::Level::Trace, $($arg)+) };
}

/// Logs at debug level; accepts an optional leading `target: ...`.
#[macro_export]
macro_rules! harvest_debug {
    ($($arg:tt)+) => { $crate::__harvest_log!($crate::log::Level::Debug, $($arg)+) };
}

/// Logs at info level; accepts an optional leading `target: ...`.
#[macro_export]
macro_rules! harvest_info {
    ($($arg:tt)+) => { $crate::__harvest_log!($crate::log::Level::Info, $($arg)+) };
}

/// Logs at warn level; accepts an optional leading `target: ...`.
#[macro_export]
macro_rules! harvest_warn {
    ($($arg:tt)+) => { $crate::__harvest_log!($crate::log::Level::Warn, $($arg)+) };
}

/// Logs at error level; accepts an optional leading `target: ...`.
#[macro_export]
macro_rules! harvest_error {
    ($($arg:tt)+) => { $crate::__harvest_log!($crate::log::Level::Error, $($arg)+) };
}

/// Routes harvest records at every level to the test harness's captured
/// output. Records from other targets are dropped. Safe to call from many
/// tests; only the first call installs the logger.
pub fn initialize_for_tests() {
    let config = simplelog::ConfigBuilder::new()
        .add_filter_allow_str(TARGET)
        .build();
    let _ = simplelog::TestLogger::init(LevelFilter::Trace, config);
}
