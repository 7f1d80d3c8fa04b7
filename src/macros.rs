//! Macros for building records and collecting them into a target.
//!
//! Each record carries the call site as its single stack frame, so the
//! `traces` field points at the line that logged it.
//!
//! # Examples
//!
//! ```
//! use json_log_target::prelude::*;
//! use json_log_target::exporters::MemoryExporter;
//! use json_log_target::{error, info};
//!
//! let exporter = MemoryExporter::new();
//! let handle = exporter.handle();
//! let mut target = JsonTarget::builder().exporter(exporter).build().unwrap();
//!
//! info!(target, "app.http", "Server listening on port {}", 8080).unwrap();
//! error!(target, "app.db", r#"{{"query": "SELECT 1", "code": {}}}"#, 500).unwrap();
//! target.flush().unwrap();
//!
//! let records = handle.records();
//! assert_eq!(records[0]["message"], "Server listening on port 8080");
//! assert_eq!(records[1]["message"]["code"], 500);
//! assert!(records[1]["traces"][0].as_str().unwrap().starts_with("in "));
//! ```

/// Build a [`RawRecord`](crate::RawRecord) stamped with the current time
/// and the call site.
///
/// ```
/// use json_log_target::{record, LogLevel};
///
/// let record = record!(LogLevel::Warn, "app.cache", "miss rate {}%", 40);
/// assert_eq!(record.category, "app.cache");
/// assert_eq!(record.frames.len(), 1);
/// ```
#[macro_export]
macro_rules! record {
    ($level:expr, $category:expr, $($arg:tt)+) => {
        $crate::RawRecord::now(::std::format!($($arg)+), $level, $category)
            .with_frame(::std::file!(), ::std::line!())
    };
}

/// Collect one formatted record into a target.
///
/// Evaluates to the `Result` of `collect`, which carries any export error
/// when the record triggers a flush.
#[macro_export]
macro_rules! log {
    ($target:expr, $level:expr, $category:expr, $($arg:tt)+) => {
        $target.collect(::std::vec![$crate::record!($level, $category, $($arg)+)], false)
    };
}

#[macro_export]
macro_rules! trace {
    ($target:expr, $category:expr, $($arg:tt)+) => {
        $crate::log!($target, $crate::LogLevel::Trace, $category, $($arg)+)
    };
}

#[macro_export]
macro_rules! debug {
    ($target:expr, $category:expr, $($arg:tt)+) => {
        $crate::log!($target, $crate::LogLevel::Debug, $category, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($target:expr, $category:expr, $($arg:tt)+) => {
        $crate::log!($target, $crate::LogLevel::Info, $category, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($target:expr, $category:expr, $($arg:tt)+) => {
        $crate::log!($target, $crate::LogLevel::Warn, $category, $($arg)+)
    };
}

#[macro_export]
macro_rules! error {
    ($target:expr, $category:expr, $($arg:tt)+) => {
        $crate::log!($target, $crate::LogLevel::Error, $category, $($arg)+)
    };
}

#[macro_export]
macro_rules! fatal {
    ($target:expr, $category:expr, $($arg:tt)+) => {
        $crate::log!($target, $crate::LogLevel::Fatal, $category, $($arg)+)
    };
}
