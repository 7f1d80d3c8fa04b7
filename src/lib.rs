//! # JSON Log Target
//!
//! Turns log records into single-line JSON objects and exports them in
//! batches.
//!
//! ## Features
//!
//! - **Message normalization**: structured payloads pass through, JSON text
//!   is decoded, errors become their message with the trace in `traces`
//! - **Enrichment**: client address, user and session ids, plus a snapshot
//!   of selected global variables shared by every record of a batch
//! - **Masking**: configured dotted paths are replaced by `***` right
//!   before export
//! - **Batching**: records accumulate until a final flush or the export
//!   interval is reached
//! - **Exporters**: memory, any `Write`, locked and rotating files, and a
//!   background worker
//!
//! ## Example
//!
//! ```
//! use json_log_target::prelude::*;
//! use json_log_target::exporters::JsonLinesExporter;
//!
//! let mut target = JsonTarget::builder()
//!     .exporter(JsonLinesExporter::stdout())
//!     .mask_vars(["message.card"])
//!     .build()
//!     .unwrap();
//!
//! target
//!     .collect(vec![RawRecord::now(r#"{"card": "4111", "amount": 10}"#, LogLevel::Info, "billing")], true)
//!     .unwrap();
//! ```

pub mod core;
pub mod exporters;
pub mod macros;

pub mod prelude {
    pub use crate::core::{
        AppInfo, AppInfoProvider, ContextGuard, ContextSource, ErrorPayload, Exporter,
        FormattedRecord, GlobalContext, JsonTarget, LogLevel, MessageFilter, Payload, RawRecord,
        RecordFilter, Result, SharedTarget, TargetBuilder, TargetConfig, TargetError,
        TargetMetrics, TimestampFormat,
    };
}

pub use crate::core::{
    encode_line, format_traces, mask_path, normalize, AmbientAppInfo, AmbientState, AppInfo,
    AppInfoProvider, CategoryPattern, ContextGuard, ContextSource, ErrorPayload, Exporter,
    FlushState, FormattedRecord, GlobalContext, JsonTarget, LogLevel, MaskPath, MessageFilter,
    Payload, RawRecord, RecordFilter, RecordFormatter, Redactor, Result, SessionState,
    SharedTarget, StackFrame, TargetBuilder, TargetConfig, TargetError, TargetMetrics,
    TimestampFormat, DEFAULT_EXPORT_INTERVAL, MASK_TOKEN, UNKNOWN,
};
