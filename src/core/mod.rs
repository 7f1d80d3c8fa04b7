//! Core target types and traits

pub mod app_info;
pub mod config;
pub mod context;
pub mod error;
pub mod exporter;
pub mod filter;
pub mod formatter;
pub mod log_level;
pub mod metrics;
pub mod normalizer;
pub mod payload;
pub mod raw_record;
pub mod redactor;
pub mod shared;
pub mod target;
pub mod timestamp;
pub mod traces;

pub use app_info::{AmbientAppInfo, AmbientState, AppInfo, AppInfoProvider, SessionState, UNKNOWN};
pub use config::{TargetConfig, DEFAULT_EXPORT_INTERVAL};
pub use context::{ContextGuard, ContextSource, GlobalContext};
pub use error::{Result, TargetError};
pub use exporter::{encode_line, Exporter};
pub use filter::{CategoryPattern, MessageFilter, RecordFilter};
pub use formatter::{FormattedRecord, RecordFormatter};
pub use log_level::LogLevel;
pub use metrics::TargetMetrics;
pub use normalizer::normalize;
pub use payload::{ErrorPayload, Payload};
pub use raw_record::{RawRecord, StackFrame};
pub use redactor::{mask_path, MaskPath, Redactor, MASK_TOKEN};
pub use shared::SharedTarget;
pub use target::{FlushState, JsonTarget, TargetBuilder};
pub use timestamp::TimestampFormat;
pub use traces::format_traces;
