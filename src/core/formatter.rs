//! Record enrichment: raw record in, formatted record out

use super::app_info::AppInfoProvider;
use super::error::Result;
use super::log_level::LogLevel;
use super::normalizer::normalize;
use super::raw_record::RawRecord;
use super::timestamp::TimestampFormat;
use super::traces::format_traces;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// One output record, serialized as a single JSON line
///
/// Field order is part of the output format: `timestamp`, `level`,
/// `category`, `traces`, `message`, then `ip`, `userId`, `sessionId` when
/// present, then `context` when context capture is enabled (`null` until a
/// flush fills it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedRecord {
    pub timestamp: String,
    pub level: LogLevel,
    pub category: String,
    pub traces: Vec<String>,
    pub message: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// `None` omits the field; `Some(Value::Null)` writes `"context":null`
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_field"
    )]
    pub context: Option<Value>,
}

/// Maps a present field to `Some`, including an explicit `null`
fn present_field<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl FormattedRecord {
    /// Convert into the JSON tree that masking and export operate on
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Serialize to a single JSON line
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Turns raw records into formatted records
#[derive(Clone)]
pub struct RecordFormatter {
    decode_message: bool,
    include_context: bool,
    timestamp_format: TimestampFormat,
    app_info: Option<Arc<dyn AppInfoProvider>>,
}

impl Default for RecordFormatter {
    fn default() -> Self {
        Self {
            decode_message: true,
            include_context: true,
            timestamp_format: TimestampFormat::default(),
            app_info: None,
        }
    }
}

impl RecordFormatter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode textual messages that hold JSON
    #[must_use]
    pub fn with_decode_message(mut self, decode: bool) -> Self {
        self.decode_message = decode;
        self
    }

    /// Reserve the `context` field on every record
    #[must_use]
    pub fn with_include_context(mut self, include: bool) -> Self {
        self.include_context = include;
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    #[must_use]
    pub fn with_app_info(mut self, provider: Arc<dyn AppInfoProvider>) -> Self {
        self.app_info = Some(provider);
        self
    }

    pub fn include_context(&self) -> bool {
        self.include_context
    }

    pub fn decode_message(&self) -> bool {
        self.decode_message
    }

    pub fn format(&self, record: &RawRecord) -> FormattedRecord {
        let info = self
            .app_info
            .as_ref()
            .map(|provider| provider.app_info(record))
            .unwrap_or_default();

        FormattedRecord {
            timestamp: self.timestamp_format.format_epoch(record.timestamp),
            level: record.level,
            category: record.category.clone(),
            traces: format_traces(record),
            message: normalize(&record.payload, self.decode_message),
            ip: info.ip,
            user_id: info.user_id,
            session_id: info.session_id,
            context: self.include_context.then_some(Value::Null),
        }
    }
}

impl std::fmt::Debug for RecordFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordFormatter")
            .field("decode_message", &self.decode_message)
            .field("include_context", &self.include_context)
            .field("timestamp_format", &self.timestamp_format)
            .field("app_info", &self.app_info.is_some())
            .finish()
    }
}
