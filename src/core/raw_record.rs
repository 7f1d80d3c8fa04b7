//! Raw log record as handed over by the upstream logger

use super::log_level::LogLevel;
use super::payload::Payload;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A call site attached to a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    pub file: String,
    pub line: u32,
}

impl StackFrame {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "in {}:{}", self.file, self.line)
    }
}

/// `(payload, level, category, timestamp, frames)` tuple produced upstream
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub payload: Payload,
    pub level: LogLevel,
    pub category: String,
    /// Seconds since the Unix epoch
    pub timestamp: i64,
    pub frames: Vec<StackFrame>,
}

impl RawRecord {
    pub fn new(
        payload: impl Into<Payload>,
        level: LogLevel,
        category: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            payload: payload.into(),
            level,
            category: category.into(),
            timestamp,
            frames: Vec::new(),
        }
    }

    /// Create a record stamped with the current time
    pub fn now(payload: impl Into<Payload>, level: LogLevel, category: impl Into<String>) -> Self {
        Self::new(payload, level, category, Utc::now().timestamp())
    }

    pub fn with_frame(mut self, file: impl Into<String>, line: u32) -> Self {
        self.frames.push(StackFrame::new(file, line));
        self
    }

    pub fn with_frames(mut self, frames: Vec<StackFrame>) -> Self {
        self.frames = frames;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_default_to_empty() {
        let record = RawRecord::new("hello", LogLevel::Info, "app", 0);
        assert!(record.frames.is_empty());
        assert_eq!(record.payload, Payload::Text("hello".to_string()));
    }

    #[test]
    fn test_with_frame_appends() {
        let record = RawRecord::now("hello", LogLevel::Info, "app")
            .with_frame("src/a.rs", 10)
            .with_frame("src/b.rs", 20);

        assert_eq!(record.frames.len(), 2);
        assert_eq!(record.frames[1].to_string(), "in src/b.rs:20");
        assert!(record.timestamp > 0);
    }
}
