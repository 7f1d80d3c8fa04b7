//! Timestamp formatting for record output
//!
//! Records carry whole epoch seconds. The default rendering is
//! `YYYY-MM-DD HH:MM:SS` in the local time zone; UTC, RFC 3339, raw Unix
//! seconds and custom strftime layouts are also available.

use super::error::{Result, TargetError};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Layout used for the `timestamp` field
///
/// # Examples
///
/// ```
/// use json_log_target::TimestampFormat;
///
/// let format = TimestampFormat::Utc;
/// assert_eq!(format.format_epoch(0), "1970-01-01 00:00:00");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// `2025-01-08 10:30:45` in the process's local time zone
    #[default]
    Local,

    /// `2025-01-08 10:30:45` in UTC
    Utc,

    /// RFC 3339 with offset: `2025-01-08T10:30:45+00:00`
    Rfc3339,

    /// Unix timestamp in seconds: `1736332245`
    Unix,

    /// Custom strftime layout, rendered in local time
    Custom(String),
}

const DATE_TIME_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

impl TimestampFormat {
    /// Format epoch seconds according to this layout
    ///
    /// Seconds outside chrono's representable range are rendered as the
    /// plain integer.
    #[must_use]
    pub fn format_epoch(&self, seconds: i64) -> String {
        let Some(utc) = DateTime::<Utc>::from_timestamp(seconds, 0) else {
            return seconds.to_string();
        };

        match self {
            TimestampFormat::Local => utc.with_timezone(&Local).format(DATE_TIME_LAYOUT).to_string(),
            TimestampFormat::Utc => utc.format(DATE_TIME_LAYOUT).to_string(),
            TimestampFormat::Rfc3339 => utc.to_rfc3339(),
            TimestampFormat::Unix => seconds.to_string(),
            TimestampFormat::Custom(layout) => utc.with_timezone(&Local).format(layout).to_string(),
        }
    }

    /// Reject custom layouts chrono cannot render
    pub fn validate(&self) -> Result<()> {
        if let TimestampFormat::Custom(layout) = self {
            if StrftimeItems::new(layout).any(|item| matches!(item, Item::Error)) {
                return Err(TargetError::config(
                    "TimestampFormat",
                    format!("invalid strftime layout '{}'", layout),
                ));
            }
        }
        Ok(())
    }
}
