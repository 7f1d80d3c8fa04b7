//! Declarative target configuration
//!
//! Everything here is plain data and can be loaded with serde. Validation
//! (mask paths, category patterns, timestamp layouts) happens in
//! [`TargetBuilder::build`](super::target::TargetBuilder::build).

use super::error::Result;
use super::log_level::LogLevel;
use super::timestamp::TimestampFormat;
use serde::{Deserialize, Serialize};

/// Records accumulated before an automatic flush
pub const DEFAULT_EXPORT_INTERVAL: usize = 1000;

/// Recognized target options
///
/// # Example
///
/// ```
/// use json_log_target::TargetConfig;
///
/// let config = TargetConfig::from_json(r#"{"maskVars": ["message.password"], "exportInterval": 10}"#).unwrap();
/// assert_eq!(config.export_interval, 10);
/// assert!(config.include_context);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TargetConfig {
    /// Dotted paths masked in every exported record
    pub mask_vars: Vec<String>,
    /// Attach the global-context snapshot to records at flush time
    pub include_context: bool,
    /// Decode textual messages holding JSON
    pub decode_message: bool,
    /// Flush once this many records are batched; `0` flushes only on final
    pub export_interval: usize,
    /// Admitted levels; empty admits all
    pub levels: Vec<LogLevel>,
    /// Admitted category patterns; empty admits all
    pub categories: Vec<String>,
    /// Excluded category patterns
    pub except: Vec<String>,
    /// Global variables captured into `context`
    pub log_vars: Vec<String>,
    pub timestamp_format: TimestampFormat,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            mask_vars: Vec::new(),
            include_context: true,
            decode_message: true,
            export_interval: DEFAULT_EXPORT_INTERVAL,
            levels: Vec::new(),
            categories: Vec::new(),
            except: Vec::new(),
            log_vars: Vec::new(),
            timestamp_format: TimestampFormat::default(),
        }
    }
}

impl TargetConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
