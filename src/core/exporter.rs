//! Exporter trait for batch output destinations

use super::error::Result;
use serde_json::Value;

/// Receives a flushed batch
///
/// Records arrive masked and in collection order. Sinks that write text use
/// [`encode_line`] so every record becomes exactly one line.
pub trait Exporter: Send {
    fn export(&mut self, records: &[Value]) -> Result<()>;
    fn name(&self) -> &str;
}

/// Encode one record as a single-line JSON object
pub fn encode_line(record: &Value) -> Result<String> {
    Ok(serde_json::to_string(record)?)
}
