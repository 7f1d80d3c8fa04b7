//! JSON Lines exporter over any writer

use crate::core::{encode_line, Exporter, Result};
use serde_json::Value;
use std::io::{self, Write};

/// Writes each record as one single-line JSON object
///
/// Compatible with log shippers that expect JSONL (Filebeat, Vector, Loki
/// promtail). The writer is flushed once per batch.
///
/// # Example
///
/// ```
/// use json_log_target::exporters::JsonLinesExporter;
/// use json_log_target::Exporter;
/// use serde_json::json;
///
/// let mut exporter = JsonLinesExporter::new(Vec::new());
/// exporter.export(&[json!({"level": "info"}), json!({"level": "error"})]).unwrap();
///
/// let text = String::from_utf8(exporter.into_inner()).unwrap();
/// assert_eq!(text, "{\"level\":\"info\"}\n{\"level\":\"error\"}\n");
/// ```
pub struct JsonLinesExporter<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonLinesExporter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLinesExporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl JsonLinesExporter<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write + Send> Exporter for JsonLinesExporter<W> {
    fn export(&mut self, records: &[Value]) -> Result<()> {
        let mut buf = String::new();
        for record in records {
            buf.push_str(&encode_line(record)?);
            buf.push('\n');
        }

        self.writer.write_all(buf.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "json_lines"
    }
}
