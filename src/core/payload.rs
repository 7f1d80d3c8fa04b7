//! Raw log payloads
//!
//! Upstream code logs whatever it has at hand: a JSON tree, an error, a
//! line of text, or some other value. [`Payload`] fixes that choice once,
//! when the record is built, so normalization is a plain `match`.

use serde_json::Value;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;

/// The payload carried by a raw log record
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A JSON object or array, logged as-is
    Structured(Value),
    /// An error; contributes its message and its trace
    Error(ErrorPayload),
    /// Free text, possibly a JSON-encoded blob
    Text(String),
    /// Any other value, already rendered for display
    Other(String),
}

impl Payload {
    /// Wrap a JSON value, routing strings and scalars to their own variants
    pub fn structured(value: Value) -> Self {
        match value {
            Value::Object(_) | Value::Array(_) => Payload::Structured(value),
            Value::String(s) => Payload::Text(s),
            scalar => Payload::Other(scalar.to_string()),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Payload::Text(text.into())
    }

    /// Capture an error's message and `source()` chain
    pub fn error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        Payload::Error(ErrorPayload::from_error(err))
    }

    /// Render an arbitrary value through its `Debug` implementation
    pub fn debug<T: fmt::Debug + ?Sized>(value: &T) -> Self {
        Payload::Other(format!("{:?}", value))
    }

    pub fn as_error(&self) -> Option<&ErrorPayload> {
        match self {
            Payload::Error(err) => Some(err),
            _ => None,
        }
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::structured(value)
    }
}

impl From<ErrorPayload> for Payload {
    fn from(err: ErrorPayload) -> Self {
        Payload::Error(err)
    }
}

impl From<i64> for Payload {
    fn from(i: i64) -> Self {
        Payload::Other(i.to_string())
    }
}

impl From<i32> for Payload {
    fn from(i: i32) -> Self {
        Payload::Other(i.to_string())
    }
}

impl From<u64> for Payload {
    fn from(u: u64) -> Self {
        Payload::Other(u.to_string())
    }
}

impl From<f64> for Payload {
    fn from(f: f64) -> Self {
        Payload::Other(f.to_string())
    }
}

impl From<bool> for Payload {
    fn from(b: bool) -> Self {
        Payload::Other(b.to_string())
    }
}

/// Message and trace text captured from an error
///
/// Both strings are taken eagerly, so formatting a record never has to call
/// back into the original error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorPayload {
    message: String,
    trace: String,
}

impl ErrorPayload {
    pub fn new(message: impl Into<String>, trace: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            trace: trace.into(),
        }
    }

    /// Build from an error, one `#N caused by: ...` trace line per source
    pub fn from_error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        let mut lines = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            lines.push(format!("#{} caused by: {}", lines.len(), cause));
            source = cause.source();
        }

        Self {
            message: err.to_string(),
            trace: lines.join("\n"),
        }
    }

    /// Replace the trace with a backtrace, if one was actually captured
    #[must_use]
    pub fn with_backtrace(mut self, backtrace: &Backtrace) -> Self {
        if backtrace.status() == BacktraceStatus::Captured {
            self.trace = backtrace.to_string().trim_end().to_string();
        }
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn trace(&self) -> &str {
        &self.trace
    }

    /// Trace text split into lines; empty when there is no trace
    pub fn trace_lines(&self) -> impl Iterator<Item = &str> {
        let trace = if self.trace.is_empty() {
            None
        } else {
            Some(self.trace.split('\n'))
        };
        trace.into_iter().flatten()
    }
}

impl fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct Inner;

    impl fmt::Display for Inner {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "connection reset")
        }
    }

    impl std::error::Error for Inner {}

    #[derive(Debug)]
    struct Outer(Inner);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "query failed")
        }
    }

    impl std::error::Error for Outer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_structured_routes_scalars() {
        assert!(matches!(Payload::from(json!({"a": 1})), Payload::Structured(_)));
        assert!(matches!(Payload::from(json!([1, 2])), Payload::Structured(_)));
        assert_eq!(Payload::from(json!("hi")), Payload::Text("hi".to_string()));
        assert_eq!(Payload::from(json!(null)), Payload::Other("null".to_string()));
        assert_eq!(Payload::from(42), Payload::Other("42".to_string()));
        assert_eq!(Payload::from(true), Payload::Other("true".to_string()));
    }

    #[test]
    fn test_error_source_chain() {
        let payload = ErrorPayload::from_error(&Outer(Inner));
        assert_eq!(payload.message(), "query failed");
        assert_eq!(payload.trace(), "#0 caused by: connection reset");
    }

    #[test]
    fn test_trace_lines() {
        let payload = ErrorPayload::new("boom", "#0 a.rs(1)\n#1 b.rs(2)");
        let lines: Vec<&str> = payload.trace_lines().collect();
        assert_eq!(lines, vec!["#0 a.rs(1)", "#1 b.rs(2)"]);

        let empty = ErrorPayload::new("boom", "");
        assert_eq!(empty.trace_lines().count(), 0);
    }

    #[test]
    fn test_disabled_backtrace_keeps_trace() {
        let payload = ErrorPayload::new("boom", "#0 original")
            .with_backtrace(&Backtrace::disabled());
        assert_eq!(payload.trace(), "#0 original");
    }

    #[test]
    fn test_debug_payload() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Point {
            x: i32,
        }
        assert_eq!(Payload::debug(&Point { x: 3 }), Payload::Other("Point { x: 3 }".to_string()));
    }
}
