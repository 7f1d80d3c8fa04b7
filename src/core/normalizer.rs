//! Message normalization

use super::payload::Payload;
use serde_json::Value;

/// Turn a raw payload into the value stored under `message`
///
/// Structured payloads pass through, errors contribute their message text,
/// other values their rendered form. Text is decoded as JSON when `decode`
/// is set; text that does not parse is returned unchanged.
pub fn normalize(payload: &Payload, decode: bool) -> Value {
    let text = match payload {
        Payload::Structured(value) => return value.clone(),
        Payload::Other(rendered) => return Value::String(rendered.clone()),
        Payload::Error(err) => err.message(),
        Payload::Text(text) => text.as_str(),
    };

    if !decode {
        return Value::String(text.to_string());
    }

    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::payload::ErrorPayload;
    use serde_json::json;

    #[test]
    fn test_structured_unchanged() {
        let value = json!({"user": {"id": 7}, "tags": ["a", "b"]});
        assert_eq!(normalize(&Payload::Structured(value.clone()), true), value);
        assert_eq!(normalize(&Payload::Structured(value.clone()), false), value);
    }

    #[test]
    fn test_decode_success() {
        let payload = Payload::text(r#"{"a":1}"#);
        assert_eq!(normalize(&payload, true), json!({"a": 1}));
    }

    #[test]
    fn test_decode_scalar_text() {
        assert_eq!(normalize(&Payload::text("42"), true), json!(42));
        assert_eq!(normalize(&Payload::text("null"), true), Value::Null);
    }

    #[test]
    fn test_decode_fallback() {
        let payload = Payload::text("hello world");
        assert_eq!(normalize(&payload, true), json!("hello world"));
    }

    #[test]
    fn test_empty_string_falls_back() {
        assert_eq!(normalize(&Payload::text(""), true), json!(""));
    }

    #[test]
    fn test_no_decode_keeps_text() {
        let payload = Payload::text(r#"{"a":1}"#);
        assert_eq!(normalize(&payload, false), json!(r#"{"a":1}"#));
    }

    #[test]
    fn test_error_message_is_decoded() {
        let payload = Payload::Error(ErrorPayload::new(r#"{"code":500}"#, "#0 main"));
        assert_eq!(normalize(&payload, true), json!({"code": 500}));

        let payload = Payload::Error(ErrorPayload::new("disk full", ""));
        assert_eq!(normalize(&payload, true), json!("disk full"));
    }

    #[test]
    fn test_other_is_rendered() {
        assert_eq!(normalize(&Payload::from(12), true), json!("12"));
        assert_eq!(normalize(&Payload::debug(&Some(3)), false), json!("Some(3)"));
    }
}
