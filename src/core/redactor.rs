//! Field masking over assembled records
//!
//! A [`MaskPath`] names a location inside a record with dot-separated
//! segments; each segment is an object key or, on arrays, an index
//! (`message.user.email`, `message.0.token`, `context.server.PASSWORD`).
//! Paths are validated when they are configured, never when applied.
//!
//! Paths apply in configured order. Masking a parent replaces its whole
//! subtree with the token, so a child path configured after it finds a
//! string and leaves it alone.

use super::error::{Result, TargetError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Replacement written over masked values
pub const MASK_TOKEN: &str = "***";

/// A validated dotted/indexed field path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MaskPath {
    raw: String,
    segments: Vec<String>,
}

impl MaskPath {
    pub fn parse(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(TargetError::mask_path(path, "path is empty"));
        }

        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if let Some(position) = segments.iter().position(String::is_empty) {
            return Err(TargetError::mask_path(
                path,
                format!("empty segment at position {}", position),
            ));
        }

        Ok(Self {
            raw: path.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl FromStr for MaskPath {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MaskPath {
    type Error = TargetError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<MaskPath> for String {
    fn from(path: MaskPath) -> Self {
        path.raw
    }
}

impl fmt::Display for MaskPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Overwrite the value at `path` with [`MASK_TOKEN`]
///
/// Returns `false`, leaving `value` untouched, when nothing non-null lives
/// at that path.
pub fn mask_path(value: &mut Value, path: &MaskPath) -> bool {
    let mut current = value;
    for segment in path.segments() {
        let next = match current {
            Value::Object(obj) => obj.get_mut(segment),
            Value::Array(arr) => match segment.parse::<usize>() {
                Ok(index) => arr.get_mut(index),
                Err(_) => None,
            },
            _ => None,
        };
        let Some(next) = next else {
            return false;
        };
        current = next;
    }

    if current.is_null() {
        return false;
    }
    *current = Value::String(MASK_TOKEN.to_string());
    true
}

/// Applies a configured list of mask paths
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    paths: Vec<MaskPath>,
}

impl Redactor {
    pub fn new(paths: Vec<MaskPath>) -> Self {
        Self { paths }
    }

    /// Parse and validate every path up front
    pub fn from_paths<I, S>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let paths = paths
            .into_iter()
            .map(|p| MaskPath::parse(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(paths))
    }

    pub fn paths(&self) -> &[MaskPath] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Mask every configured path in place; returns how many were masked
    pub fn mask(&self, record: &mut Value) -> usize {
        self.paths
            .iter()
            .filter(|path| mask_path(record, path))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn redactor(paths: &[&str]) -> Redactor {
        Redactor::from_paths(paths).expect("valid paths")
    }

    #[test]
    fn test_parse_rejects_malformed_paths() {
        assert!(MaskPath::parse("").is_err());
        assert!(MaskPath::parse(".user").is_err());
        assert!(MaskPath::parse("user.").is_err());
        assert!(matches!(
            "user..email".parse::<MaskPath>(),
            Err(TargetError::InvalidMaskPath { .. })
        ));
        assert_eq!(
            MaskPath::parse("message.0.token").unwrap().segments(),
            ["message", "0", "token"]
        );
    }

    #[test]
    fn test_mask_nested_key() {
        let mut record = json!({"message": {"user": {"email": "a@b.c", "name": "Ann"}}});
        let masked = redactor(&["message.user.email"]).mask(&mut record);

        assert_eq!(masked, 1);
        assert_eq!(
            record,
            json!({"message": {"user": {"email": "***", "name": "Ann"}}})
        );
    }

    #[test]
    fn test_mask_array_index() {
        let mut record = json!({"message": [{"token": "t0"}, {"token": "t1"}]});
        redactor(&["message.1.token"]).mask(&mut record);
        assert_eq!(record, json!({"message": [{"token": "t0"}, {"token": "***"}]}));
    }

    #[test]
    fn test_mask_absent_path_is_noop() {
        let mut record = json!({"message": "hello", "level": "info"});
        let before = record.clone();

        let masked = redactor(&["user.token", "message.deeper", "traces.3"]).mask(&mut record);
        assert_eq!(masked, 0);
        assert_eq!(record, before);
    }

    #[test]
    fn test_null_value_is_not_masked() {
        let mut record = json!({"context": null});
        redactor(&["context"]).mask(&mut record);
        assert_eq!(record, json!({"context": null}));
    }

    #[test]
    fn test_parent_before_child() {
        let mut record = json!({"message": {"user": {"email": "a@b.c"}}});
        let masked = redactor(&["message.user", "message.user.email"]).mask(&mut record);

        assert_eq!(masked, 1);
        assert_eq!(record, json!({"message": {"user": "***"}}));
    }

    #[test]
    fn test_child_before_parent_same_result() {
        let mut record = json!({"message": {"user": {"email": "a@b.c"}}});
        redactor(&["message.user.email", "message.user"]).mask(&mut record);
        assert_eq!(record, json!({"message": {"user": "***"}}));
    }

    #[test]
    fn test_mask_is_idempotent() {
        let r = redactor(&["ip", "message.password"]);
        let mut once = json!({"ip": "10.0.0.1", "message": {"password": "secret"}});
        r.mask(&mut once);
        let mut twice = once.clone();
        r.mask(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_serde_validates() {
        let paths: Vec<MaskPath> = serde_json::from_str(r#"["a.b", "c"]"#).unwrap();
        assert_eq!(paths.len(), 2);
        assert!(serde_json::from_str::<Vec<MaskPath>>(r#"["a..b"]"#).is_err());
        assert_eq!(serde_json::to_string(&paths[0]).unwrap(), "\"a.b\"");
    }
}
