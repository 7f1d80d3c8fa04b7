//! Process-wide variables captured into the `context` field
//!
//! This module provides:
//! - `ContextSource`: snapshot of selected variables, taken once per flush
//! - `GlobalContext`: thread-safe registry of named JSON variables
//! - `ContextGuard`: RAII guard for scoped variables

use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Produces the `context` snapshot attached to every record of a flush
///
/// Each name selects a variable; dotted names (`server.HTTP_HOST`) select a
/// nested key and keep the nesting in the result. A name starting with `!`
/// removes that path from the result. Nothing matching yields an empty map.
pub trait ContextSource: Send + Sync {
    fn snapshot(&self, names: &[String]) -> Map<String, Value>;
}

impl<F> ContextSource for F
where
    F: Fn(&[String]) -> Map<String, Value> + Send + Sync,
{
    fn snapshot(&self, names: &[String]) -> Map<String, Value> {
        self(names)
    }
}

/// Registry of process-global variables
///
/// Cloning shares the underlying registry.
///
/// # Example
///
/// ```
/// use json_log_target::{ContextSource, GlobalContext};
/// use serde_json::json;
///
/// let ctx = GlobalContext::new();
/// ctx.set("env", "production");
/// ctx.set("server", json!({"HTTP_HOST": "example.com", "SECRET": "x"}));
///
/// let snapshot = ctx.snapshot(&["env".to_string(), "server".to_string(), "!server.SECRET".to_string()]);
/// assert_eq!(json!(snapshot), json!({"env": "production", "server": {"HTTP_HOST": "example.com"}}));
/// ```
#[derive(Debug, Clone, Default)]
pub struct GlobalContext {
    vars: Arc<RwLock<Map<String, Value>>>,
}

impl GlobalContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, overwriting any previous value
    pub fn set<K, V>(&self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.vars.write().insert(key.into(), value.into());
    }

    /// Set a variable for the lifetime of the returned guard
    #[must_use = "the variable is removed as soon as the guard is dropped"]
    pub fn scoped<K, V>(&self, key: K, value: V) -> ContextGuard
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let key = key.into();
        self.set(key.clone(), value);
        ContextGuard::new(Arc::clone(&self.vars), key)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.vars.read().get(key).cloned()
    }

    pub fn remove(&self, key: &str) {
        self.vars.write().remove(key);
    }

    pub fn clear(&self) {
        self.vars.write().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.vars.read().is_empty()
    }

    pub fn len(&self) -> usize {
        self.vars.read().len()
    }
}

impl ContextSource for GlobalContext {
    fn snapshot(&self, names: &[String]) -> Map<String, Value> {
        let vars = self.vars.read();
        let mut result = Map::new();
        let mut excluded = Vec::new();

        for name in names {
            if let Some(path) = name.strip_prefix('!') {
                excluded.push(path);
                continue;
            }

            let segments: Vec<&str> = name.split('.').collect();
            let Some((root, rest)) = segments.split_first() else {
                continue;
            };
            let Some(value) = vars.get(*root).and_then(|v| lookup(v, rest)) else {
                continue;
            };
            insert_at(&mut result, &segments, value.clone());
        }

        for path in excluded {
            let segments: Vec<&str> = path.split('.').collect();
            remove_at(&mut result, &segments);
        }

        result
    }
}

fn lookup<'a>(value: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    segments.iter().try_fold(value, |current, segment| match current {
        Value::Object(obj) => obj.get(*segment),
        Value::Array(arr) => segment.parse::<usize>().ok().and_then(|i| arr.get(i)),
        _ => None,
    })
}

fn insert_at(target: &mut Map<String, Value>, segments: &[&str], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut current = target;
    for segment in parents {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        match entry {
            Value::Object(obj) => current = obj,
            // already captured whole, and it holds the nested value too
            _ => return,
        }
    }
    current.insert(last.to_string(), value);
}

fn remove_at(target: &mut Map<String, Value>, segments: &[&str]) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut current = target;
    for segment in parents {
        match current.get_mut(*segment) {
            Some(Value::Object(obj)) => current = obj,
            _ => return,
        }
    }
    current.shift_remove(*last);
}

/// RAII guard for scoped context variables
///
/// When dropped, removes the variable from the registry.
pub struct ContextGuard {
    vars: Arc<RwLock<Map<String, Value>>>,
    key: String,
}

impl ContextGuard {
    pub(crate) fn new(vars: Arc<RwLock<Map<String, Value>>>, key: String) -> Self {
        Self { vars, key }
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        self.vars.write().remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> GlobalContext {
        let ctx = GlobalContext::new();
        ctx.set("env", "test");
        ctx.set(
            "server",
            json!({"HTTP_HOST": "example.com", "PASSWORD": "hunter2", "PORT": 443}),
        );
        ctx.set("argv", json!(["bin", "--verbose"]));
        ctx
    }

    #[test]
    fn test_snapshot_whole_variables() {
        let snapshot = sample().snapshot(&names(&["env", "argv"]));
        assert_eq!(json!(snapshot), json!({"env": "test", "argv": ["bin", "--verbose"]}));
    }

    #[test]
    fn test_snapshot_nested_selection() {
        let snapshot = sample().snapshot(&names(&["server.HTTP_HOST", "argv.1"]));
        assert_eq!(
            json!(snapshot),
            json!({"server": {"HTTP_HOST": "example.com"}, "argv": {"1": "--verbose"}})
        );
    }

    #[test]
    fn test_snapshot_exclusion() {
        let snapshot = sample().snapshot(&names(&["server", "!server.PASSWORD", "env", "!env"]));
        assert_eq!(
            json!(snapshot),
            json!({"server": {"HTTP_HOST": "example.com", "PORT": 443}})
        );
    }

    #[test]
    fn test_snapshot_unknown_names() {
        let snapshot = sample().snapshot(&names(&["missing", "server.NOPE", "env.deeper"]));
        assert!(snapshot.is_empty());
        assert!(sample().snapshot(&[]).is_empty());
    }

    #[test]
    fn test_scoped_guard_removes_variable() {
        let ctx = GlobalContext::new();
        {
            let _guard = ctx.scoped("request_id", "abc-123");
            assert_eq!(ctx.get("request_id"), Some(json!("abc-123")));
        }
        assert_eq!(ctx.get("request_id"), None);
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_clone_shares_registry() {
        let ctx = GlobalContext::new();
        let other = ctx.clone();
        other.set("key", 1);
        assert_eq!(ctx.len(), 1);

        ctx.remove("key");
        assert!(other.is_empty());

        other.set("a", 1);
        other.clear();
        assert!(ctx.is_empty());
    }
}
