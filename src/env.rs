//! Environment variable access and typing of override values.
//!
//! All reads and writes go through the [`Environment`] trait so a test (or an
//! embedding application) can swap the real process table for a [`MapEnv`].

use std::collections::HashMap;

use parking_lot::RwLock;
use serde_yaml::Value;

/// Read/write access to a table of environment variables.
pub trait Environment: Send + Sync {
    /// Value of `key`, or `None` when unset or not valid unicode.
    fn var(&self, key: &str) -> Option<String>;

    /// Set `key` to `value`.
    fn set_var(&self, key: &str, value: &str);

    /// Value of `key` if it is set to something other than the empty string.
    fn non_empty(&self, key: &str) -> Option<String> {
        self.var(key).filter(|v| !v.is_empty())
    }
}

/// The real process environment.
///
/// Writes mutate process-wide state. Run setup before spawning threads that
/// read the environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn set_var(&self, key: &str, value: &str) {
        // SAFETY: setup is documented to run once at startup, before other
        // threads touch the environment.
        unsafe { std::env::set_var(key, value) }
    }
}

/// In-memory environment for tests and sandboxed loading.
#[derive(Debug, Default)]
pub struct MapEnv {
    vars: RwLock<HashMap<String, String>>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(key, value)` pairs. Later pairs win.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let vars = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            vars: RwLock::new(vars),
        }
    }

    pub fn remove_var(&self, key: &str) {
        self.vars.write().remove(key);
    }

    pub fn len(&self) -> usize {
        self.vars.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.read().is_empty()
    }
}

impl Environment for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.read().get(key).cloned()
    }

    fn set_var(&self, key: &str, value: &str) {
        self.vars.write().insert(key.to_string(), value.to_string());
    }
}

/// Turn a raw env var value into a YAML value, guided by what the defaults
/// file already holds at that position.
///
/// - existing string: the raw text, verbatim.
/// - existing sequence: split on `,`, each item typed like the first existing item.
/// - anything else (including absent): a YAML scalar (bool, number), else a string.
pub fn typed_value(existing: Option<&Value>, raw: &str) -> Value {
    match existing {
        Some(Value::String(_)) => Value::String(raw.to_string()),
        Some(Value::Sequence(items)) => {
            let item_hint = items.first();
            let parts = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| typed_value(item_hint, s))
                .collect();
            Value::Sequence(parts)
        }
        _ => parse_scalar(raw),
    }
}

/// Parse a YAML scalar. Only booleans, numbers and explicitly quoted strings
/// are taken from the parser; everything else stays the raw string.
fn parse_scalar(raw: &str) -> Value {
    match serde_yaml::from_str::<Value>(raw) {
        Ok(v @ (Value::Bool(_) | Value::Number(_) | Value::String(_))) => v,
        _ => Value::String(raw.to_string()),
    }
}
