//! Config operations: template generation, key lookup, listing, and result types.
//!
//! Provides the logic behind `config list`, `config gen`, `config get`, and the
//! `ConfigResult` enum that callers use to display results. Values are read
//! through the struct's `Serialize` impl, so `SafeString` fields show up masked.

use std::fmt;
use std::path::PathBuf;

use confique::Config;
use confique::meta::{FieldKind, Meta};
use serde::Serialize;
use serde_yaml::Value;

use crate::bindings::get_path;
use crate::error::DeployfigError;

/// Result of a config operation. Returned to the caller for display.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigResult {
    /// A generated YAML template string.
    Template(String),
    /// Confirmation that a template was written to a file.
    TemplateWritten { path: PathBuf },
    /// A key's populated value and its doc comment.
    KeyValue {
        key: String,
        value: String,
        doc: Vec<String>,
    },
    /// All populated configuration key-value pairs.
    Listing { entries: Vec<(String, String)> },
}

impl fmt::Display for ConfigResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigResult::Template(t) => write!(f, "{t}"),
            ConfigResult::TemplateWritten { path } => {
                write!(f, "Config template written to {}", path.display())
            }
            ConfigResult::KeyValue { key, value, doc } => {
                for line in doc {
                    writeln!(f, "# {line}")?;
                }
                write!(f, "{key} = {value}")
            }
            ConfigResult::Listing { entries } => {
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{key} = {value}")?;
                }
                Ok(())
            }
        }
    }
}

/// Generate a commented YAML template from the config struct's doc comments.
pub fn generate_template<C: Config>() -> String {
    confique::yaml::template::<C>(confique::yaml::FormatOptions::default())
}

/// Get a config value by dotted key, including its doc comment.
pub fn get_value<C: Config + Serialize>(
    config: &C,
    key: &str,
) -> Result<ConfigResult, DeployfigError> {
    let root = to_tree(config, key)?;
    let value = get_path(&root, key).ok_or_else(|| DeployfigError::KeyNotFound(key.into()))?;

    Ok(ConfigResult::KeyValue {
        key: key.into(),
        value: format_value(value),
        doc: lookup_doc(&C::META, key),
    })
}

/// List all populated config values as flattened dotted key-value pairs.
pub fn list_values<C: Config + Serialize>(config: &C) -> Result<ConfigResult, DeployfigError> {
    let root = to_tree(config, "<list>")?;
    let mut entries = Vec::new();
    flatten_into(&root, "", &mut entries);
    Ok(ConfigResult::Listing { entries })
}

fn to_tree<C: Serialize>(config: &C, key: &str) -> Result<Value, DeployfigError> {
    let root = serde_yaml::to_value(config).map_err(|e| DeployfigError::InvalidValue {
        key: key.into(),
        reason: e.to_string(),
    })?;
    if !root.is_mapping() {
        return Err(DeployfigError::InvalidValue {
            key: key.into(),
            reason: "config did not serialize to a mapping".into(),
        });
    }
    Ok(root)
}

fn flatten_into(value: &Value, prefix: &str, out: &mut Vec<(String, String)>) {
    let Value::Mapping(map) = value else {
        out.push((prefix.to_string(), format_value(value)));
        return;
    };
    for (k, v) in map {
        let segment = match k {
            Value::String(s) => s.clone(),
            other => format_value(other),
        };
        let key = if prefix.is_empty() {
            segment
        } else {
            format!("{prefix}.{segment}")
        };
        flatten_into(v, &key, out);
    }
}

/// Format a YAML value for display.
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "<not set>".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Sequence(items) => {
            let items: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Mapping(_) | Value::Tagged(_) => serde_yaml::to_string(value)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_else(|_| format!("{value:?}")),
    }
}

/// Walk confique's `Meta` tree to find the doc comment for a dotted key path.
fn lookup_doc(meta: &Meta, dotted_key: &str) -> Vec<String> {
    let segments: Vec<&str> = dotted_key.split('.').collect();
    lookup_doc_recursive(meta, &segments)
}

fn lookup_doc_recursive(meta: &Meta, segments: &[&str]) -> Vec<String> {
    let Some((first, rest)) = segments.split_first() else {
        return vec![];
    };

    for field in meta.fields {
        if field.name != *first {
            continue;
        }
        if rest.is_empty() {
            return field.doc.iter().map(|s| s.trim().to_string()).collect();
        }
        if let FieldKind::Nested { meta: nested, .. } = &field.kind {
            return lookup_doc_recursive(nested, rest);
        }
    }
    vec![]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::ServiceConfig;
    use crate::mask::SafeString;

    fn test_config() -> ServiceConfig {
        let mut config = ServiceConfig::builder().load().unwrap();
        config.http.url = Some("https://example.com".into());
        config.http.hosts = Some(vec!["a".into(), "b".into()]);
        config
    }

    fn entries(result: ConfigResult) -> Vec<(String, String)> {
        match result {
            ConfigResult::Listing { entries } => entries,
            other => panic!("Expected Listing, got {other:?}"),
        }
    }

    #[test]
    fn generate_template_contains_keys_and_docs() {
        let template = generate_template::<ServiceConfig>();
        assert!(template.contains("name"));
        assert!(template.contains("http"));
        assert!(template.contains("port"));
        assert!(template.contains("Upstream port"));
    }

    #[test]
    fn get_nested_key() {
        let result = get_value(&test_config(), "http.port").unwrap();
        match result {
            ConfigResult::KeyValue { value, doc, .. } => {
                assert_eq!(value, "8080");
                assert_eq!(doc, vec!["Upstream port."]);
            }
            other => panic!("Expected KeyValue, got {other:?}"),
        }
    }

    #[test]
    fn get_nonexistent_key() {
        let result = get_value(&test_config(), "http.nope");
        assert!(matches!(result, Err(DeployfigError::KeyNotFound(_))));
    }

    #[test]
    fn get_secret_is_masked() {
        let mut config = test_config();
        config.db_password = Some(SafeString::from("hunter2-long-secret"));
        match get_value(&config, "db_password").unwrap() {
            ConfigResult::KeyValue { value, .. } => {
                assert!(!value.contains("hunter2"));
                assert!(value.starts_with('*'));
            }
            other => panic!("Expected KeyValue, got {other:?}"),
        }
    }

    #[test]
    fn list_values_flattens_sections() {
        let entries = entries(list_values(&test_config()).unwrap());
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec!["name", "http.url", "http.port", "http.hosts", "db_password"]
        );
    }

    #[test]
    fn list_values_formats_values() {
        let entries = entries(list_values(&test_config()).unwrap());
        let get = |key: &str| {
            entries
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
                .unwrap()
        };
        assert_eq!(get("name"), "svc");
        assert_eq!(get("http.hosts"), "[a, b]");
        assert_eq!(get("db_password"), "<not set>");
    }

    #[test]
    fn key_value_display_includes_doc() {
        let result = ConfigResult::KeyValue {
            key: "http.port".into(),
            value: "8080".into(),
            doc: vec!["Upstream port.".into()],
        };
        assert_eq!(result.to_string(), "# Upstream port.\nhttp.port = 8080");
    }

    #[test]
    fn listing_display_format() {
        let result = ConfigResult::Listing {
            entries: vec![
                ("name".into(), "billing".into()),
                ("http.port".into(), "8080".into()),
            ],
        };
        assert_eq!(result.to_string(), "name = billing\nhttp.port = 8080");
    }
}
