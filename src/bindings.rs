//! Environment bindings declared on a destination struct, and dotted-path
//! access into a YAML tree.
//!
//! A binding comes from a `#[config(env = "SUFFIX")]` attribute. Nested
//! sections contribute their fields under the section name, so
//!
//! ```ignore
//! struct Root { #[config(nested)] http: Http }
//! struct Http { #[config(env = "HTTP_URL")] url: String }
//! ```
//!
//! yields the binding `http.url <- HTTP_URL`.

use confique::meta::{FieldKind, Meta};
use serde_yaml::{Mapping, Value};

/// One env-overridable leaf field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvBinding {
    /// Dotted path of the field, e.g. `http.url`.
    pub key: String,
    /// Variable name without the snapshot prefix, e.g. `HTTP_URL`.
    pub var: &'static str,
}

/// Collect every env binding from a confique `Meta` tree, in field order.
pub fn env_bindings(meta: &Meta) -> Vec<EnvBinding> {
    let mut out = Vec::new();
    collect(meta, "", &mut out);
    out
}

fn collect(meta: &Meta, prefix: &str, out: &mut Vec<EnvBinding>) {
    for field in meta.fields {
        let dotted = if prefix.is_empty() {
            field.name.to_string()
        } else {
            format!("{prefix}.{}", field.name)
        };
        match &field.kind {
            FieldKind::Leaf { env: Some(var), .. } => out.push(EnvBinding {
                key: dotted,
                var: *var,
            }),
            FieldKind::Leaf { env: None, .. } => {}
            FieldKind::Nested { meta, .. } => collect(meta, &dotted, out),
        }
    }
}

/// Navigate a YAML tree by dotted key path.
pub fn get_path<'a>(root: &'a Value, dotted_key: &str) -> Option<&'a Value> {
    dotted_key
        .split('.')
        .try_fold(root, |node, segment| node.as_mapping()?.get(segment))
}

/// Set the value at a dotted key path, creating mappings along the way.
///
/// Any non-mapping node on the path (including a null root) is replaced by an
/// empty mapping.
pub fn set_path(root: &mut Value, dotted_key: &str, value: Value) {
    let mut current = root;
    let mut segments = dotted_key.split('.').peekable();

    while let Some(segment) = segments.next() {
        if !current.is_mapping() {
            *current = Value::Mapping(Mapping::new());
        }
        let Value::Mapping(map) = current else {
            unreachable!("node was just made a mapping");
        };
        let key = Value::String(segment.to_string());

        if segments.peek().is_none() {
            map.insert(key, value);
            return;
        }
        current = map.entry(key).or_insert(Value::Null);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{DeepConfig, ServiceConfig};
    use confique::Config;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn collects_env_tagged_leaves_only() {
        let bindings = env_bindings(&ServiceConfig::META);
        let pairs: Vec<(&str, &str)> = bindings
            .iter()
            .map(|b| (b.key.as_str(), b.var))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("http.url", "HTTP_URL"),
                ("http.port", "HTTP_PORT"),
                ("http.hosts", "HTTP_HOSTS"),
                ("db_password", "DB_PASSWORD"),
            ]
        );
    }

    #[test]
    fn deep_nesting_builds_full_path() {
        let bindings = env_bindings(&DeepConfig::META);
        assert_eq!(
            bindings,
            vec![EnvBinding {
                key: "test.http.url".into(),
                var: "HTTP_URL",
            }]
        );
    }

    #[test]
    fn get_path_walks_mappings() {
        let root = yaml("a:\n  b:\n    c: 1\n");
        assert_eq!(get_path(&root, "a.b.c"), Some(&Value::Number(1.into())));
        assert!(get_path(&root, "a.b").unwrap().is_mapping());
        assert_eq!(get_path(&root, "a.x"), None);
        assert_eq!(get_path(&root, "a.b.c.d"), None);
    }

    #[test]
    fn set_path_replaces_leaf() {
        let mut root = yaml("a:\n  b: X\n  keep: 1\n");
        set_path(&mut root, "a.b", Value::String("Y".into()));
        assert_eq!(root, yaml("a:\n  b: Y\n  keep: 1\n"));
    }

    #[test]
    fn set_path_creates_missing_sections() {
        let mut root = Value::Null;
        set_path(&mut root, "a.b.c", Value::Bool(true));
        assert_eq!(root, yaml("a:\n  b:\n    c: true\n"));
    }

    #[test]
    fn set_path_replaces_scalar_on_the_way() {
        let mut root = yaml("a: flat\n");
        set_path(&mut root, "a.b", Value::Number(2.into()));
        assert_eq!(root, yaml("a:\n  b: 2\n"));
    }
}
