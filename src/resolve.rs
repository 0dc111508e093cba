//! Core population pipeline: defaults YAML + environment overrides -> typed config.
//!
//! Operates on pre-loaded data (`ResolveInput`) with no file I/O, making the
//! full pipeline testable with synthetic inputs. Each source becomes its own
//! confique layer:
//!
//! 1. Parse the defaults bytes into a YAML tree (empty document = empty mapping)
//! 2. Reject keys the destination does not know (strict mode only)
//! 3. Decode the defaults bytes into the file layer, so a broken defaults file
//!    fails before the environment is consulted. Decoding from text lets a
//!    plain scalar like `123` or `007` fill a string field
//! 4. Collect every non-empty `<prefix><SUFFIX>` variable bound by a
//!    `#[config(env = "SUFFIX")]` field into a tree of its own, typed by what
//!    the file holds at that position, and decode it into the env layer
//! 5. Give every required field that has no compiled default and no value
//!    from either source the zero value of its type, and report its path
//! 6. Let confique merge env over file over compiled defaults over zeros

use std::path::Path;

use confique::meta::{FieldKind, LeafKind, Meta};
use confique::{Config, Layer};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::bindings::{env_bindings, get_path, set_path};
use crate::env::{self, Environment};
use crate::error::DeployfigError;
use crate::strict;

/// All pre-loaded data needed to populate a config.
pub struct ResolveInput<'a> {
    /// Path of the defaults file, for error messages.
    pub path: &'a Path,
    /// Raw defaults file contents.
    pub content: &'a [u8],
    /// Prefix put in front of every bound variable name.
    pub prefix: &'a str,
    /// Where bound variables are read from.
    pub env: &'a dyn Environment,
    /// Whether to reject unknown keys in the defaults file.
    pub strict: bool,
}

/// A populated config and the required fields no source provided.
#[derive(Debug)]
pub struct Populated<C> {
    pub config: C,
    /// Dotted paths of fields left at their zero value, in declaration order.
    pub missing: Vec<String>,
}

/// Populate config type `C` from pre-loaded inputs.
pub fn resolve<C: Config>(input: ResolveInput<'_>) -> Result<Populated<C>, DeployfigError>
where
    C::Layer: for<'de> Deserialize<'de>,
{
    let parse_error = |source| DeployfigError::ParseError {
        path: input.path.to_path_buf(),
        source,
    };

    // 1: Parse
    let tree = parse_tree(input.content).map_err(parse_error)?;

    // 2: Strict keys
    if input.strict {
        strict::validate_unknown_keys::<C>(input.content, input.path)?;
    }

    // 3: File layer
    let file_layer = if is_empty_mapping(&tree) {
        <C::Layer as Layer>::empty()
    } else {
        serde_yaml::from_slice::<C::Layer>(input.content).map_err(parse_error)?
    };

    // 4: Env layer
    let env_error = |source| DeployfigError::EnvOverride {
        prefix: input.prefix.to_string(),
        source,
    };
    let overrides = env_tree(&tree, &C::META, input.prefix, input.env);
    let env_layer = if is_empty_mapping(&overrides) {
        <C::Layer as Layer>::empty()
    } else {
        debug!(
            applied = count_leaves(&overrides),
            prefix = input.prefix,
            "applied environment overrides"
        );
        let text = serde_yaml::to_string(&overrides).map_err(env_error)?;
        serde_yaml::from_str::<C::Layer>(&text).map_err(env_error)?
    };

    // 5: Zero values for required fields nobody set
    let (zeros, missing) = zero_fill::<C>(&tree, &overrides);
    if !missing.is_empty() {
        debug!(?missing, "required fields left at zero value");
    }

    // 6: confique merges layers, earlier ones win
    let config = C::builder()
        .preloaded(env_layer)
        .preloaded(file_layer)
        .preloaded(zeros)
        .load()?;

    Ok(Populated { config, missing })
}

fn parse_tree(content: &[u8]) -> Result<Value, serde_yaml::Error> {
    if content.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Mapping(Mapping::new()));
    }
    match serde_yaml::from_slice(content)? {
        Value::Null => Ok(Value::Mapping(Mapping::new())),
        tree => Ok(tree),
    }
}

fn is_empty_mapping(value: &Value) -> bool {
    value.as_mapping().is_some_and(Mapping::is_empty)
}

/// The value the file holds at `key`, treating an explicit null as absent.
fn present<'a>(tree: &'a Value, key: &str) -> Option<&'a Value> {
    get_path(tree, key).filter(|v| !v.is_null())
}

/// Tree of bound, non-empty env values, each typed by the file's value at
/// the same position.
fn env_tree(
    file: &Value,
    meta: &Meta,
    prefix: &str,
    environment: &dyn Environment,
) -> Value {
    let mut tree = Value::Mapping(Mapping::new());
    for binding in env_bindings(meta) {
        let var = format!("{prefix}{}", binding.var);
        let Some(raw) = environment.non_empty(&var) else {
            continue;
        };
        let value = env::typed_value(present(file, &binding.key), &raw);
        debug!(var = %var, key = %binding.key, "environment override");
        set_path(&mut tree, &binding.key, value);
    }
    tree
}

fn count_leaves(value: &Value) -> usize {
    match value {
        Value::Mapping(map) => map.values().map(count_leaves).sum(),
        _ => 1,
    }
}

/// Zero values tried in order for a required field without a value. The first
/// one the field's type accepts is used.
fn zero_candidates() -> [Value; 5] {
    [
        Value::String(String::new()),
        Value::Number(0.into()),
        Value::Bool(false),
        Value::Sequence(Vec::new()),
        Value::Mapping(Mapping::new()),
    ]
}

/// Build a layer holding a zero value for every required leaf of `C` that has
/// no compiled default and is set by neither `file` nor `overrides`.
///
/// A field whose type accepts none of the candidates is left out; confique
/// then reports it as missing.
fn zero_fill<C: Config>(file: &Value, overrides: &Value) -> (C::Layer, Vec<String>)
where
    C::Layer: for<'de> Deserialize<'de>,
{
    let mut unset = Vec::new();
    required_leaves(&C::META, "", &mut unset);
    unset.retain(|key| present(file, key).is_none() && get_path(overrides, key).is_none());

    let mut zeros = Value::Mapping(Mapping::new());
    let mut missing = Vec::new();
    for key in unset {
        let accepted = zero_candidates().into_iter().find(|candidate| {
            let mut trial = Value::Mapping(Mapping::new());
            set_path(&mut trial, &key, candidate.clone());
            serde_yaml::from_value::<C::Layer>(trial).is_ok()
        });
        if let Some(zero) = accepted {
            set_path(&mut zeros, &key, zero);
            missing.push(key);
        }
    }

    let layer = serde_yaml::from_value(zeros).unwrap_or_else(|_| <C::Layer as Layer>::empty());
    (layer, missing)
}

fn required_leaves(meta: &Meta, prefix: &str, out: &mut Vec<String>) {
    for field in meta.fields {
        let dotted = if prefix.is_empty() {
            field.name.to_string()
        } else {
            format!("{prefix}.{}", field.name)
        };
        match &field.kind {
            FieldKind::Leaf {
                kind: LeafKind::Required { default: None },
                ..
            } => out.push(dotted),
            FieldKind::Leaf { .. } => {}
            FieldKind::Nested { meta, .. } => required_leaves(meta, &dotted, out),
        }
    }
}
