//! Strict-keys check: detect defaults-file keys a destination never reads.
//!
//! Uses `serde_ignored` to deserialize into `C::Layer` (all-optional fields)
//! and capture any keys that the layer doesn't consume. Each unknown key is
//! reported with the file path and a best-effort line number. Off by default:
//! one defaults file usually feeds several destination structs, each reading
//! only its own part.

use std::path::Path;

use confique::Config;
use serde::Deserialize;

use crate::error::DeployfigError;

/// Check that the YAML in `content` holds no keys unknown to config type `C`.
pub fn validate_unknown_keys<C: Config>(
    content: &[u8],
    path: &Path,
) -> Result<(), DeployfigError>
where
    C::Layer: for<'de> Deserialize<'de>,
{
    if content.iter().all(u8::is_ascii_whitespace) {
        return Ok(());
    }

    let mut unknown_keys: Vec<String> = Vec::new();

    let deserializer = serde_yaml::Deserializer::from_slice(content);
    let _layer: C::Layer = serde_ignored::deserialize(deserializer, |ignored_path| {
        unknown_keys.push(ignored_path.to_string());
    })
    .map_err(|e| DeployfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    if unknown_keys.is_empty() {
        return Ok(());
    }

    let text = String::from_utf8_lossy(content);
    let errors = unknown_keys
        .into_iter()
        .map(|key| {
            let line = find_key_line(&text, &key);
            DeployfigError::UnknownKey {
                key,
                path: path.to_path_buf(),
                line,
            }
        })
        .collect();

    Err(DeployfigError::UnknownKeys(errors))
}

/// Find the 1-indexed line number for a dotted key in block-style YAML.
///
/// Tracks the chain of parent keys by indentation, so `database.typo` only
/// matches a `typo:` line nested under `database:`. Flow mappings, multi-line
/// scalars and keys inside sequences are not followed. Returns 0 if the key
/// cannot be located.
fn find_key_line(content: &str, dotted_key: &str) -> usize {
    let target: Vec<&str> = dotted_key.split('.').collect();
    let mut parents: Vec<(usize, &str)> = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("---") {
            continue;
        }
        let Some(key) = mapping_key(trimmed) else {
            continue;
        };
        let indent = line.len() - trimmed.len();
        while parents.last().is_some_and(|(depth, _)| *depth >= indent) {
            parents.pop();
        }

        let found = parents.len() + 1 == target.len()
            && parents
                .iter()
                .map(|(_, k)| *k)
                .chain(std::iter::once(key))
                .eq(target.iter().copied());
        if found {
            return i + 1;
        }
        parents.push((indent, key));
    }
    0
}

/// The key of a `key: value` or `key:` line, without surrounding quotes.
fn mapping_key(trimmed: &str) -> Option<&str> {
    let (key, rest) = trimmed.split_once(':')?;
    if !(rest.is_empty() || rest.starts_with([' ', '\t'])) {
        return None;
    }
    let key = key.trim_end().trim_matches(['"', '\'']);
    (!key.is_empty()).then_some(key)
}
