//! `KEY=VALUE` override files (a minimal `.env` dialect).
//!
//! ```text
//! # comment
//! ; also a comment
//! HTTP_URL = https://localhost:3000/path
//! POOL_SIZE=10
//! ```
//!
//! Lines are trimmed, then blank and comment lines are skipped. Every other
//! line must contain `=`; the first one splits key from value and both sides
//! are trimmed. The value is taken verbatim: quotes are kept and nothing is
//! interpolated.
//!
//! Applying a file never replaces a variable that already has a non-empty
//! value, so the real process environment always beats the file.

use std::path::Path;

use tracing::trace;

use crate::env::Environment;
use crate::error::DeployfigError;

/// Classification of one override-file line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    Skip,
    Assign { key: &'a str, value: &'a str },
    Malformed,
}

pub fn parse_line(raw: &str) -> Line<'_> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
        return Line::Skip;
    }
    match line.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Line::Assign {
            key: key.trim(),
            value: value.trim(),
        },
        _ => Line::Malformed,
    }
}

/// Read `path` and apply it to `env`. Returns the number of variables set.
pub fn load(path: &Path, env: &dyn Environment) -> Result<usize, DeployfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| DeployfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    apply(path, &content, env)
}

/// Apply override-file `content` to `env`, line by line.
///
/// Stops at the first malformed line. Assignments made before it stay applied.
pub fn apply(path: &Path, content: &str, env: &dyn Environment) -> Result<usize, DeployfigError> {
    let mut applied = 0;
    for (i, raw) in content.lines().enumerate() {
        match parse_line(raw) {
            Line::Skip => {}
            Line::Malformed => {
                return Err(DeployfigError::MalformedLine {
                    path: path.to_path_buf(),
                    line: i + 1,
                    content: raw.trim().to_string(),
                });
            }
            Line::Assign { key, value } => {
                if env.non_empty(key).is_some() {
                    trace!(key, "already set, keeping environment value");
                    continue;
                }
                env.set_var(key, value);
                applied += 1;
            }
        }
    }
    Ok(applied)
}
