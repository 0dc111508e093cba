use std::path::PathBuf;

use thiserror::Error;

use crate::types::Stage;
use crate::validate::ValidationErrors;

#[derive(Debug, Error)]
pub enum DeployfigError {
    #[error("Unable to find file '{name}' within {depth} parent directories")]
    NotFound { name: String, depth: usize },

    #[error("Unable to get current working directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    #[error("{path} line {line}: expected KEY=VALUE, got '{content}'")]
    MalformedLine {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{var} variable is undefined — set it to dev, stage or prod")]
    MissingSelector { var: String },

    #[error("{var} has unknown value '{value}' — expected dev, stage or prod")]
    UnknownSelector { var: String, value: String },

    #[error("No defaults file configured for stage '{stage}' — call .defaults() on the builder")]
    MissingStagePath { stage: Stage },

    #[error("Unable to read defaults file {path}: {source}")]
    UnreadableDefaults {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No defaults were loaded — check setup and the stage selector")]
    NotLoaded,

    #[error("No snapshot installed — call deployfig::global::install() at startup")]
    NotInstalled,

    #[error("Failed to parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Failed to apply {prefix}* environment overrides: {source}")]
    EnvOverride {
        prefix: String,
        source: serde_yaml::Error,
    },

    #[error("Unknown key '{key}' in {path} (line {line})")]
    UnknownKey {
        key: String,
        path: PathBuf,
        line: usize,
    },

    #[error("Unknown keys in defaults file")]
    UnknownKeys(Vec<DeployfigError>),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] confique::Error),

    #[error("{0}")]
    ValidationFailed(#[from] ValidationErrors),

    #[error("Validator for '{field}' failed: {reason}")]
    ValidatorFailed { field: String, reason: String },

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}
