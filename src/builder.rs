use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::env::{Environment, ProcessEnv};
use crate::envfile;
use crate::error::DeployfigError;
use crate::locate::{self, LOOKUP_DEPTH_DEFAULT};
use crate::snapshot::Snapshot;
use crate::types::{Stage, UnknownStage};

/// Entry point for setting up deployfig.
pub struct Deployfig;

impl Deployfig {
    pub fn setup() -> SetupBuilder {
        SetupBuilder::new()
    }
}

/// Builder for the setup phase: pick the stage, apply the override file, read
/// the stage's defaults.
///
/// - **Prefix**: [`env_prefix()`](Self::env_prefix) namespaces the selector
///   (`<PREFIX>ENV`) and every field override (`<PREFIX><SUFFIX>`).
/// - **Defaults**: [`defaults()`](Self::defaults) registers one YAML file per [`Stage`].
/// - **Override file**: [`override_file()`](Self::override_file) names a
///   `KEY=VALUE` file searched for in the start directory and its ancestors.
///
/// Setup is meant to run once at startup, before other threads read the
/// process environment: applying the override file writes to it.
pub struct SetupBuilder {
    env_prefix: String,
    defaults: HashMap<Stage, PathBuf>,
    override_file: Option<String>,
    lookup_depth: Option<usize>,
    start_dir: Option<PathBuf>,
    env: Arc<dyn Environment>,
    strict: bool,
    strict_selector: bool,
}

impl SetupBuilder {
    fn new() -> Self {
        Self {
            env_prefix: String::new(),
            defaults: HashMap::new(),
            override_file: None,
            lookup_depth: None,
            start_dir: None,
            env: Arc::new(ProcessEnv),
            strict: false,
            strict_selector: false,
        }
    }

    /// Prefix for every variable name (default: none). Include any separator,
    /// e.g. `"APP_"` gives `APP_ENV` and `APP_HTTP_URL`.
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = prefix.to_string();
        self
    }

    /// Register the defaults file for `stage`.
    ///
    /// Relative paths are taken from the [start directory](Self::start_dir)
    /// when one is set, otherwise from the working directory.
    pub fn defaults(mut self, stage: Stage, path: impl Into<PathBuf>) -> Self {
        self.defaults.insert(stage, path.into());
        self
    }

    /// Name of the optional `KEY=VALUE` override file (e.g. `".env"`).
    /// Without one, setup reads only the real environment.
    pub fn override_file(mut self, name: &str) -> Self {
        self.override_file = Some(name.to_string());
        self
    }

    /// How many parent directories to search for the override file
    /// (default: [`LOOKUP_DEPTH_DEFAULT`]).
    pub fn lookup_depth(mut self, depth: usize) -> Self {
        self.lookup_depth = Some(depth);
        self
    }

    /// Directory the override-file search starts from (default: the working
    /// directory).
    pub fn start_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.start_dir = Some(dir.into());
        self
    }

    /// Replace the process environment, e.g. with a [`MapEnv`](crate::MapEnv).
    pub fn env(mut self, env: Arc<dyn Environment>) -> Self {
        self.env = env;
        self
    }

    /// Reject defaults-file keys a destination struct does not read
    /// (default: `false`, since one file usually feeds several structs).
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Make an unrecognized selector value an error (default: `false`).
    ///
    /// When off, an unrecognized value produces a snapshot without defaults
    /// and every later populate fails with [`DeployfigError::NotLoaded`].
    pub fn strict_selector(mut self, strict: bool) -> Self {
        self.strict_selector = strict;
        self
    }

    fn effective_lookup_depth(&self) -> usize {
        self.lookup_depth.unwrap_or(LOOKUP_DEPTH_DEFAULT)
    }

    fn selector_var(&self) -> String {
        format!("{}ENV", self.env_prefix)
    }

    fn effective_defaults_path(&self, path: &Path) -> PathBuf {
        match &self.start_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Run setup. The first failing step stops it.
    ///
    /// 1. Apply the override file, if one is configured and found
    /// 2. Read the `<PREFIX>ENV` selector
    /// 3. Map it to a stage
    /// 4. Read that stage's defaults file
    pub fn load(self) -> Result<Snapshot, DeployfigError> {
        let depth = self.effective_lookup_depth();
        self.apply_override_file(depth)?;

        let var = self.selector_var();
        let selector = self
            .env
            .non_empty(&var)
            .ok_or_else(|| DeployfigError::MissingSelector { var: var.clone() })?;

        let stage = match selector.parse::<Stage>() {
            Ok(stage) => stage,
            Err(UnknownStage(value)) if self.strict_selector => {
                return Err(DeployfigError::UnknownSelector { var, value });
            }
            Err(UnknownStage(value)) => {
                warn!(var = %var, value = %value, "unknown stage selector, no defaults loaded");
                return Ok(Snapshot::new(
                    self.env_prefix,
                    None,
                    None,
                    self.env,
                    self.strict,
                ));
            }
        };

        let configured = self
            .defaults
            .get(&stage)
            .ok_or(DeployfigError::MissingStagePath { stage })?;
        let path = self.effective_defaults_path(configured);
        let content = std::fs::read(&path).map_err(|e| DeployfigError::UnreadableDefaults {
            path: path.clone(),
            source: e,
        })?;
        info!(%stage, path = %path.display(), bytes = content.len(), "loaded defaults");

        Ok(Snapshot::new(
            self.env_prefix,
            Some(stage),
            Some((path, content)),
            self.env,
            self.strict,
        ))
    }

    /// Locate and apply the override file. Not finding it is fine; a file
    /// that cannot be read or parsed stops setup.
    fn apply_override_file(&self, depth: usize) -> Result<(), DeployfigError> {
        let Some(name) = &self.override_file else {
            return Ok(());
        };

        let found = match &self.start_dir {
            Some(dir) => locate::find_file_from(dir, name, depth),
            None => locate::find_file(name, depth),
        };

        match found {
            Ok(path) => {
                let applied = envfile::load(&path, self.env.as_ref())?;
                info!(path = %path.display(), applied, "applied override file");
            }
            Err(e) => debug!(error = %e, "no override file, skipping"),
        }
        Ok(())
    }
}
