//! The committed result of setup: which defaults were selected, and how to
//! read environment overrides on top of them.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use confique::Config;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::env::Environment;
use crate::error::DeployfigError;
use crate::ops::{self, ConfigResult};
use crate::resolve::{self, Populated, ResolveInput};
use crate::types::{ConfigAction, Stage};
use crate::validate;

/// Immutable handle produced by [`SetupBuilder::load()`](crate::SetupBuilder::load).
///
/// Cheap to clone and safe to share across threads. Every [`load`](Self::load)
/// re-reads the environment, so a variable changed after setup is picked up by
/// the next call while the defaults bytes stay as they were at setup.
#[derive(Clone)]
pub struct Snapshot {
    inner: Arc<Inner>,
}

struct Inner {
    prefix: String,
    stage: Option<Stage>,
    defaults: Option<Defaults>,
    env: Arc<dyn Environment>,
    strict: bool,
}

struct Defaults {
    path: PathBuf,
    content: Vec<u8>,
}

impl Snapshot {
    pub(crate) fn new(
        prefix: String,
        stage: Option<Stage>,
        defaults: Option<(PathBuf, Vec<u8>)>,
        env: Arc<dyn Environment>,
        strict: bool,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                prefix,
                stage,
                defaults: defaults.map(|(path, content)| Defaults { path, content }),
                env,
                strict,
            }),
        }
    }

    /// Populate `C` from the defaults and environment, then validate it.
    ///
    /// Fails with [`DeployfigError::ValidationFailed`] carrying every
    /// violation when any constraint does not hold. A field without a compiled
    /// default that neither the defaults file nor the environment sets is a
    /// `required` violation.
    pub fn load<C>(&self) -> Result<C, DeployfigError>
    where
        C: Config + Validate,
        C::Layer: for<'de> Deserialize<'de>,
    {
        let Populated { config, missing } = self.populate::<C>()?;
        validate::check(&config, &missing)?;
        Ok(config)
    }

    /// Populate `C` without running its validation constraints.
    ///
    /// Fields no source sets hold the zero value of their type.
    pub fn decode<C: Config>(&self) -> Result<C, DeployfigError>
    where
        C::Layer: for<'de> Deserialize<'de>,
    {
        self.populate::<C>().map(|p| p.config)
    }

    fn populate<C: Config>(&self) -> Result<Populated<C>, DeployfigError>
    where
        C::Layer: for<'de> Deserialize<'de>,
    {
        let defaults = self
            .inner
            .defaults
            .as_ref()
            .ok_or(DeployfigError::NotLoaded)?;

        resolve::resolve(ResolveInput {
            path: &defaults.path,
            content: &defaults.content,
            prefix: &self.inner.prefix,
            env: self.inner.env.as_ref(),
            strict: self.inner.strict,
        })
    }

    /// Full variable name for `suffix`, e.g. `APP_` + `HTTP_URL`.
    pub fn var_name(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.inner.prefix)
    }

    pub fn prefix(&self) -> &str {
        &self.inner.prefix
    }

    /// Stage named by the selector, if it was recognized.
    pub fn stage(&self) -> Option<Stage> {
        self.inner.stage
    }

    /// Path of the defaults file read during setup.
    pub fn defaults_path(&self) -> Option<&Path> {
        self.inner.defaults.as_ref().map(|d| d.path.as_path())
    }

    /// Whether a defaults file was read. `false` after an unrecognized selector.
    pub fn is_loaded(&self) -> bool {
        self.inner.defaults.is_some()
    }

    /// Handle a `ConfigAction` and print the result to stdout.
    pub fn handle_and_print<C>(&self, action: &ConfigAction) -> Result<(), DeployfigError>
    where
        C: Config + Serialize,
        C::Layer: for<'de> Deserialize<'de>,
    {
        let result = self.handle::<C>(action)?;
        println!("{result}");
        Ok(())
    }

    /// Handle a `ConfigAction` (list / gen / get).
    ///
    /// `list` and `get` show the populated values without validating them, so
    /// they stay usable for diagnosing a config that fails validation.
    pub fn handle<C>(&self, action: &ConfigAction) -> Result<ConfigResult, DeployfigError>
    where
        C: Config + Serialize,
        C::Layer: for<'de> Deserialize<'de>,
    {
        match action {
            ConfigAction::List => {
                let config = self.decode::<C>()?;
                ops::list_values(&config)
            }
            ConfigAction::Gen { output } => {
                let template = ops::generate_template::<C>();
                match output {
                    Some(path) => {
                        if let Some(parent) = path.parent()
                            && !parent.as_os_str().is_empty()
                        {
                            std::fs::create_dir_all(parent).map_err(|e| {
                                DeployfigError::IoError {
                                    path: parent.to_path_buf(),
                                    source: e,
                                }
                            })?;
                        }
                        std::fs::write(path, &template).map_err(|e| DeployfigError::IoError {
                            path: path.clone(),
                            source: e,
                        })?;
                        Ok(ConfigResult::TemplateWritten { path: path.clone() })
                    }
                    None => Ok(ConfigResult::Template(template)),
                }
            }
            ConfigAction::Get { key } => {
                let config = self.decode::<C>()?;
                ops::get_value(&config, key)
            }
        }
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("prefix", &self.inner.prefix)
            .field("stage", &self.inner.stage)
            .field("defaults_path", &self.defaults_path())
            .field("strict", &self.inner.strict)
            .finish_non_exhaustive()
    }
}
