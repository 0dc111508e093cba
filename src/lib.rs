//! Stage-aware configuration for deployed services. Pick a YAML defaults file
//! by deployment stage, let environment variables override individual fields,
//! and validate the result.
//!
//! Deployfig resolves settings from three sources: a YAML defaults file chosen
//! by the `<PREFIX>ENV` variable, an optional local `KEY=VALUE` override file,
//! and the live process environment. Built on
//! [confique](https://docs.rs/confique) for struct-driven defaults, env tags
//! and template generation.
//!
//! ```ignore
//! let snapshot = Deployfig::setup()
//!     .env_prefix("APP_")
//!     .defaults(Stage::Dev, "config/dev.yaml")
//!     .defaults(Stage::Prod, "config/prod.yaml")
//!     .override_file(".env")
//!     .load()?;
//!
//! let http: HttpConfig = snapshot.load()?;
//! ```
//!
//! That call reads `APP_ENV`, loads the matching defaults file, overlays
//! `APP_*` variables bound by the struct's `#[config(env = ...)]` fields, and
//! runs the struct's validation constraints.
//!
//! # Two phases
//!
//! **Setup** runs once at startup and produces a [`Snapshot`]:
//!
//! 1. The override file (e.g. `.env`) is searched for in the start directory
//!    and up to [`LOOKUP_DEPTH_DEFAULT`] parent directories. Its assignments
//!    are written to the environment, but never over a variable that already
//!    has a non-empty value. Not finding the file is fine; a malformed line
//!    stops setup.
//! 2. `<PREFIX>ENV` must be set. Its value (`dev`/`development`,
//!    `stage`/`staging`, `prod`/`production`) picks a [`Stage`].
//! 3. The stage's defaults file is read into the snapshot.
//!
//! The first failing step stops setup and its error is returned.
//!
//! **Populate** runs per destination struct, as often as needed, from any
//! thread: [`Snapshot::load`] decodes the defaults, overlays the environment
//! and validates. Each call reads the environment afresh; the defaults bytes
//! never change after setup.
//!
//! # Layer precedence
//!
//! ```text
//! Compiled defaults     #[config(default = ...)]
//!        ↑ overridden by
//! YAML defaults file    config/<stage>.yaml
//!        ↑ overridden by
//! Override file         .env (only fills variables that are unset)
//!        ↑ overridden by
//! Process environment   <PREFIX><SUFFIX>
//! ```
//!
//! # Destination structs
//!
//! A destination derives confique's `Config` and `validator`'s [`Validate`]:
//!
//! ```ignore
//! #[derive(Config, Validate, Serialize)]
//! struct HttpConfig {
//!     /// Upstream base URL.
//!     #[config(env = "HTTP_URL")]
//!     #[validate(required, url)]
//!     url: Option<String>,
//!
//!     #[config(env = "HTTP_PORT", default = 8080)]
//!     #[validate(range(min = 1, max = 65535))]
//!     port: u16,
//! }
//! ```
//!
//! - The field name is the YAML key; `#[config(nested)]` maps a nested
//!   mapping.
//! - `#[config(env = "SUFFIX")]` binds the field to `<PREFIX><SUFFIX>`. A set,
//!   non-empty variable replaces whatever the YAML holds for that field.
//! - Several destination structs can be populated from one snapshot, each
//!   reading its own part of the file.
//!
//! Env values are typed by what the YAML holds at that position: a string
//! stays verbatim, a list is split on commas, anything else is read as a YAML
//! scalar. A scalar still fills a string field, so `HTTP_URL=12345` and
//! `name: 123` both decode into `String`s.
//!
//! A field with no compiled default that neither source sets gets the zero
//! value of its type. [`Snapshot::load`] reports each such field as a
//! `required` violation; [`Snapshot::decode`] keeps the zero.
//!
//! # Validation
//!
//! Every violation is collected in one pass, in field declaration order and
//! one per field. A failing struct yields
//! [`DeployfigError::ValidationFailed`], rendered one line per violation:
//!
//! ```text
//! Field validation for 'http.url' failed on the 'required' constraint
//! Field validation for 'http.port' failed on the 'range' constraint
//! ```
//!
//! A custom check that cannot be evaluated at all returns [`fault`] and is
//! reported separately as [`DeployfigError::ValidatorFailed`]. Plain `String`
//! fields use [`non_empty`] where an `Option` would use `required`.
//!
//! # Testing without touching the process
//!
//! Every environment read and write goes through [`Environment`]. Pass a
//! [`MapEnv`] to [`SetupBuilder::env`] and setup never mutates the real
//! process environment.
//!
//! # Secrets
//!
//! [`SafeString`] holds a secret: the application reads it with
//! [`as_str`](SafeString::as_str), while `Debug` and `Serialize` emit a
//! fixed-width mask, so `config list` and logs don't leak it.
//!
//! # Clap adapter
//!
//! The `cli` module (behind the `clap` feature, on by default) provides
//! [`ConfigArgs`] for `config list|gen|get` subcommands. Convert with
//! [`into_action()`](ConfigArgs::into_action) and run with
//! [`Snapshot::handle()`].
//!
//! # Error handling
//!
//! All fallible operations return [`DeployfigError`]. Messages name the
//! variable, file or key involved and, for setup mistakes, the builder method
//! to call. See the [`error`] module for the full set.

pub mod envfile;
pub mod error;
pub mod global;
pub mod locate;
pub mod mask;
pub mod types;

mod bindings;
mod builder;
#[cfg(feature = "clap")]
mod cli;
mod env;
mod ops;
mod resolve;
mod snapshot;
mod strict;
mod validate;

#[cfg(test)]
mod fixtures;

pub use builder::{Deployfig, SetupBuilder};
#[cfg(feature = "clap")]
pub use cli::{ConfigArgs, ConfigSubcommand};
pub use env::{Environment, MapEnv, ProcessEnv};
pub use error::DeployfigError;
pub use locate::LOOKUP_DEPTH_DEFAULT;
pub use mask::SafeString;
pub use ops::ConfigResult;
pub use snapshot::Snapshot;
pub use types::{ConfigAction, Stage};
pub use validate::{FAULT, REQUIRED, ValidationErrors, Violation, fault, non_empty, validate};
pub use validator::Validate;
