//! Process-wide snapshot for applications that set up once in `main` and
//! populate config structs from anywhere afterwards.
//!
//! ```ignore
//! let snapshot = Deployfig::setup().env_prefix("APP_").defaults(Stage::Dev, "config/dev.yaml").load()?;
//! deployfig::global::install(snapshot).ok();
//! // ... elsewhere
//! let http: HttpConfig = deployfig::global::load()?;
//! ```
//!
//! Passing a [`Snapshot`] around explicitly is preferred; this module is a thin
//! `OnceLock` over it.

use std::sync::OnceLock;

use confique::Config;
use serde::Deserialize;
use tracing::debug;
use validator::Validate;

use crate::error::DeployfigError;
use crate::snapshot::Snapshot;

static SNAPSHOT: OnceLock<Snapshot> = OnceLock::new();

/// Install `snapshot` as the process-wide one.
///
/// Only the first install takes effect; later ones hand the rejected snapshot
/// back.
pub fn install(snapshot: Snapshot) -> Result<(), Snapshot> {
    SNAPSHOT.set(snapshot).inspect_err(|rejected| {
        debug!(?rejected, "snapshot already installed, ignoring");
    })
}

/// The installed snapshot, if any.
pub fn get() -> Option<&'static Snapshot> {
    SNAPSHOT.get()
}

/// [`Snapshot::load`] on the installed snapshot.
pub fn load<C>() -> Result<C, DeployfigError>
where
    C: Config + Validate,
    C::Layer: for<'de> Deserialize<'de>,
{
    installed()?.load()
}

/// [`Snapshot::decode`] on the installed snapshot.
pub fn decode<C: Config>() -> Result<C, DeployfigError>
where
    C::Layer: for<'de> Deserialize<'de>,
{
    installed()?.decode()
}

fn installed() -> Result<&'static Snapshot, DeployfigError> {
    get().ok_or(DeployfigError::NotInstalled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;
    use crate::fixtures::test::{SERVICE_YAML, ServiceConfig};
    use crate::types::Stage;
    use std::sync::Arc;

    // The OnceLock is shared by every test in the binary, so the whole
    // lifecycle lives in one test.
    #[test]
    fn install_once_then_load_anywhere() {
        assert!(get().is_none());
        assert!(matches!(
            load::<ServiceConfig>(),
            Err(DeployfigError::NotInstalled)
        ));

        let first = Snapshot::new(
            "APP_".into(),
            Some(Stage::Dev),
            Some(("dev.yaml".into(), SERVICE_YAML.as_bytes().to_vec())),
            Arc::new(MapEnv::new()),
            false,
        );
        install(first).unwrap();

        let second = Snapshot::new("OTHER_".into(), None, None, Arc::new(MapEnv::new()), false);
        let rejected = install(second).unwrap_err();
        assert_eq!(rejected.prefix(), "OTHER_");

        assert_eq!(get().unwrap().prefix(), "APP_");
        let config: ServiceConfig = load().unwrap();
        assert_eq!(config.name, "billing");
        let config: ServiceConfig = decode().unwrap();
        assert_eq!(config.http.port, 8080);
    }
}
