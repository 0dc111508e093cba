//! Configuration structs for the deployfig demo application.
//!
//! Two independent destinations read from the same defaults file:
//! [`ServerConfig`] and [`DatabaseConfig`]. Each field tagged with
//! `#[config(env = ...)]` can be overridden by `DEMO_<SUFFIX>`.
//!
//! | Env var              | Config key         |
//! |----------------------|--------------------|
//! | `DEMO_HTTP_HOST`     | `http.host`        |
//! | `DEMO_HTTP_PORT`     | `http.port`        |
//! | `DEMO_HTTP_ORIGINS`  | `http.origins`     |
//! | `DEMO_PUBLIC_URL`    | `http.public_url`  |
//! | `DEMO_DB_URL`        | `database.url`     |
//! | `DEMO_DB_PASSWORD`   | `database.password`|

use confique::Config;
use deployfig::{SafeString, non_empty};
use serde::Serialize;
use validator::Validate;

/// HTTP server settings.
#[derive(Config, Validate, Serialize, Debug)]
pub struct ServerConfig {
    /// Service name shown in the banner.
    #[config(default = "deployfig-demo")]
    #[validate(custom(function = "non_empty"))]
    pub name: String,

    #[config(nested)]
    #[validate(nested)]
    pub http: HttpConfig,
}

#[derive(Config, Validate, Serialize, Debug)]
pub struct HttpConfig {
    /// Interface to bind.
    #[config(env = "HTTP_HOST", default = "127.0.0.1")]
    #[validate(custom(function = "non_empty"))]
    pub host: String,

    /// Port to listen on.
    #[config(env = "HTTP_PORT", default = 8080)]
    #[validate(range(min = 1, max = 65535))]
    pub port: u16,

    /// Allowed CORS origins (comma separated in the environment).
    #[config(env = "HTTP_ORIGINS", default = [])]
    pub origins: Vec<String>,

    /// URL clients use to reach this service.
    #[config(env = "PUBLIC_URL")]
    #[validate(required, url)]
    pub public_url: Option<String>,
}

/// Database settings. Lives under `database:` in the same file.
#[derive(Config, Validate, Serialize, Debug)]
pub struct DatabaseConfig {
    #[config(nested)]
    #[validate(nested)]
    pub database: DbSection,
}

#[derive(Config, Validate, Serialize, Debug)]
pub struct DbSection {
    /// Connection URL, without credentials.
    #[config(env = "DB_URL")]
    #[validate(required, url)]
    pub url: Option<String>,

    /// Password. Masked in `config list` and debug output.
    #[config(env = "DB_PASSWORD")]
    #[validate(required)]
    pub password: Option<SafeString>,

    /// Connection pool size.
    #[config(default = 5)]
    #[validate(range(min = 1, max = 100))]
    pub pool_size: u32,
}
