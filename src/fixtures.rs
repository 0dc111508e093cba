#[cfg(test)]
pub mod test {
    use confique::Config;
    use serde::Serialize;
    use validator::Validate;

    use crate::mask::SafeString;
    use crate::validate::non_empty;

    pub const SERVICE_YAML: &str = "\
name: billing
http:
  url: https://example.com
  port: 8080
";

    #[derive(Config, Validate, Serialize, Debug, PartialEq)]
    pub struct ServiceConfig {
        /// Service name used in logs.
        #[config(default = "svc")]
        #[validate(custom(function = "non_empty"))]
        pub name: String,

        /// Upstream HTTP settings.
        #[config(nested)]
        #[validate(nested)]
        pub http: HttpConfig,

        /// Database password.
        #[config(env = "DB_PASSWORD")]
        pub db_password: Option<SafeString>,
    }

    #[derive(Config, Validate, Serialize, Debug, PartialEq)]
    pub struct HttpConfig {
        /// Base URL of the upstream service.
        #[config(env = "HTTP_URL")]
        #[validate(required, url)]
        pub url: Option<String>,

        /// Upstream port.
        #[config(env = "HTTP_PORT", default = 8080)]
        #[validate(range(min = 1, max = 65535))]
        pub port: u16,

        /// Fallback hosts.
        #[config(env = "HTTP_HOSTS")]
        pub hosts: Option<Vec<String>>,
    }

    // -- Three-level nesting: test.http.url -----------------------------------

    #[derive(Config, Validate, Serialize, Debug, PartialEq)]
    pub struct DeepConfig {
        #[config(nested)]
        #[validate(nested)]
        pub test: DeepTest,
    }

    #[derive(Config, Validate, Serialize, Debug, PartialEq)]
    pub struct DeepTest {
        #[config(nested)]
        #[validate(nested)]
        pub http: DeepHttp,
    }

    #[derive(Config, Validate, Serialize, Debug, PartialEq)]
    pub struct DeepHttp {
        #[config(env = "HTTP_URL")]
        #[validate(required, url)]
        pub url: Option<String>,
    }

    // -- A field the defaults file never provides ------------------------------

    #[derive(Config, Validate, Serialize, Debug, PartialEq)]
    pub struct AuthConfig {
        #[config(nested)]
        #[validate(nested)]
        pub test: AuthTest,
    }

    #[derive(Config, Validate, Serialize, Debug, PartialEq)]
    pub struct AuthTest {
        #[config(env = "AUTH_URL_NOT_VALID")]
        #[validate(required)]
        pub url_not_valid: Option<String>,
    }

    // -- Required fields with no compiled default ------------------------------

    #[derive(Config, Validate, Serialize, Debug, PartialEq)]
    pub struct ReleaseConfig {
        #[config(env = "RELEASE_NAME")]
        #[validate(custom(function = "non_empty"))]
        pub name: String,

        pub version: String,

        #[config(env = "RELEASE_CODE")]
        pub code: String,

        pub flag: String,

        #[config(env = "RELEASE_REPLICAS")]
        #[validate(range(min = 1))]
        pub replicas: u32,
    }

    #[test]
    fn service_config_loads_defaults() {
        let config = ServiceConfig::builder().load().unwrap();
        assert_eq!(config.name, "svc");
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.http.url, None);
        assert_eq!(config.db_password, None);
    }
}
