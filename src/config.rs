//! Configuration loaded with Figment.
//!
//! Precedence, highest first:
//! 1. Environment variables prefixed `USER_ADMIN_` (nested keys split on `__`,
//!    e.g. `USER_ADMIN_BACKEND__BASE_URL`)
//! 2. `./user-admin.toml`
//! 3. Defaults

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "user-admin.toml";
pub const ENV_PREFIX: &str = "USER_ADMIN_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Address the screen is served on.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Tracing filter directive (trace, debug, info, warn, error, or a full filter).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub backend: BackendConfig,
}

/// Where the user collection lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Remote REST user service.
    Http {
        base_url: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
    /// Local SQLite store.
    Sqlite {
        #[serde(default = "default_sqlite_url")]
        url: String,
    },
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Sqlite {
            url: default_sqlite_url(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_sqlite_url() -> String {
    "sqlite::memory:".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            log_level: default_log_level(),
            backend: BackendConfig::default(),
        }
    }
}

impl Config {
    /// Defaults, then the config file, then the environment.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load() -> Result<Self, figment::Error> {
        Self::from_figment(Self::figment())
    }

    pub fn from_figment(figment: Figment) -> Result<Self, figment::Error> {
        figment.extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_toml(toml: &str) -> Result<Config, figment::Error> {
        Config::from_figment(
            Figment::from(Serialized::defaults(Config::default())).merge(Toml::string(toml)),
        )
    }

    #[test]
    fn defaults() {
        let config = with_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.listen, "0.0.0.0:3000");
        assert_eq!(
            config.backend,
            BackendConfig::Sqlite {
                url: "sqlite::memory:".to_string()
            }
        );
    }

    #[test]
    fn http_backend() {
        let config = with_toml(
            r#"
            listen = "127.0.0.1:8080"

            [backend]
            kind = "http"
            base_url = "http://users.internal/api"
            "#,
        )
        .unwrap();

        assert_eq!(config.listen, "127.0.0.1:8080");
        assert_eq!(
            config.backend,
            BackendConfig::Http {
                base_url: "http://users.internal/api".to_string(),
                timeout_secs: 10,
            }
        );
    }

    #[test]
    fn unknown_backend_kind_fails() {
        assert!(with_toml("[backend]\nkind = \"redis\"").is_err());
    }
}
