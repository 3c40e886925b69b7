//! Configuration management using Figment
//!
//! Sources are layered lowest priority first: built-in defaults, then the TOML file
//! (`./docrest.toml`, or the path in `DOCREST_CONFIG`), then `DOCREST_` environment
//! variables with `__` separating nested keys (`DOCREST_SERVER__LISTEN`).

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

/// Environment variable naming an alternative configuration file.
pub const CONFIG_PATH_VAR: &str = "DOCREST_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "docrest.toml";

/// Complete host configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    /// Deadline applied to the store work of every request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    /// Filter directive, overridden by `RUST_LOG` when set.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Which store backend to run against.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Memory,
    MongoDb,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: BackendKind,
    /// Connection string, required for `mongodb`.
    #[serde(default)]
    pub uri: Option<String>,
    /// Database name, required for `mongodb`.
    #[serde(default)]
    pub database: Option<String>,
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_request_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, figment::Error> {
        let path = std::env::var(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        Self::figment(path).extract()
    }

    /// Builds the layered figment reading the TOML file at `path`.
    ///
    /// A missing file is skipped.
    pub fn figment(path: impl Into<PathBuf>) -> Figment {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Config::default()))
            // Load from config file (if exists)
            .merge(Toml::file(path.into()))
            // Override with environment variables
            .merge(Env::prefixed("DOCREST_").split("__"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_sources() {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .extract()
            .unwrap();

        assert_eq!(config.server.listen, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.server.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.log.level, "info");
        assert!(!config.log.json);
        assert_eq!(config.store.backend, BackendKind::Memory);
        assert_eq!(config.store.uri, None);
    }

    #[test]
    fn toml_overrides_defaults() {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(
                r#"
                [server]
                request_timeout_secs = 5

                [store]
                backend = "mongodb"
                uri = "mongodb://localhost:27017"
                database = "app"
                "#,
            ))
            .extract()
            .unwrap();

        assert_eq!(config.server.request_timeout_secs, 5);
        assert_eq!(config.server.listen, default_listen());
        assert_eq!(config.store.backend, BackendKind::MongoDb);
        assert_eq!(config.store.database.as_deref(), Some("app"));
    }

    #[test]
    fn unknown_backend_is_an_error() {
        let result: Result<Config, _> = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string("[store]\nbackend = \"postgres\""))
            .extract();

        assert!(result.is_err());
    }

    #[test]
    fn missing_file_is_skipped() {
        let config: Config = Config::figment("does-not-exist.toml").extract().unwrap();

        assert_eq!(config.server.request_timeout_secs, 30);
    }
}
