//! Service configuration
//!
//! Values come from an optional file (`config.yml`, `config.toml`, ... or the
//! path named by `USERS_CONFIG`) overridden by `USERS__`-prefixed environment
//! variables, e.g. `USERS__GRPC__PORT=9090` or
//! `USERS__DATABASE__DATABASE_URL=postgresql://...`.

use std::env;

use common::database::DatabaseConfig;
use config::{Config, ConfigError, Environment, File, builder::DefaultState};
use serde::Deserialize;

/// Environment variable naming the configuration file, without extension
pub const CONFIG_PATH_ENV: &str = "USERS_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config";
const ENV_PREFIX: &str = "USERS";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub grpc: GrpcConfig,
    #[serde(default)]
    pub rest: RestConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    #[serde(default = "default_project_name")]
    pub name: String,
    /// Lowers the default log level to `debug`
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GrpcConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_grpc_port")]
    pub port: u16,
    /// Per-request deadline in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_keepalive_interval_secs")]
    pub keepalive_interval_secs: u64,
    #[serde(default = "default_keepalive_timeout_secs")]
    pub keepalive_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_rest_port")]
    pub port: u16,
}

fn default_project_name() -> String {
    "users".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_grpc_port() -> u16 {
    8082
}

fn default_rest_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_keepalive_interval_secs() -> u64 {
    60
}

fn default_keepalive_timeout_secs() -> u64 {
    20
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_project_name(),
            debug: false,
        }
    }
}

impl Default for GrpcConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_grpc_port(),
            timeout_secs: default_timeout_secs(),
            keepalive_interval_secs: default_keepalive_interval_secs(),
            keepalive_timeout_secs: default_keepalive_timeout_secs(),
        }
    }
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_rest_port(),
        }
    }
}

impl GrpcConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl RestConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl AppConfig {
    /// Load the configuration file (if any) and apply environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        Self::from_builder(Config::builder().add_source(File::with_name(&path).required(false)))
    }

    fn from_builder(builder: config::ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
