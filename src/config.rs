use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::fmt;

use crate::runtime::DEFAULT_RUNTIME_URL;

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
pub const DEFAULT_LOG_FILTER: &str = "stratforge=info";

/// Which template store backs the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Memory,
    Redis,
    Postgres,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreKind::Memory => "memory",
            StoreKind::Redis => "redis",
            StoreKind::Postgres => "postgres",
        })
    }
}

/// Application settings
///
/// Layered as: built-in defaults, then an optional `stratforge.toml` (or any
/// format `config` recognises) in the working directory, then `STRATFORGE_*`
/// environment variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfig {
    pub store: StoreKind,
    pub redis_url: String,
    #[serde(default)]
    pub database_url: Option<String>,
    pub runtime_url: String,
    pub log_filter: String,
    pub owner_id: String,
    pub public_list_limit: usize,
}

impl AppConfig {
    /// Load settings from `.env`, `stratforge.*` and the environment
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Self::defaults()?
            .add_source(File::with_name("stratforge").required(false))
            .add_source(Environment::with_prefix("STRATFORGE").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Builder pre-populated with every default
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("store", StoreKind::default().to_string())?
            .set_default("redis_url", DEFAULT_REDIS_URL)?
            .set_default("runtime_url", DEFAULT_RUNTIME_URL)?
            .set_default("log_filter", DEFAULT_LOG_FILTER)?
            .set_default("owner_id", "local")?
            .set_default("public_list_limit", 10)
    }

    /// Postgres URL, falling back to the conventional local database
    pub fn database_url_or_default(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| "postgres://localhost/stratforge".to_string())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreKind::default(),
            redis_url: DEFAULT_REDIS_URL.to_string(),
            database_url: None,
            runtime_url: DEFAULT_RUNTIME_URL.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            owner_id: "local".to_string(),
            public_list_limit: 10,
        }
    }
}
