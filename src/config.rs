use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use validator::Validate;

use crate::models::ScoreWeights;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub ranking: RankingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

/// Which listing store backs the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,
    /// JSON snapshot loaded by the memory backend
    pub snapshot_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SearchSettings {
    #[validate(range(min = 1, max = 1000))]
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> usize { 3 }

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RankingSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_rate_weight")]
    pub rate: f64,
    #[serde(default = "default_level_weight")]
    pub level: f64,
    #[serde(default = "default_reviews_weight")]
    pub reviews: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            rate: default_rate_weight(),
            level: default_level_weight(),
            reviews: default_reviews_weight(),
        }
    }
}

impl From<&WeightsConfig> for ScoreWeights {
    fn from(config: &WeightsConfig) -> Self {
        ScoreWeights {
            rate: config.rate,
            level: config.level,
            reviews: config.reviews,
        }
    }
}

fn default_rate_weight() -> f64 { 200.0 }
fn default_level_weight() -> f64 { 100.0 }
fn default_reviews_weight() -> f64 { 0.1 }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with LISTING__)
    /// 5. DATABASE_URL, if set
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., LISTING__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("LISTING")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Ok(database_url) = std::env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", database_url)?;
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validated()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("LISTING")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        self.search
            .validate()
            .map_err(|e| ConfigError::Message(format!("invalid search settings: {}", e)))?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Result<Settings, ConfigError> {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        settings.validated()
    }

    const MINIMAL: &str = r#"
        [server]
        host = "127.0.0.1"
        port = 8080

        [database]
        url = "postgres://localhost/gigs"
    "#;

    #[test]
    fn test_default_weights() {
        let weights = ScoreWeights::from(&WeightsConfig::default());
        assert_eq!(weights, ScoreWeights::default());
    }

    #[test]
    fn test_minimal_config_defaults() {
        let settings = from_toml(MINIMAL).unwrap();
        assert_eq!(settings.search.page_size, 3);
        assert_eq!(settings.store.backend, StoreBackend::Postgres);
        assert_eq!(settings.ranking.weights.rate, 200.0);
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let toml = format!("{}\n[search]\npage_size = 0\n", MINIMAL);
        assert!(from_toml(&toml).is_err());
    }

    #[test]
    fn test_memory_backend() {
        let toml = format!(
            "{}\n[store]\nbackend = \"memory\"\nsnapshot_path = \"seed.json\"\n",
            MINIMAL
        );
        let settings = from_toml(&toml).unwrap();
        assert_eq!(settings.store.backend, StoreBackend::Memory);
        assert_eq!(settings.store.snapshot_path.as_deref(), Some("seed.json"));
    }
}
