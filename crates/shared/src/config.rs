//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Exchange-rate provider configuration.
    #[serde(default)]
    pub rates: RatesConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Exchange-rate provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RatesConfig {
    /// Base URL of the spot-rate provider.
    #[serde(default = "default_provider_url")]
    pub provider_url: String,
    /// How long a cached quote stays reusable, in seconds.
    #[serde(default = "default_freshness_secs")]
    pub freshness_secs: u64,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            provider_url: default_provider_url(),
            freshness_secs: default_freshness_secs(),
        }
    }
}

fn default_provider_url() -> String {
    "https://api.exchangerate.host".to_string()
}

fn default_freshness_secs() -> u64 {
    3600 // 1 hour
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("SPESA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let cfg: AppConfig = serde_json::from_value(serde_json::json!({
            "database": { "url": "postgres://localhost/spesa" }
        }))
        .unwrap();

        assert_eq!(cfg.database.max_connections, 10);
        assert_eq!(cfg.database.min_connections, 1);
        assert_eq!(cfg.rates.freshness_secs, 3600);
        assert_eq!(cfg.rates.provider_url, "https://api.exchangerate.host");
    }

    #[test]
    fn test_explicit_values_win() {
        let cfg: AppConfig = serde_json::from_value(serde_json::json!({
            "database": { "url": "postgres://localhost/spesa", "max_connections": 3 },
            "rates": { "provider_url": "http://localhost:9000", "freshness_secs": 60 }
        }))
        .unwrap();

        assert_eq!(cfg.database.max_connections, 3);
        assert_eq!(cfg.rates.provider_url, "http://localhost:9000");
        assert_eq!(cfg.rates.freshness_secs, 60);
    }
}
