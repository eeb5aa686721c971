//! Configuration Loader
//!
//! Loads `config.toml` with serde defaults; a missing file means defaults.
//! Secrets never live here; they come from the secret collaborator.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::adapters::http::{HttpClientConfig, RetryPolicy};

/// Main configuration structure matching config.toml.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub http: HttpSection,
    #[serde(default)]
    pub sources: SourcesSection,
    #[serde(default)]
    pub shipping: ShippingSection,
}

/// Outbound HTTP tuning shared by all adapters.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpSection {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Minimum spacing between call starts per client, in milliseconds.
    pub min_interval_ms: u64,
    /// Additional attempts after the first.
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            min_interval_ms: 1000,
            max_retries: 2,
            base_delay_ms: 500,
            max_delay_ms: 4000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesSection {
    /// Marketplace locale for the signed adapter ("JP" or "US").
    pub amazon_locale: String,
}

impl Default for SourcesSection {
    fn default() -> Self {
        Self {
            amazon_locale: "JP".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShippingSection {
    /// Packaging cost assumed when the caller does not supply one.
    pub default_packaging_cost: i64,
}

impl Default for ShippingSection {
    fn default() -> Self {
        Self {
            default_packaging_cost: 50,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("validation failed: {0}")]
    Validation(String),
}

/// Load configuration; a missing file yields the defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "timeout_secs must be > 0".to_string(),
            ));
        }
        if self.http.max_delay_ms < self.http.base_delay_ms {
            return Err(ConfigError::Validation(format!(
                "max_delay_ms {} must be >= base_delay_ms {}",
                self.http.max_delay_ms, self.http.base_delay_ms
            )));
        }
        if self.shipping.default_packaging_cost < 0 {
            return Err(ConfigError::Validation(format!(
                "default_packaging_cost must be >= 0, got {}",
                self.shipping.default_packaging_cost
            )));
        }
        Ok(())
    }

    /// HTTP client tuning for the adapters.
    pub fn http_client_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            timeout: Duration::from_secs(self.http.timeout_secs),
            min_interval: Duration::from_millis(self.http.min_interval_ms),
            retry: RetryPolicy {
                max_retries: self.http.max_retries,
                base_delay: Duration::from_millis(self.http.base_delay_ms),
                max_delay: Duration::from_millis(self.http.max_delay_ms),
            },
        }
    }
}
