use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::provider::ProviderId;

/// Credentials and endpoint override for a single weather provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,

    /// Replaces the provider's public endpoint, e.g. for a proxy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Optional default provider id, e.g. "openweather" or "weatherapi".
    pub default_provider: Option<String>,

    /// Example TOML:
    /// [providers.openweather]
    /// api_key = "..."
    pub providers: HashMap<String, ProviderConfig>,

    pub weather: WeatherSettings,
    pub heading: HeadingSettings,
    pub dataset: DatasetSettings,
}

/// Wind acquisition knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSettings {
    pub request_timeout_secs: u64,
    pub cache_ttl_secs: u64,
    pub auto_refresh_secs: u64,
    /// Decimal places kept when building a cache key from a coordinate.
    pub key_precision: u32,
    /// Ease the displayed wind direction toward new readings instead of snapping.
    pub smoothing: bool,
    /// Fraction of the remaining arc covered per new reading when smoothing.
    pub smoothing_factor: f64,
    /// Hand out calm wind when a fetch fails and nothing was ever cached.
    pub synthetic_fallback: bool,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            cache_ttl_secs: 30 * 60,
            auto_refresh_secs: 10 * 60,
            key_precision: 4,
            smoothing: false,
            smoothing_factor: 0.3,
            synthetic_fallback: false,
        }
    }
}

impl WeatherSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn auto_refresh(&self) -> Duration {
        // Zero would make tokio's interval panic.
        Duration::from_secs(self.auto_refresh_secs.max(1))
    }
}

/// Compass filtering and the synthetic fallback generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingSettings {
    pub min_change_degrees: f64,
    pub synthetic_interval_ms: u64,
    pub synthetic_step_degrees: f64,
}

impl Default for HeadingSettings {
    fn default() -> Self {
        Self { min_change_degrees: 1.0, synthetic_interval_ms: 2000, synthetic_step_degrees: 1.0 }
    }
}

impl HeadingSettings {
    pub fn synthetic_interval(&self) -> Duration {
        Duration::from_millis(self.synthetic_interval_ms.max(1))
    }
}

/// Where the course dataset comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetSettings {
    /// File path or http(s) URL. Unset means the built-in sample data.
    pub primary: Option<String>,
    /// Tried in order after the primary source fails.
    pub mirrors: Vec<String>,
    pub attempts_per_source: u32,
    pub retry_backoff_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for DatasetSettings {
    fn default() -> Self {
        Self {
            primary: None,
            mirrors: Vec::new(),
            attempts_per_source: 2,
            retry_backoff_ms: 500,
            request_timeout_secs: 30,
        }
    }
}

impl DatasetSettings {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// Return the default provider as a strongly-typed ProviderId.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        let s = self.default_provider.as_ref().ok_or_else(|| {
            anyhow::anyhow!(
                "No default provider configured.\n\
                 Hint: run `fairway configure <provider>` (e.g. `fairway configure openweather`) first."
            )
        })?;

        ProviderId::try_from(s.as_str())
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Store default provider as string.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    /// Load config from the platform location, or defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform location, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "fairway", "fairway")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Convenience helper: set/replace a provider API key and optionally set default provider.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        let base_url = self.providers.get(provider_id.as_str()).and_then(|p| p.base_url.clone());
        self.providers
            .insert(provider_id.as_str().to_string(), ProviderConfig { api_key, base_url });

        if self.default_provider.is_none() {
            self.default_provider = Some(provider_id.to_string());
        }
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.providers.get(provider_id.as_str()).map(|cfg| cfg.api_key.as_str())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id).is_some()
    }
}
