use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// OpenWeatherMap current-weather endpoint.
pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Environment variable overriding `provider.api_key`.
pub const API_KEY_ENV: &str = "OPENWEATHERMAP_API_KEY";
/// Environment variable overriding `provider.url`.
pub const WEATHER_URL_ENV: &str = "OPENWEATHERMAP_WEATHERURL";

/// Weather provider section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self { api_key: None, url: DEFAULT_WEATHER_URL.to_string(), timeout_secs: DEFAULT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Defaults to `weather.db` in the platform data directory.
    pub database_path: Option<PathBuf>,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// [provider]
/// api_key = "..."
/// url = "https://api.openweathermap.org/data/2.5/weather"
/// timeout_secs = 10
///
/// [storage]
/// database_path = "/var/lib/cityweather/weather.db"
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub storage: StorageConfig,
}

/// Immutable settings handed to the provider client at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Config {
    /// Load config from disk (or defaults on first run), then apply environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?, |key| std::env::var(key).ok())
    }

    /// Config exactly as stored on disk, without environment overrides.
    ///
    /// Use this when the result will be edited and saved back.
    pub fn load_file() -> Result<Self> {
        Self::load_file_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut cfg = Self::load_file_from(path)?;
        cfg.apply_overrides(lookup);
        Ok(cfg)
    }

    pub fn load_file_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Override provider settings from `lookup(key)`; empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(API_KEY_ENV) {
            self.provider.api_key = Some(key);
        }
        if let Some(url) = non_empty(WEATHER_URL_ENV) {
            self.provider.url = url;
        }
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "cityweather", "cityweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Configured database path, or the default one in the platform data directory.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.storage.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::project_dirs()?.data_dir().join("weather.db")),
        }
    }

    /// Set/replace the provider API key and optionally its endpoint.
    pub fn set_provider(&mut self, api_key: String, url: Option<String>) {
        self.provider.api_key = Some(api_key);
        if let Some(url) = url {
            self.provider.url = url;
        }
    }

    pub fn is_provider_configured(&self) -> bool {
        self.provider.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Settings for the provider client; fails when no API key is configured.
    pub fn provider_settings(&self) -> Result<ProviderSettings> {
        let api_key = self.provider.api_key.as_deref().filter(|k| !k.is_empty()).ok_or_else(|| {
            anyhow!(
                "No API key configured for the weather provider.\n\
                 Hint: run `cityweather configure` or set {API_KEY_ENV}."
            )
        })?;

        if self.provider.timeout_secs == 0 {
            return Err(anyhow!("provider.timeout_secs must be greater than zero"));
        }

        Ok(ProviderSettings {
            api_key: api_key.to_owned(),
            base_url: self.provider.url.clone(),
            timeout: Duration::from_secs(self.provider.timeout_secs),
        })
    }
}
