use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Errors related to application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// An environment variable required by the application is not set.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub api: ApiConfig,

    pub store: StoreConfig,

    pub email: EmailConfig,

    pub cities: Vec<CityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Fallback filter when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub search_url: String,
    pub model: String,
    pub language: String,
    pub super_region: String,
    pub arrange_by: String,
    pub order: String,
    /// Results requested per query. Only the first page is ever read.
    pub page_size: u32,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            search_url: "https://www.tesla.com/inventory/api/v1/inventory-results".to_string(),
            model: "m3".to_string(),
            language: "en".to_string(),
            super_region: "north america".to_string(),
            arrange_by: "Relevance".to_string(),
            order: "desc".to_string(),
            page_size: 50,
            timeout_secs: 30,
        }
    }
}

/// What the store adapter does when a delete or upsert fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Log the failure and carry on as if the write happened.
    #[default]
    BestEffort,
    /// Surface the failure to the caller.
    Strict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub busy_timeout_ms: u64,
    pub write_policy: WritePolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("inventory.sqlite3"),
            busy_timeout_ms: 5_000,
            write_policy: WritePolicy::BestEffort,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub api_url: String,
    pub sender_name: String,
    pub sender_email: String,
    /// Operator addresses alerted when a city fails to process.
    pub failure_recipients: Vec<String>,
    pub timeout_secs: u64,
    /// Name of the environment variable holding the Brevo API key.
    pub api_key_env: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.brevo.com/v3/smtp/email".to_string(),
            sender_name: "Inventory Watch".to_string(),
            sender_email: String::new(),
            failure_recipients: Vec::new(),
            timeout_secs: 30,
            api_key_env: "BREVO_API_KEY".to_string(),
        }
    }
}

impl EmailConfig {
    pub fn api_key(&self) -> Result<String, ConfigError> {
        get_env_var(&self.api_key_env)
    }
}

/// One subscription city. `name` is the key vehicles are stored under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityConfig {
    pub name: String,
    pub postal_code: String,
    pub region: String,
    pub market: String,
    /// Search radius, in the market's distance unit.
    pub range: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub recipients: Vec<String>,
}

impl Config {
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cities.is_empty() {
            return Err(ConfigError::Invalid("no cities configured".into()));
        }

        let mut seen = HashSet::new();
        for city in &self.cities {
            if city.name.trim().is_empty() {
                return Err(ConfigError::Invalid("city with empty name".into()));
            }
            if !seen.insert(city.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate city '{}'",
                    city.name
                )));
            }
            if city.recipients.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "city '{}' has no recipients",
                    city.name
                )));
            }
        }

        if self.email.failure_recipients.is_empty() {
            return Err(ConfigError::Invalid(
                "email.failure_recipients must not be empty".into(),
            ));
        }
        if self.api.page_size == 0 {
            return Err(ConfigError::Invalid("api.page_size must be > 0".into()));
        }
        if self.api.timeout_secs == 0 || self.email.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be > 0".into()));
        }

        Ok(())
    }

    pub fn city(&self, name: &str) -> Option<&CityConfig> {
        self.cities.iter().find(|c| c.name == name)
    }
}

/// Reads an environment variable, returning a structured error if it's missing.
pub fn get_env_var(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}
