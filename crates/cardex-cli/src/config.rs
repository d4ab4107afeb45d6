//! Configuration loading from TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use cardex_core::HttpConfig;
use cardex_ingest::IngestConfig;
use cardex_scryfall::{BulkKind, DEFAULT_BASE_URL};
use serde::Deserialize;

/// Global configuration for cardex
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub ingest: IngestSection,
    pub store: StoreConfig,
    pub workers: WorkersConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    #[serde(deserialize_with = "deserialize_env_string")]
    pub base_url: String,
    #[serde(deserialize_with = "deserialize_env_string")]
    pub user_agent: String,
    /// Minimum spacing between API calls
    pub min_interval_ms: u64,
    /// Seconds without data before a download counts as stalled
    pub read_timeout: u64,
    pub connect_timeout: u64,
    pub max_retries: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let http = HttpConfig::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: http.user_agent,
            min_interval_ms: cardex_core::DEFAULT_MIN_INTERVAL.as_millis() as u64,
            read_timeout: http.read_timeout.as_secs(),
            connect_timeout: http.connect_timeout.as_secs(),
            max_retries: http.max_retries,
        }
    }
}

impl ApiConfig {
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            read_timeout: Duration::from_secs(self.read_timeout),
            connect_timeout: Duration::from_secs(self.connect_timeout),
            max_retries: self.max_retries,
            user_agent: self.user_agent.clone(),
        }
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

/// `[ingest]` section. Mirrors [`IngestConfig`] with the export type as text.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestSection {
    pub process_rulings: bool,
    pub max_sets: Option<usize>,
    pub set_codes: Vec<String>,
    pub denied_set_codes: Vec<String>,
    pub denied_set_types: Vec<String>,
    pub include_digital: bool,
    pub include_previews: bool,
    pub strict_paging: bool,
    pub card_bulk_type: String,
}

impl Default for IngestSection {
    fn default() -> Self {
        let defaults = IngestConfig::default();
        Self {
            process_rulings: defaults.process_rulings,
            max_sets: defaults.max_sets,
            set_codes: defaults.set_codes,
            denied_set_codes: defaults.denied_set_codes,
            denied_set_types: defaults.denied_set_types,
            include_digital: defaults.include_digital,
            include_previews: defaults.include_previews,
            strict_paging: defaults.strict_paging,
            card_bulk_type: defaults.card_bulk.type_name().to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    #[serde(deserialize_with = "deserialize_env_path")]
    pub root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./cardex-store"),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    /// Parallel document writes
    pub writers: usize,
    /// Documents per write batch
    pub batch_size: usize,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            writers: cpus.min(8),
            batch_size: cardex_store::DEFAULT_BATCH_SIZE,
        }
    }
}

/// Deserialize a string that may be an environment variable reference like ${VAR}
fn deserialize_env_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    expand_env_var(&s).ok_or_else(|| serde::de::Error::custom(format!("{s} is not set")))
}

fn deserialize_env_path<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserialize_env_string(deserializer).map(PathBuf::from)
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./cardex.toml (current directory)
    /// 2. ~/.config/cardex/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("cardex.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "cardex") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Pipeline settings from `[ingest]` and `[workers]`.
    pub fn ingest_config(&self) -> Result<IngestConfig> {
        let section = &self.ingest;
        let card_bulk = BulkKind::from_name(&section.card_bulk_type)
            .with_context(|| format!("Unknown bulk type: {}", section.card_bulk_type))?;
        let config = IngestConfig {
            process_rulings: section.process_rulings,
            max_sets: section.max_sets,
            set_codes: section.set_codes.clone(),
            denied_set_codes: section.denied_set_codes.clone(),
            denied_set_types: section.denied_set_types.clone(),
            include_digital: section.include_digital,
            include_previews: section.include_previews,
            strict_paging: section.strict_paging,
            card_bulk,
            batch_size: self.workers.batch_size,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api.min_interval_ms, 100);
        assert_eq!(config.store.root, PathBuf::from("./cardex-store"));
        assert!(config.workers.writers >= 1);
        assert!(config.ingest.process_rulings);
    }

    #[test]
    fn expand_env_var_simple() {
        std::env::set_var("CARDEX_TEST_VAR", "test_value");
        assert_eq!(
            expand_env_var("${CARDEX_TEST_VAR}"),
            Some("test_value".to_string())
        );
        std::env::remove_var("CARDEX_TEST_VAR");
    }

    #[test]
    fn expand_env_var_literal() {
        assert_eq!(expand_env_var("literal"), Some("literal".to_string()));
    }

    #[test]
    fn expand_env_var_missing() {
        assert_eq!(expand_env_var("${NONEXISTENT_VAR_12345}"), None);
    }

    #[test]
    fn parse_config_toml() {
        let toml = r#"
[api]
min_interval_ms = 250
max_retries = 5

[ingest]
process_rulings = false
max_sets = 10
set_codes = ["lea", "leb"]
denied_set_types = ["token", "memorabilia"]
card_bulk_type = "default_cards"

[store]
root = "/tmp/cardex"

[workers]
writers = 4
batch_size = 256
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.api.min_interval(), Duration::from_millis(250));
        assert_eq!(config.api.max_retries, 5);
        assert_eq!(config.store.root, PathBuf::from("/tmp/cardex"));

        let ingest = config.ingest_config().unwrap();
        assert!(!ingest.process_rulings);
        assert_eq!(ingest.max_sets, Some(10));
        assert_eq!(ingest.card_bulk, BulkKind::DefaultCards);
        assert_eq!(ingest.batch_size, 256);
    }

    #[test]
    fn unknown_bulk_type_rejected() {
        let toml = r#"
[ingest]
card_bulk_type = "every_card"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.ingest_config().is_err());
    }

    #[test]
    fn missing_env_var_fails_parse() {
        let toml = r#"
[store]
root = "${NONEXISTENT_CARDEX_ROOT_12345}"
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }
}
