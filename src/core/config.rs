use crate::core::currency::{CurrencyInfo, REFERENCE_CURRENCY, RateTable};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SteamProviderConfig {
    pub base_url: String,
    /// Store region the reference price is taken from.
    pub region: String,
}

impl Default for SteamProviderConfig {
    fn default() -> Self {
        SteamProviderConfig {
            base_url: "https://store.steampowered.com".to_string(),
            region: "cn".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ExchangeRateProviderConfig {
    pub base_url: String,
    /// Live rates are opt-in; the built-in table is used otherwise.
    pub enabled: bool,
}

impl Default for ExchangeRateProviderConfig {
    fn default() -> Self {
        ExchangeRateProviderConfig {
            base_url: "https://open.er-api.com".to_string(),
            enabled: false,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct ProvidersConfig {
    pub steam: SteamProviderConfig,
    pub exchange_rate: ExchangeRateProviderConfig,
}

/// Where things live in the sales page markup.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct PageLayout {
    pub header_row: String,
    pub body_rows: String,
    pub id_attribute: String,
    /// Zero-based index of the comparison price cell within a row.
    pub comparison_column: usize,
    /// Element whose text is used for change detection.
    pub region: String,
    pub result_header: String,
}

impl Default for PageLayout {
    fn default() -> Self {
        PageLayout {
            header_row: ".table-sales thead tr".to_string(),
            body_rows: ".table-sales tbody tr".to_string(),
            id_attribute: "data-appid".to_string(),
            comparison_column: 4,
            region: ".app".to_string(),
            result_header: "CNPrice".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    /// URL or file path of the sales page.
    pub source: String,
    pub currency: String,
    pub providers: ProvidersConfig,
    pub layout: PageLayout,
    pub poll_interval_ms: u64,
    pub stagger_ms: u64,
    pub request_timeout_secs: u64,
    pub rate_timeout_secs: u64,
    pub user_agent: String,
    /// Replaces the built-in currency table when non-empty.
    pub currencies: Vec<CurrencyInfo>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            source: "https://steamdb.info/sales/".to_string(),
            currency: REFERENCE_CURRENCY.to_string(),
            providers: ProvidersConfig::default(),
            layout: PageLayout::default(),
            poll_interval_ms: 1000,
            stagger_ms: 0,
            request_timeout_secs: 10,
            rate_timeout_secs: 5,
            user_agent: "cnprice/0.5".to_string(),
            currencies: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Loads the config at `path`, or the default location. A missing file
    /// at the default location yields the defaults.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }
        let config_path = Self::default_config_path()?;
        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            debug!(path = %config_path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("", "", "cnprice")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn rate_table(&self) -> RateTable {
        if self.currencies.is_empty() {
            RateTable::builtin()
        } else {
            RateTable::new(REFERENCE_CURRENCY, self.currencies.clone())
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn rate_timeout(&self) -> Duration {
        Duration::from_secs(self.rate_timeout_secs)
    }
}
