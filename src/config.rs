use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::constants::{
    AUTO_SELECTION_POLL_INTERVAL, DEFAULT_PAGE_SIZE, DEFAULT_PAGES_PER_FETCH,
    MAX_VISIBLE_CART_ITEMS,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storefront: StorefrontConfig,

    #[serde(default)]
    pub pagination: PaginationConfig,

    #[serde(default)]
    pub cart: CartConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub auto_selection: AutoSelectionConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorefrontConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_media_endpoint")]
    pub media_endpoint: String,

    #[serde(default = "default_search_endpoint")]
    pub search_endpoint: String,

    #[serde(default = "default_order_endpoint")]
    pub order_endpoint: String,

    #[serde(default = "default_auto_selection_endpoint")]
    pub auto_selection_endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default = "default_pages_per_fetch")]
    pub pages_per_fetch: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartConfig {
    #[serde(default = "default_max_visible_items")]
    pub max_visible_items: usize,

    #[serde(default = "default_true")]
    pub limit_visible: bool,

    /// Total load the user may order. Zero means unknown.
    #[serde(default)]
    pub available_quota: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout")]
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoSelectionConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load from an explicit path, writing defaults there when the file is missing.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            debug!("Loading config from {:?}", config_path);
            let contents =
                fs::read_to_string(config_path).context("Failed to read config file")?;
            let config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            info!("Config loaded successfully");
            Ok(config)
        } else {
            info!("No config file found, using defaults");
            let config = Config::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, contents).context("Failed to write config file")?;

        debug!("Config saved to {:?}", config_path);
        Ok(())
    }

    /// Location of the cart database, defaulting to the user data directory.
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.storage.database_path {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir().context("Failed to get data directory")?;
        Ok(data_dir.join("kiosk").join("cart.db"))
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("kiosk").join("config.toml"))
    }
}

impl PaginationConfig {
    /// Zero sizes would never move the cursor; raise them to one.
    pub fn normalized(self) -> Self {
        Self {
            page_size: self.page_size.max(1),
            pages_per_fetch: self.pages_per_fetch.max(1),
        }
    }

    /// Number of items requested per listing call.
    pub fn batch_len(&self) -> usize {
        self.page_size * self.pages_per_fetch
    }
}

impl NetworkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout)
    }
}

impl AutoSelectionConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            media_endpoint: default_media_endpoint(),
            search_endpoint: default_search_endpoint(),
            order_endpoint: default_order_endpoint(),
            auto_selection_endpoint: default_auto_selection_endpoint(),
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            pages_per_fetch: default_pages_per_fetch(),
        }
    }
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            max_visible_items: default_max_visible_items(),
            limit_visible: default_true(),
            available_quota: 0,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connection_timeout: default_timeout(),
        }
    }
}

impl Default for AutoSelectionConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
        }
    }
}

// Default value functions
fn default_base_url() -> String { "http://localhost:8000".to_string() }
fn default_media_endpoint() -> String { "/movies/get_media".to_string() }
fn default_search_endpoint() -> String { "/movies/search".to_string() }
fn default_order_endpoint() -> String { "/sales/confirm_order".to_string() }
fn default_auto_selection_endpoint() -> String { "/movies/check_auto_selection_status".to_string() }
fn default_page_size() -> usize { DEFAULT_PAGE_SIZE }
fn default_pages_per_fetch() -> usize { DEFAULT_PAGES_PER_FETCH }
fn default_max_visible_items() -> usize { MAX_VISIBLE_CART_ITEMS }
fn default_true() -> bool { true }
fn default_timeout() -> u64 { 30 }
fn default_poll_interval() -> u64 { AUTO_SELECTION_POLL_INTERVAL.as_secs() }
