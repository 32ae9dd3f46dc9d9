//! Configuration management for BlogSphere

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub ui: UiConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Prefix for every endpoint; empty means same origin
    pub base_url: String,
    pub login_path: String,
}

/// Timings and limits for the cosmetic parts of the interface
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub toast_ms: u64,
    pub flash_hide_ms: u64,
    pub form_error_hide_ms: u64,
    pub comment_remove_delay_ms: u64,
    pub scroll_duration_ms: u64,
    pub login_reenable_ms: u64,
    pub register_reenable_ms: u64,
    pub post_reenable_ms: u64,
    pub comment_max_chars: usize,
    pub title_max_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub bookmarks_key: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            login_path: "/login".to_string(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            toast_ms: 5000,
            flash_hide_ms: 5000,
            form_error_hide_ms: 5000,
            comment_remove_delay_ms: 300,
            scroll_duration_ms: 500,
            login_reenable_ms: 3000,
            register_reenable_ms: 5000,
            post_reenable_ms: 3000,
            comment_max_chars: 1000,
            title_max_chars: 200,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bookmarks_key: "bookmarks".to_string(),
        }
    }
}

impl UiConfig {
    pub fn toast(&self) -> Duration {
        Duration::from_millis(self.toast_ms)
    }

    pub fn flash_hide(&self) -> Duration {
        Duration::from_millis(self.flash_hide_ms)
    }

    pub fn form_error_hide(&self) -> Duration {
        Duration::from_millis(self.form_error_hide_ms)
    }

    pub fn comment_remove_delay(&self) -> Duration {
        Duration::from_millis(self.comment_remove_delay_ms)
    }

    pub fn scroll_duration(&self) -> Duration {
        Duration::from_millis(self.scroll_duration_ms)
    }

    pub fn login_reenable(&self) -> Duration {
        Duration::from_millis(self.login_reenable_ms)
    }

    pub fn register_reenable(&self) -> Duration {
        Duration::from_millis(self.register_reenable_ms)
    }

    pub fn post_reenable(&self) -> Duration {
        Duration::from_millis(self.post_reenable_ms)
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text, e.g. a block embedded in the page
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Absolute or same-origin URL for an endpoint path
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api.base_url.trim_end_matches('/'), path)
    }
}

/// Resolve the configuration file path following XDG Base Directory conventions
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("BLOGSPHERE_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("blogsphere").join("config.toml"))
}
