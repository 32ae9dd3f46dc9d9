//! Page-level setup: configuration and logging for a browser page
//!
//! A page may embed its configuration as TOML in
//! `<script type="application/toml" id="blogsphere-config">`. Everything in it
//! is optional. Log verbosity comes from the same element's
//! `data-log-level` attribute.

use anyhow::Result;
use libblogsphere::logging::{LogFormat, LoggingConfig};
use libblogsphere::Config;

pub const CONFIG_SCRIPT_ID: &str = "blogsphere-config";
pub const LOG_LEVEL_ATTR: &str = "data-log-level";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Configuration for a page served from `origin`
///
/// `fetch` needs absolute URLs, so an unset `api.base_url` becomes the page
/// origin.
pub fn page_config(embedded: Option<&str>, origin: &str) -> Result<Config> {
    let mut config = match embedded.map(str::trim).filter(|text| !text.is_empty()) {
        Some(text) => Config::from_toml_str(text)
            .map_err(|e| anyhow::anyhow!("Invalid #{} block: {}", CONFIG_SCRIPT_ID, e))?,
        None => Config::default(),
    };

    if config.api.base_url.trim().is_empty() {
        config.api.base_url = origin.to_string();
    }
    Ok(config)
}

/// Console logging without timestamps; the browser console adds its own
pub fn logging_config(level: Option<&str>) -> LoggingConfig {
    let level = level
        .map(str::trim)
        .filter(|level| !level.is_empty())
        .unwrap_or(DEFAULT_LOG_LEVEL);
    LoggingConfig::new(LogFormat::Text, level.to_string(), false).without_timestamps()
}
