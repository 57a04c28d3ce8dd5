//! TOML configuration for the `dax` client.
//!
//! ```toml
//! [backend]
//! base_url = "http://localhost:5000/api"
//! timeout_secs = 30
//!
//! [library]
//! sort_by = "upload_date"
//! sort_order = "desc"
//!
//! [display]
//! snippet_chars = 500
//! bar_width = 30
//! ```
//!
//! Every section and key is optional; omitted values take the defaults shown.

use anyhow::{bail, Context, Result};
use doc_analytics_core::models::{SortBy, SortOrder, SortParams};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_CONFIG_PATH: &str = "./config/dax.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: None,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

/// Initial ordering of the document library.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LibraryConfig {
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl LibraryConfig {
    pub fn sort(&self) -> SortParams {
        SortParams::new(self.sort_by, self.sort_order)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    /// Characters of highlighted content shown when a result has no match
    /// contexts.
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            snippet_chars: default_snippet_chars(),
            bar_width: default_bar_width(),
        }
    }
}

fn default_snippet_chars() -> usize {
    500
}
fn default_bar_width() -> usize {
    30
}

impl Config {
    /// Built-in defaults, used when no config file exists at the default path.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Replace the backend base URL, e.g. from `--base-url`.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.backend.base_url = base_url.to_string();
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        let base_url = self.backend.base_url.trim();
        if base_url.is_empty() {
            bail!("backend.base_url must not be empty");
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            bail!(
                "backend.base_url must start with http:// or https://, got '{}'",
                base_url
            );
        }
        if self.backend.timeout_secs == 0 {
            bail!("backend.timeout_secs must be > 0");
        }
        if self.display.snippet_chars == 0 {
            bail!("display.snippet_chars must be > 0");
        }
        Ok(())
    }
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

/// Load `path`, falling back to [`Config::minimal`] only when `path` is the
/// default location and nothing is there.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if !path.exists() && path == Path::new(DEFAULT_CONFIG_PATH) {
        tracing::debug!("no config at {}, using defaults", path.display());
        return Ok(Config::minimal());
    }
    load_config(path)
}
