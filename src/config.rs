use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::pricing::PriceFormat;

pub const DEFAULT_CONTAINER_ID: &str = "sistema-menu-container";
pub const DEFAULT_SHEET_TIMEOUT_MS: u64 = 3000;
pub const DEFAULT_FAILURE_MESSAGE: &str = "No fue posible cargar el menú en este momento.";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageConfig {
    pub input: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Bare spreadsheet id or absolute CSV URL.
    pub sheet_id: String,
    #[serde(default)]
    pub addons_sheet_id: Option<String>,
    #[serde(default)]
    pub backup_url: Option<String>,
    #[serde(default = "default_sheet_timeout_ms")]
    pub sheet_timeout_ms: u64,
    #[serde(default)]
    pub backup_timeout_ms: Option<u64>,
}

impl SourceConfig {
    pub fn sheet_timeout(&self) -> Duration {
        Duration::from_millis(self.sheet_timeout_ms)
    }

    pub fn backup_timeout(&self) -> Option<Duration> {
        self.backup_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(flatten)]
    pub source: SourceConfig,
    #[serde(default = "default_container_id")]
    pub container_id: String,
    #[serde(default = "default_failure_message")]
    pub failure_message: String,
    #[serde(default)]
    pub price: PriceFormat,
    pub page: PageConfig,
    #[serde(default)]
    pub check_interval_seconds: Option<u64>,
}

fn default_sheet_timeout_ms() -> u64 {
    DEFAULT_SHEET_TIMEOUT_MS
}

fn default_container_id() -> String {
    DEFAULT_CONTAINER_ID.to_string()
}

fn default_failure_message() -> String {
    DEFAULT_FAILURE_MESSAGE.to_string()
}

impl AppConfig {
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let mut config: AppConfig = serde_json::from_str(content)?;
        config.source.sheet_id = config.source.sheet_id.trim().to_string();
        if config.source.sheet_id.is_empty() {
            return Err(ConfigError::Missing("sheet_id"));
        }
        // Blank optional settings behave as if they were absent.
        config.source.addons_sheet_id = non_blank(config.source.addons_sheet_id.take());
        config.source.backup_url = non_blank(config.source.backup_url.take());
        Ok(config)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    AppConfig::from_json(&content)
}
