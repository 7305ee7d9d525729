//! Runtime configuration loaded from `~/.apiscribe/config.yaml`

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::constants::{
    BASE_URL_ENV, CONFIG_DIR_NAME, DEFAULT_BASE_URL, DEFAULT_CHAT_PATH,
    DEFAULT_FILE_PREVIEW_PATH, DEFAULT_PROXY_PATH, DEFAULT_TIMEOUT_SECS,
};

const CONFIG_FILE_NAME: &str = "config.yaml";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub chat_path: String,
    pub proxy_path: String,
    pub file_preview_path: String,
    pub request_timeout_secs: u64,
    /// Pretty-print JSON response bodies in the console
    pub auto_format_json: bool,
    /// Where `apiscribe.log` goes; defaults to the config directory
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_path: DEFAULT_CHAT_PATH.to_string(),
            proxy_path: DEFAULT_PROXY_PATH.to_string(),
            file_preview_path: DEFAULT_FILE_PREVIEW_PATH.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            auto_format_json: true,
            log_dir: None,
        }
    }
}

impl Config {
    /// `~/.apiscribe`, or `./.apiscribe` without a home directory
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR_NAME)
    }

    /// Load from the default directory and apply the environment override
    pub fn load() -> Result<Config> {
        let mut config = Self::load_from(&Self::config_dir())?;
        config.apply_base_url_override(std::env::var(BASE_URL_ENV).ok());
        Ok(config)
    }

    /// Read `config.yaml` under `dir`; a missing file yields the defaults
    pub fn load_from(dir: &Path) -> Result<Config> {
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn apply_base_url_override(&mut self, value: Option<String>) {
        if let Some(url) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            self.base_url = url;
        }
    }

    pub fn chat_url(&self) -> String {
        join_url(&self.base_url, &self.chat_path)
    }

    pub fn proxy_url(&self) -> String {
        join_url(&self.base_url, &self.proxy_path)
    }

    pub fn file_preview_url(&self) -> String {
        join_url(&self.base_url, &self.file_preview_path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(Self::config_dir)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
