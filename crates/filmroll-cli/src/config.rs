//! Configuration loading from TOML files

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use filmroll_core::DEFAULT_USER_AGENT;
use filmroll_letterboxd::Strategy;
use filmroll_store::FailurePolicy;
use serde::Deserialize;

/// Global configuration for filmroll
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub posters: PosterConfig,
    pub output: OutputConfig,
    pub http: HttpConfig,
}

/// Where the film list comes from
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub username: String,
    pub base_url: String,
    /// Runaway-loop guard for pagination
    pub max_pages: u32,
    /// Pause between list pages
    pub page_delay_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            username: "icepuma".to_string(),
            base_url: "https://letterboxd.com".to_string(),
            max_pages: 20,
            page_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PosterConfig {
    pub strategy: Strategy,
    pub on_failure: FailurePolicy,
    /// Pause applied every few films once downloads have started
    pub download_delay_ms: u64,
}

impl Default for PosterConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Markup,
            on_failure: FailurePolicy::FailFast,
            download_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// One `<slug>.json` + `<slug>.<ext>` per film
    pub content_dir: PathBuf,
    pub snapshot_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("src/content/movies"),
            snapshot_path: PathBuf::from("src/data/movies.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./filmroll.toml (current directory)
    /// 2. ~/.config/filmroll/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("filmroll.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "filmroll") {
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
}
