use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Semaphore;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub download: DownloadConfig,
    pub lrclib: LrcLibConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// `json` or `pretty`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DownloadConfig {
    pub downloader: String,
    pub max_concurrent: usize,
    pub timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            downloader: "lrclib".to_string(),
            max_concurrent: 2,
            timeout_secs: 30,
        }
    }
}

impl DownloadConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LrcLibConfig {
    pub base_url: String,
    pub user_agent: String,
}

impl Default for LrcLibConfig {
    fn default() -> Self {
        Self {
            base_url: "https://lrclib.net".to_string(),
            user_agent: format!("lyricgrab/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.download.max_concurrent == 0 {
            bail!("download.max_concurrent must be at least 1");
        }
        if self.download.max_concurrent > Semaphore::MAX_PERMITS {
            bail!(
                "download.max_concurrent must be at most {}",
                Semaphore::MAX_PERMITS
            );
        }
        if self.download.timeout_secs == 0 {
            bail!("download.timeout_secs must be at least 1");
        }
        if self.download.downloader.trim().is_empty() {
            bail!("download.downloader must name a downloader");
        }
        url::Url::parse(&self.lrclib.base_url)
            .with_context(|| format!("Invalid lrclib.base_url: {}", self.lrclib.base_url))?;
        Ok(())
    }

    pub fn get_logging_format(&self) -> &str {
        &self.logging.format
    }
}

/// Resolves the config file: explicit path, then `LYRICGRAB_CONFIG`, then
/// the XDG and home config directories.
pub fn get_config_path(explicit: Option<&str>) -> Option<String> {
    if let Some(path) = explicit {
        return Some(path.to_string());
    }

    if let Ok(path) = std::env::var("LYRICGRAB_CONFIG") {
        return Some(path);
    }

    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        let config_path = format!("{}/lyricgrab/config.toml", xdg_config_home);
        if std::path::Path::new(&config_path).exists() {
            return Some(config_path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let config_path = format!("{}/.config/lyricgrab/config.toml", home.display());
        if std::path::Path::new(&config_path).exists() {
            return Some(config_path);
        }
    }

    None
}
