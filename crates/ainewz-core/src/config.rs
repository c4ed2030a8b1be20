use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::feed::{Source, SourceKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// Feed sources, tried in listed order on every run
    #[serde(default = "default_sources")]
    pub sources: Vec<Source>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            sync: SyncConfig::default(),
            server: ServerConfig::default(),
            sources: default_sources(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Data directory path (holds the cached payload)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Retention horizon in hours; older entries are dropped at parse time
    #[serde(default = "default_window_hours")]
    pub window_hours: i64,
    /// Interval between scheduled runs in seconds (0 = disabled)
    #[serde(default = "default_fetch_interval")]
    pub fetch_interval_secs: u64,
    /// Wall-clock budget for a whole pipeline run in seconds
    #[serde(default = "default_run_timeout")]
    pub run_timeout_secs: u64,
    /// Fixed attempt count for a scheduled run
    #[serde(default = "default_run_attempts")]
    pub run_attempts: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_timeout(),
            window_hours: default_window_hours(),
            fetch_interval_secs: default_fetch_interval(),
            run_timeout_secs: default_run_timeout(),
            run_attempts: default_run_attempts(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the read endpoint
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// max-age advertised in the Cache-Control response header, in seconds
    #[serde(default = "default_cache_max_age")]
    pub cache_max_age_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            cache_max_age_secs: default_cache_max_age(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ainewz")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> u64 {
    15
}

fn default_window_hours() -> i64 {
    48
}

fn default_fetch_interval() -> u64 {
    86400 // daily
}

fn default_run_timeout() -> u64 {
    120
}

fn default_run_attempts() -> u32 {
    3
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_cache_max_age() -> u64 {
    3600
}

fn default_sources() -> Vec<Source> {
    vec![
        Source {
            key: "bens_bites".to_string(),
            label: "Ben's Bites".to_string(),
            kind: SourceKind::Rss,
            urls: vec![
                "https://bensbites.beehiiv.com/feed".to_string(),
                "https://rss.beehiiv.com/feeds/2R3C6Bt5wj.xml".to_string(),
            ],
        },
        Source {
            key: "rundown_ai".to_string(),
            label: "The Rundown AI".to_string(),
            kind: SourceKind::Rss,
            urls: vec![
                "https://rss.beehiiv.com/feeds/2R3C6Bt5wj.xml".to_string(),
                "https://www.therundown.ai/rss".to_string(),
            ],
        },
        Source {
            key: "reddit".to_string(),
            label: "Reddit".to_string(),
            kind: SourceKind::RedditRss,
            urls: vec![
                "https://www.reddit.com/r/artificial/new.rss?limit=50".to_string(),
                "https://www.reddit.com/r/MachineLearning/new.rss?limit=50".to_string(),
            ],
        },
    ]
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &std::path::Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from file or return defaults
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> crate::Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("ainewz")
            .join("config.toml")
    }

    /// Get the data directory (with tilde expansion)
    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.general.data_dir)
    }

    /// Get the cached payload file path
    pub fn payload_path(&self) -> PathBuf {
        self.data_dir().join("latest.json")
    }
}
