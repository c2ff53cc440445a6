use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use tracing::trace;

use crate::monitor::{DEFAULT_ALERT_TEMPLATE, MonitorSettings};

/// Smallest accepted cycle interval in seconds
pub const MIN_INTERVAL_SECS: u64 = 60;

/// Storage backend configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (no persistence)
    #[serde(rename = "none")]
    None,

    /// SQLite database
    Sqlite {
        #[serde(default = "default_sqlite_path")]
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Sqlite {
            path: default_sqlite_path(),
        }
    }
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./status.db")
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub discord: DiscordConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP command surface, disabled when absent
    pub api: Option<ApiConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    /// Bot token, usually supplied through `DISCORD_TOKEN` instead
    pub token: Option<String>,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Post a line to the alert channel when a server comes back
    #[serde(default)]
    pub announce_recovery: bool,

    /// Seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base: default_api_base(),
            announce_recovery: false,
            request_timeout: default_request_timeout(),
        }
    }
}

fn default_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between cycles
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// Seconds
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout: u64,

    #[serde(default = "default_max_concurrent_probes")]
    pub max_concurrent_probes: usize,

    /// Template used until one is set through a command
    #[serde(default = "default_alert_template")]
    pub alert_template: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            probe_timeout: default_probe_timeout(),
            max_concurrent_probes: default_max_concurrent_probes(),
            alert_template: default_alert_template(),
        }
    }
}

fn default_interval() -> u64 {
    600
}

fn default_probe_timeout() -> u64 {
    5
}

fn default_max_concurrent_probes() -> usize {
    8
}

fn default_alert_template() -> String {
    DEFAULT_ALERT_TEMPLATE.to_string()
}

impl MonitorConfig {
    /// Scheduler settings, with the interval clamped to [`MIN_INTERVAL_SECS`]
    pub fn settings(&self) -> MonitorSettings {
        MonitorSettings {
            interval: Duration::from_secs(self.interval.max(MIN_INTERVAL_SECS)),
            probe_timeout: Duration::from_secs(self.probe_timeout.max(1)),
            max_concurrent_probes: self.max_concurrent_probes.max(1),
            alert_template: match self.alert_template.trim() {
                "" => DEFAULT_ALERT_TEMPLATE.to_string(),
                template => template.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    /// Bearer token, usually supplied through `STATUS_API_TOKEN` instead
    pub token: Option<String>,

    /// Allow any origin
    #[serde(default)]
    pub cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            token: None,
            cors: false,
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    parse_config(&file_content)
}

pub fn parse_config(content: &str) -> anyhow::Result<Config> {
    serde_json::from_str(content)
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided! ({e})"))
        .inspect(|config: &Config| trace!("loaded config: {config:?}"))
}
