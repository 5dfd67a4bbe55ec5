//! Configuration loading and config file resolution
//!
//! Bootstrap configuration comes from a single TOML file. Every section and
//! every field has a compiled default, so a missing file (or a partial one)
//! still yields a complete [`TomlConfig`].
//!
//! Config file resolution order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`RECAP_CONFIG`)
//! 3. Platform config directory (`~/.config/recap/config.toml` on Linux)
//! 4. None: compiled defaults are used

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "RECAP_CONFIG";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file, written in addition to the console (optional)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted archive upload
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// HTTP relay configuration (the `/api/proxy` endpoint and its clients)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Proxy endpoint the enrichers call. Defaults to this service's own
    /// `/api/proxy` route.
    #[serde(default)]
    pub url: Option<String>,
    /// User-Agent sent upstream by the relay
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Hosts the relay is willing to forward to
    #[serde(default = "default_allowed_hosts")]
    pub allowed_hosts: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: None,
            user_agent: default_user_agent(),
            allowed_hosts: default_allowed_hosts(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Remote source addressing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL used to absolutise relative permalinks and to build
    /// community `about.json` URLs
    #[serde(default = "default_source_base_url")]
    pub base_url: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_source_base_url(),
        }
    }
}

/// Inclusive time window applied to posts and comments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_window_start")]
    pub start: String,
    #[serde(default = "default_window_end")]
    pub end: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            start: default_window_start(),
            end: default_window_end(),
        }
    }
}

impl WindowConfig {
    pub fn to_window(&self) -> Result<crate::TimeWindow> {
        crate::TimeWindow::parse(&self.start, &self.end)
    }
}

/// Pacing, cooldown and retry constants for both enrichers (milliseconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    #[serde(default = "default_record_pacing_base_ms")]
    pub record_pacing_base_ms: u64,
    #[serde(default = "default_record_pacing_jitter_ms")]
    pub record_pacing_jitter_ms: u64,
    #[serde(default = "default_record_throttle_cooldown_ms")]
    pub record_throttle_cooldown_ms: u64,
    #[serde(default = "default_record_failure_cooldown_ms")]
    pub record_failure_cooldown_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_post_publish_interval")]
    pub post_publish_interval: usize,
    #[serde(default = "default_comment_publish_interval")]
    pub comment_publish_interval: usize,
    #[serde(default = "default_community_pacing_base_ms")]
    pub community_pacing_base_ms: u64,
    #[serde(default = "default_community_pacing_jitter_ms")]
    pub community_pacing_jitter_ms: u64,
    #[serde(default = "default_community_throttle_cooldown_ms")]
    pub community_throttle_cooldown_ms: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            record_pacing_base_ms: default_record_pacing_base_ms(),
            record_pacing_jitter_ms: default_record_pacing_jitter_ms(),
            record_throttle_cooldown_ms: default_record_throttle_cooldown_ms(),
            record_failure_cooldown_ms: default_record_failure_cooldown_ms(),
            max_attempts: default_max_attempts(),
            post_publish_interval: default_post_publish_interval(),
            comment_publish_interval: default_comment_publish_interval(),
            community_pacing_base_ms: default_community_pacing_base_ms(),
            community_pacing_jitter_ms: default_community_pacing_jitter_ms(),
            community_throttle_cooldown_ms: default_community_throttle_cooldown_ms(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5780
}

fn default_max_upload_bytes() -> usize {
    256 * 1024 * 1024
}

fn default_user_agent() -> String {
    format!("Mozilla/5.0 (compatible; recap/{})", env!("CARGO_PKG_VERSION"))
}

fn default_allowed_hosts() -> Vec<String> {
    vec![
        "www.reddit.com".to_string(),
        "reddit.com".to_string(),
        "old.reddit.com".to_string(),
    ]
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_source_base_url() -> String {
    "https://www.reddit.com".to_string()
}

fn default_window_start() -> String {
    "2025-01-01T00:00:00Z".to_string()
}

fn default_window_end() -> String {
    "2025-12-31T23:59:59Z".to_string()
}

fn default_record_pacing_base_ms() -> u64 {
    500
}

fn default_record_pacing_jitter_ms() -> u64 {
    500
}

fn default_record_throttle_cooldown_ms() -> u64 {
    10_000
}

fn default_record_failure_cooldown_ms() -> u64 {
    2_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_post_publish_interval() -> usize {
    3
}

fn default_comment_publish_interval() -> usize {
    5
}

fn default_community_pacing_base_ms() -> u64 {
    800
}

fn default_community_pacing_jitter_ms() -> u64 {
    400
}

fn default_community_throttle_cooldown_ms() -> u64 {
    5_000
}

/// Resolves which config file (if any) to load
pub struct ConfigResolver {
    app_name: String,
}

impl ConfigResolver {
    pub fn new(app_name: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
        }
    }

    /// Resolve the config file path following the documented priority.
    ///
    /// CLI and environment paths are returned even when the file does not
    /// exist; [`load_or_default`] warns about them. The platform default is
    /// only returned when the file exists.
    pub fn resolve(&self, cli_arg: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = cli_arg {
            return Some(path.to_path_buf());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        self.default_config_path().filter(|path| path.exists())
    }

    /// Platform config file location, e.g. `~/.config/recap/config.toml`
    pub fn default_config_path(&self) -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(&self.app_name).join("config.toml"))
    }

    /// Load the resolved config file, falling back to compiled defaults
    ///
    /// A missing file is logged and ignored. A file that exists but cannot
    /// be read or parsed is an error.
    pub fn load_or_default(&self, cli_arg: Option<&Path>) -> Result<TomlConfig> {
        match self.resolve(cli_arg) {
            Some(path) if path.exists() => {
                let config = load_toml_config(&path)?;
                info!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using compiled defaults",
                    path.display()
                );
                Ok(TomlConfig::default())
            }
            None => {
                info!("No config file found, using compiled defaults");
                Ok(TomlConfig::default())
            }
        }
    }
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Write a config file atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, content)?;
    std::fs::rename(&temp_path, path)?;
    Ok(())
}
