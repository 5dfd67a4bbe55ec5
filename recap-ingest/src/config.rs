//! Runtime settings for recap-ingest
//!
//! Built once at startup from the resolved `TomlConfig` plus CLI
//! overrides; durations are converted here so the services never see
//! raw millisecond counts.

use crate::services::Pacing;
use recap_common::config::{EnrichmentConfig, TomlConfig};
use recap_common::{Result, TimeWindow};
use std::net::SocketAddr;
use std::time::Duration;

/// Pacing, retry and publication settings for the record enricher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEnrichmentSettings {
    pub pacing: Pacing,
    /// Wait after a throttling response before the next attempt
    pub throttle_cooldown: Duration,
    /// Wait after any other failed attempt
    pub failure_cooldown: Duration,
    pub max_attempts: u32,
    /// Publish every N-th post (indices 0, N, 2N, ...)
    pub post_publish_interval: usize,
    pub comment_publish_interval: usize,
}

impl From<&EnrichmentConfig> for RecordEnrichmentSettings {
    fn from(config: &EnrichmentConfig) -> Self {
        Self {
            pacing: Pacing::from_millis(
                config.record_pacing_base_ms,
                config.record_pacing_jitter_ms,
            ),
            throttle_cooldown: Duration::from_millis(config.record_throttle_cooldown_ms),
            failure_cooldown: Duration::from_millis(config.record_failure_cooldown_ms),
            max_attempts: config.max_attempts.max(1),
            post_publish_interval: config.post_publish_interval.max(1),
            comment_publish_interval: config.comment_publish_interval.max(1),
        }
    }
}

impl Default for RecordEnrichmentSettings {
    fn default() -> Self {
        Self::from(&EnrichmentConfig::default())
    }
}

/// Pacing and cooldown for the community enricher's serial queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunityEnrichmentSettings {
    pub pacing: Pacing,
    pub throttle_cooldown: Duration,
}

impl From<&EnrichmentConfig> for CommunityEnrichmentSettings {
    fn from(config: &EnrichmentConfig) -> Self {
        Self {
            pacing: Pacing::from_millis(
                config.community_pacing_base_ms,
                config.community_pacing_jitter_ms,
            ),
            throttle_cooldown: Duration::from_millis(config.community_throttle_cooldown_ms),
        }
    }
}

impl Default for CommunityEnrichmentSettings {
    fn default() -> Self {
        Self::from(&EnrichmentConfig::default())
    }
}

/// Relay endpoint settings (both the served route and its clients)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySettings {
    /// Proxy URL the enrichers call
    pub url: String,
    pub user_agent: String,
    pub allowed_hosts: Vec<String>,
    pub timeout: Duration,
}

impl RelaySettings {
    pub fn is_allowed_host(&self, host: &str) -> bool {
        self.allowed_hosts
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(host))
    }
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub relay: RelaySettings,
    pub source_base_url: String,
    pub window: TimeWindow,
    pub records: RecordEnrichmentSettings,
    pub communities: CommunityEnrichmentSettings,
}

impl IngestConfig {
    /// Resolve runtime settings; fails on an invalid window
    pub fn from_toml(config: &TomlConfig) -> Result<Self> {
        let window = config.window.to_window()?;
        let host = config.server.host.clone();
        let port = config.server.port;

        let relay_url = config
            .relay
            .url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| format!("http://{}/api/proxy", client_authority(&host, port)));

        Ok(Self {
            host,
            port,
            max_upload_bytes: config.server.max_upload_bytes,
            relay: RelaySettings {
                url: relay_url,
                user_agent: config.relay.user_agent.clone(),
                allowed_hosts: config.relay.allowed_hosts.clone(),
                timeout: Duration::from_secs(config.relay.timeout_secs),
            },
            source_base_url: config.source.base_url.clone(),
            window,
            records: RecordEnrichmentSettings::from(&config.enrichment),
            communities: CommunityEnrichmentSettings::from(&config.enrichment),
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| {
                recap_common::Error::Config(format!(
                    "Invalid bind address {}:{}: {}",
                    self.host, self.port, e
                ))
            })
    }
}

/// Address clients use to reach this service; wildcard binds map to
/// loopback
fn client_authority(host: &str, port: u16) -> String {
    match host {
        "0.0.0.0" | "" => format!("127.0.0.1:{}", port),
        "::" => format!("[::1]:{}", port),
        _ if host.contains(':') => format!("[{}]:{}", host, port),
        _ => format!("{}:{}", host, port),
    }
}
