//! Test Helper Utilities
//!
//! Shared utilities for testing recap-ingest: export archive builders, a
//! scripted relay fetcher and fast service settings.

#![allow(dead_code)]

pub mod export_builder;
pub mod scripted_fetcher;

pub use export_builder::ExportBuilder;
pub use scripted_fetcher::{FetchCall, ScriptedFetcher};

use recap_common::config::TomlConfig;
use recap_ingest::config::{
    CommunityEnrichmentSettings, IngestConfig, RecordEnrichmentSettings,
};
use recap_ingest::services::Pacing;
use serde_json::{json, Value};
use std::time::Duration;

pub const SOURCE_BASE: &str = "https://www.reddit.com";

/// Permalink of a generated post
pub fn post_permalink(community: &str, id: &str) -> String {
    format!("/r/{}/comments/{}/title/", community, id)
}

/// Permalink of a generated comment
pub fn comment_permalink(community: &str, id: &str) -> String {
    format!("/r/{}/comments/p_{}/title/{}/", community, id, id)
}

/// URL the record enricher fetches for `permalink`
pub fn record_url(permalink: &str) -> String {
    format!(
        "{}{}.json",
        SOURCE_BASE,
        permalink.trim().trim_end_matches('/')
    )
}

pub fn community_url(community: &str) -> String {
    format!("{}/r/{}/about.json", SOURCE_BASE, community)
}

fn listing(data: Value) -> Value {
    json!({ "kind": "Listing", "data": { "children": [ { "kind": "t3", "data": data } ] } })
}

/// Body of a post `.json` response
pub fn post_body(ups: i64, num_comments: i64) -> Value {
    json!([listing(json!({ "ups": ups, "num_comments": num_comments })), listing(json!({}))])
}

/// Body of a comment `.json` response
pub fn comment_body(ups: i64) -> Value {
    json!([listing(json!({ "ups": 1000, "num_comments": 50 })), listing(json!({ "ups": ups }))])
}

/// Body of a community `about.json` response
pub fn community_body(title: &str) -> Value {
    json!({ "kind": "t5", "data": {
        "title": title,
        "icon_img": format!("https://img.test/{}.png?size=256", title),
        "subscribers": 1234,
        "primary_color": "#ff4500"
    }})
}

/// Record settings with the production constants
pub fn default_record_settings() -> RecordEnrichmentSettings {
    RecordEnrichmentSettings::default()
}

/// Record settings without pacing and with short cooldowns
pub fn fast_record_settings() -> RecordEnrichmentSettings {
    RecordEnrichmentSettings {
        pacing: Pacing::none(),
        throttle_cooldown: Duration::from_millis(10),
        failure_cooldown: Duration::from_millis(5),
        ..RecordEnrichmentSettings::default()
    }
}

pub fn fast_community_settings() -> CommunityEnrichmentSettings {
    CommunityEnrichmentSettings {
        pacing: Pacing::none(),
        throttle_cooldown: Duration::from_millis(10),
    }
}

/// Service config for router tests: default window (2025), no pacing,
/// loopback allowed through the relay
pub fn test_config() -> IngestConfig {
    let mut toml = TomlConfig::default();
    toml.relay.allowed_hosts.push("127.0.0.1".to_string());

    let mut config = IngestConfig::from_toml(&toml).unwrap();
    config.records = fast_record_settings();
    config.communities = fast_community_settings();
    config
}
