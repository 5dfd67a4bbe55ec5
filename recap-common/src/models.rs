//! Shared models exchanged between the ingest service, its events and the UI

use serde::{Deserialize, Serialize};

/// Community metadata resolved from the remote `about` endpoint
///
/// Once cached for a community it is treated as immutable for the
/// lifetime of the process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityMetadata {
    /// Icon URL without query string
    pub icon: Option<String>,
    /// Display title; absent only on the failure sentinel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Subscriber count as reported by the source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscribers: Option<u64>,
    /// Accent color (e.g. `#0079D3`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl CommunityMetadata {
    /// Sentinel cached after a permanent failure so the community is not
    /// fetched again: `{icon: null}`
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// True for the failure sentinel
    pub fn is_unavailable(&self) -> bool {
        self.icon.is_none() && self.title.is_none()
    }
}

/// One bar of a chart: label plus count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub label: String,
    pub value: usize,
}

impl Bucket {
    pub fn new(label: impl Into<String>, value: usize) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}
