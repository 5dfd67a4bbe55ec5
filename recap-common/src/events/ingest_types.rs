//! Ingest and enrichment type definitions
//!
//! Supporting types for progress tracking of archive ingest and record
//! enrichment.

use serde::{Deserialize, Serialize};

/// Snapshot collection touched by a publication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotCollection {
    Posts,
    Comments,
}

impl SnapshotCollection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotCollection::Posts => "posts",
            SnapshotCollection::Comments => "comments",
        }
    }
}

/// Counts reported once an enrichment run ends
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentSummary {
    /// Posts finalised (enriched with data or with defaults)
    pub posts_processed: usize,
    /// Comments finalised (enriched with data or with defaults)
    pub comments_processed: usize,
    /// Records whose metrics came from a successful fetch
    pub fetched: usize,
    /// Successful fetches whose body had an unexpected shape
    pub decode_fallbacks: usize,
    /// Records finalised with zero metrics (retries exhausted or no permalink)
    pub defaulted: usize,
    /// Attempts answered with a throttling status
    pub throttled_attempts: usize,
    /// Attempts that failed for any other reason
    pub failed_attempts: usize,
    /// Run stopped early through its cancellation token
    pub cancelled: bool,
}

impl EnrichmentSummary {
    pub fn records_processed(&self) -> usize {
        self.posts_processed + self.comments_processed
    }
}

/// Per-collection counts of the unenriched snapshot published at ingest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestCounts {
    pub posts: usize,
    pub comments: usize,
    pub post_votes: usize,
    pub comment_votes: usize,
    /// Post and comment rows dropped by the time window
    pub filtered_out: usize,
}
