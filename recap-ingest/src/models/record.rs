//! Records (posts and comments), vote entries and raw table rows

use chrono::{DateTime, Utc};
use recap_common::time::parse_export_timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Columns consumed into typed record fields; everything else stays in
/// `columns`
const RECORD_COLUMNS: [&str; 4] = ["id", "permalink", "date", "subreddit"];
const VOTE_COLUMNS: [&str; 4] = ["id", "permalink", "subreddit", "direction"];

/// One row of an export table, keyed by header name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvRow(BTreeMap<String, String>);

impl CsvRow {
    pub fn new(fields: BTreeMap<String, String>) -> Self {
        Self(fields)
    }

    /// Build a row from `(header, value)` pairs
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Non-empty, trimmed value of a column
    pub fn get(&self, column: &str) -> Option<&str> {
        self.0
            .get(column)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Columns not listed in `consumed`
    fn remaining_columns(&self, consumed: &[&str]) -> BTreeMap<String, String> {
        self.0
            .iter()
            .filter(|(key, _)| !consumed.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// Anything carrying an optional timestamp
pub trait Timestamped {
    fn timestamp(&self) -> Option<DateTime<Utc>>;
}

impl Timestamped for CsvRow {
    /// Parsed `date` column; missing or unparseable dates yield `None`
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.get("date").and_then(parse_export_timestamp)
    }
}

/// Post or comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Post,
    Comment,
}

/// Live engagement metrics fetched for one record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetrics {
    pub upvotes: i64,
    /// Reply count; only tracked for posts
    pub comment_count: i64,
}

/// A post or comment from the export, plus its live metrics
///
/// `enriched` is true once the metric fields have been populated, either
/// from a successful fetch or with the zero fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub kind: RecordKind,
    pub id: String,
    /// URL-shaped source key, also the fetch target
    pub permalink: String,
    pub date: Option<DateTime<Utc>>,
    pub subreddit: Option<String>,
    pub upvotes: i64,
    /// Posts only; `None` for comments and for unenriched posts
    pub comment_count: Option<i64>,
    pub enriched: bool,
    /// Remaining export columns (title, body, url, ...)
    #[serde(default)]
    pub columns: BTreeMap<String, String>,
}

impl Record {
    /// Unenriched record built from an export row
    pub fn from_row(kind: RecordKind, row: &CsvRow) -> Self {
        Self {
            kind,
            id: row.get("id").unwrap_or_default().to_string(),
            permalink: row.get("permalink").unwrap_or_default().to_string(),
            date: row.timestamp(),
            subreddit: row.get("subreddit").map(str::to_string),
            upvotes: 0,
            comment_count: None,
            enriched: false,
            columns: row.remaining_columns(&RECORD_COLUMNS),
        }
    }

    /// Copy of this record carrying `metrics`, marked enriched
    pub fn with_metrics(&self, metrics: RecordMetrics) -> Self {
        Self {
            upvotes: metrics.upvotes,
            comment_count: match self.kind {
                RecordKind::Post => Some(metrics.comment_count),
                RecordKind::Comment => None,
            },
            enriched: true,
            ..self.clone()
        }
    }

    /// Explicit `subreddit` column, else the segment after `/r/` in the
    /// permalink
    pub fn community(&self) -> Option<&str> {
        self.subreddit
            .as_deref()
            .or_else(|| community_from_permalink(&self.permalink))
    }
}

impl Timestamped for Record {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.date
    }
}

/// Direction of a vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
    /// `none` or any other value the export uses for a withdrawn vote
    Neutral,
}

impl VoteDirection {
    /// Parse a `direction` column; empty text is no direction at all
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" => None,
            "up" => Some(VoteDirection::Up),
            "down" => Some(VoteDirection::Down),
            _ => Some(VoteDirection::Neutral),
        }
    }
}

/// One vote from `post_votes.csv` or `comment_votes.csv`
///
/// Votes carry no timestamp and are never filtered or enriched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteEntry {
    pub id: String,
    pub permalink: Option<String>,
    pub subreddit: Option<String>,
    pub direction: Option<VoteDirection>,
    #[serde(default)]
    pub columns: BTreeMap<String, String>,
}

impl VoteEntry {
    pub fn from_row(row: &CsvRow) -> Self {
        Self {
            id: row.get("id").unwrap_or_default().to_string(),
            permalink: row.get("permalink").map(str::to_string),
            subreddit: row.get("subreddit").map(str::to_string),
            direction: row.get("direction").and_then(VoteDirection::parse),
            columns: row.remaining_columns(&VOTE_COLUMNS),
        }
    }
}

/// Anything that can be tallied per community
pub trait CommunityItem {
    /// Explicit community column
    fn community_field(&self) -> Option<&str>;
    /// Permalink to derive the community from
    fn permalink(&self) -> Option<&str>;
    /// Vote direction, if the item is a vote
    fn direction(&self) -> Option<VoteDirection> {
        None
    }
}

impl CommunityItem for Record {
    fn community_field(&self) -> Option<&str> {
        self.subreddit.as_deref().filter(|s| !s.is_empty())
    }

    fn permalink(&self) -> Option<&str> {
        Some(self.permalink.as_str()).filter(|p| !p.is_empty())
    }
}

impl CommunityItem for VoteEntry {
    fn community_field(&self) -> Option<&str> {
        self.subreddit.as_deref().filter(|s| !s.is_empty())
    }

    fn permalink(&self) -> Option<&str> {
        self.permalink.as_deref().filter(|p| !p.is_empty())
    }

    fn direction(&self) -> Option<VoteDirection> {
        self.direction
    }
}

/// First path segment after `/r/`, e.g.
/// `https://www.reddit.com/r/rust/comments/abc/` → `rust`
pub fn community_from_permalink(permalink: &str) -> Option<&str> {
    let (_, rest) = permalink.split_once("/r/")?;
    let segment = rest.split(['/', '?', '#']).next()?;
    Some(segment).filter(|s| !s.is_empty())
}
