//! Decoding of remote JSON bodies into metrics and community metadata

use crate::models::{RecordKind, RecordMetrics};
use recap_common::CommunityMetadata;
use serde_json::{Map, Value};

/// Metrics decoded from a record body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedMetrics {
    pub metrics: RecordMetrics,
    /// False when the body had an unexpected shape and defaults were used
    pub matched: bool,
}

/// Listing pointer for a record kind
///
/// Post bodies carry the post as the first child of the first listing;
/// comment bodies carry the comment as the first child of the second.
fn listing_item_pointer(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Post => "/0/data/children/0/data",
        RecordKind::Comment => "/1/data/children/0/data",
    }
}

/// Integer field; null, missing or non-numeric becomes 0
fn int_field(item: &Map<String, Value>, key: &str) -> i64 {
    match item.get(key) {
        Some(value) => value
            .as_i64()
            .or_else(|| value.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        None => 0,
    }
}

/// Extract `ups` (and `num_comments` for posts) from a record body
pub fn decode_record_metrics(body: &Value, kind: RecordKind) -> DecodedMetrics {
    let Some(item) = body
        .pointer(listing_item_pointer(kind))
        .and_then(Value::as_object)
    else {
        return DecodedMetrics {
            metrics: RecordMetrics::default(),
            matched: false,
        };
    };

    let comment_count = match kind {
        RecordKind::Post => int_field(item, "num_comments"),
        RecordKind::Comment => 0,
    };

    DecodedMetrics {
        metrics: RecordMetrics {
            upvotes: int_field(item, "ups"),
            comment_count,
        },
        matched: true,
    }
}

fn non_empty_str<'a>(data: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    data.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Extract metadata from a community `about.json` body
///
/// Returns `None` when the body has no `data` object.
pub fn decode_community_metadata(body: &Value, community: &str) -> Option<CommunityMetadata> {
    let data = body.get("data")?.as_object()?;

    let icon = non_empty_str(data, "icon_img")
        .or_else(|| non_empty_str(data, "community_icon"))
        .map(|url| url.split('?').next().unwrap_or(url).to_string())
        .filter(|url| !url.is_empty());

    let title = non_empty_str(data, "title")
        .unwrap_or(community)
        .to_string();

    Some(CommunityMetadata {
        icon,
        title: Some(title),
        subscribers: data.get("subscribers").and_then(Value::as_u64),
        color: non_empty_str(data, "primary_color").map(str::to_string),
    })
}
