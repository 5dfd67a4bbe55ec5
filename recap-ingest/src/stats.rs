//! Chart aggregation over enriched (or raw) records
//!
//! Pure functions, no I/O: they read whatever snapshot the caller hands
//! them.

use crate::models::{community_from_permalink, CommunityItem, Timestamped, VoteDirection};
use recap_common::time::{month_index, MONTH_LABELS};
use recap_common::Bucket;
use std::collections::BTreeMap;

/// Label of the long-tail rollup bucket
pub const OTHER_LABEL: &str = "Other";
/// Label for items whose community cannot be determined
pub const UNKNOWN_LABEL: &str = "Unknown";
/// Communities with fewer items than this are merged into "Other"
pub const DEFAULT_MIN_COUNT: usize = 3;

/// Count items per calendar month across all sequences
///
/// Always returns twelve buckets, January first, including for empty input.
/// Items without a timestamp are skipped.
pub fn monthly_buckets<T: Timestamped>(sequences: &[&[T]]) -> Vec<Bucket> {
    let mut counts = [0usize; 12];

    for item in sequences.iter().flat_map(|sequence| sequence.iter()) {
        if let Some(timestamp) = item.timestamp() {
            counts[month_index(&timestamp)] += 1;
        }
    }

    MONTH_LABELS
        .iter()
        .zip(counts)
        .map(|(label, value)| Bucket::new(*label, value))
        .collect()
}

/// Community an item is tallied under
pub fn resolve_community<T: CommunityItem + ?Sized>(item: &T) -> String {
    item.community_field()
        .or_else(|| item.permalink().and_then(community_from_permalink))
        .unwrap_or(UNKNOWN_LABEL)
        .to_string()
}

/// Count items per community, descending, with a long-tail "Other" bucket
///
/// Votes whose direction is anything but up are excluded. Communities with
/// fewer than `min_count` items are merged into a single "Other" bucket
/// appended last. Equal counts are ordered by label.
pub fn community_buckets<T: CommunityItem>(sequences: &[&[T]], min_count: usize) -> Vec<Bucket> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();

    for item in sequences.iter().flat_map(|sequence| sequence.iter()) {
        if matches!(item.direction(), Some(direction) if direction != VoteDirection::Up) {
            continue;
        }
        *counts.entry(resolve_community(item)).or_insert(0) += 1;
    }

    let mut buckets = Vec::new();
    let mut other_count = 0;

    for (community, count) in counts {
        if count < min_count {
            other_count += count;
        } else {
            buckets.push(Bucket::new(community, count));
        }
    }

    // Stable sort keeps the label order among ties
    buckets.sort_by(|a, b| b.value.cmp(&a.value));

    if other_count > 0 {
        buckets.push(Bucket::new(OTHER_LABEL, other_count));
    }

    buckets
}
