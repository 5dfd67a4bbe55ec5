//! Record store content and the filtered export handed to the enricher

use super::record::{Record, VoteEntry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Current published state of an ingested export
///
/// Every collection sits behind its own `Arc`, and publications replace a
/// collection wholesale. A reader holding a snapshot sees complete
/// sequences only; `posts` and `comments` may belong to different
/// publications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub posts: Arc<Vec<Record>>,
    pub comments: Arc<Vec<Record>>,
    pub post_votes: Arc<Vec<VoteEntry>>,
    pub comment_votes: Arc<Vec<VoteEntry>>,
    pub user: Option<String>,
}

impl Snapshot {
    /// Copy of this snapshot with `posts` replaced
    pub fn with_posts(&self, posts: Vec<Record>) -> Self {
        Self {
            posts: Arc::new(posts),
            ..self.clone()
        }
    }

    /// Copy of this snapshot with `comments` replaced
    pub fn with_comments(&self, comments: Vec<Record>) -> Self {
        Self {
            comments: Arc::new(comments),
            ..self.clone()
        }
    }

    /// `(enriched, total)` over posts and comments
    pub fn enrichment_progress(&self) -> (usize, usize) {
        let enriched = self
            .posts
            .iter()
            .chain(self.comments.iter())
            .filter(|record| record.enriched)
            .count();
        (enriched, self.posts.len() + self.comments.len())
    }
}

/// Export tables after the time window was applied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredExport {
    pub posts: Vec<Record>,
    pub comments: Vec<Record>,
    pub post_votes: Vec<VoteEntry>,
    pub comment_votes: Vec<VoteEntry>,
}

impl FilteredExport {
    /// Unenriched snapshot published at ingest
    pub fn to_snapshot(&self, user: Option<String>) -> Snapshot {
        Snapshot {
            posts: Arc::new(self.posts.clone()),
            comments: Arc::new(self.comments.clone()),
            post_votes: Arc::new(self.post_votes.clone()),
            comment_votes: Arc::new(self.comment_votes.clone()),
            user,
        }
    }

    pub fn has_activity(&self) -> bool {
        !self.posts.is_empty() || !self.comments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CsvRow, RecordKind, RecordMetrics};

    fn record(id: &str) -> Record {
        Record::from_row(RecordKind::Post, &CsvRow::from_pairs([("id", id)]))
    }

    #[test]
    fn test_with_posts_replaces_only_posts() {
        let base = FilteredExport {
            posts: vec![record("a")],
            comments: vec![record("c")],
            ..Default::default()
        }
        .to_snapshot(Some("someone".to_string()));

        let updated = base.with_posts(vec![record("a").with_metrics(RecordMetrics::default())]);

        assert!(Arc::ptr_eq(&base.comments, &updated.comments));
        assert!(!Arc::ptr_eq(&base.posts, &updated.posts));
        assert!(!base.posts[0].enriched);
        assert!(updated.posts[0].enriched);
        assert_eq!(updated.user.as_deref(), Some("someone"));
    }

    #[test]
    fn test_enrichment_progress_counts_both_collections() {
        let snapshot = Snapshot {
            posts: Arc::new(vec![record("a").with_metrics(RecordMetrics::default()), record("b")]),
            comments: Arc::new(vec![record("c")]),
            ..Default::default()
        };
        assert_eq!(snapshot.enrichment_progress(), (1, 3));
    }
}
