//! Time window filtering of posts and comments
//!
//! Rows without a parseable timestamp are dropped silently: export tables
//! mix in metadata rows that carry no date. Vote tables are never
//! filtered since votes are not timestamped.

use crate::archive::ExportTables;
use crate::models::{FilteredExport, Record, RecordKind, Timestamped, VoteEntry};
use recap_common::TimeWindow;
use tracing::info;

/// Keep rows whose timestamp lies in `[window.start, window.end]`
///
/// Order is preserved. Filtering an already filtered sequence with the same
/// window returns it unchanged.
pub fn filter_window<T>(rows: &[T], window: &TimeWindow) -> Vec<T>
where
    T: Timestamped + Clone,
{
    rows.iter()
        .filter(|row| {
            row.timestamp()
                .map(|timestamp| window.contains(&timestamp))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

/// Applies one time window to a whole export
#[derive(Debug, Clone, Copy)]
pub struct TimeWindowFilter {
    window: TimeWindow,
}

impl TimeWindowFilter {
    pub fn new(window: TimeWindow) -> Self {
        Self { window }
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    pub fn filter<T: Timestamped + Clone>(&self, rows: &[T]) -> Vec<T> {
        filter_window(rows, &self.window)
    }

    /// Filter posts and comments, pass votes through, and build the
    /// unenriched records
    ///
    /// Returns the filtered export and the number of post/comment rows
    /// dropped.
    pub fn apply(&self, tables: &ExportTables) -> (FilteredExport, usize) {
        let posts: Vec<Record> = self
            .filter(&tables.posts)
            .iter()
            .map(|row| Record::from_row(RecordKind::Post, row))
            .collect();
        let comments: Vec<Record> = self
            .filter(&tables.comments)
            .iter()
            .map(|row| Record::from_row(RecordKind::Comment, row))
            .collect();

        let filtered_out =
            (tables.posts.len() - posts.len()) + (tables.comments.len() - comments.len());

        info!(
            posts_before = tables.posts.len(),
            posts_after = posts.len(),
            comments_before = tables.comments.len(),
            comments_after = comments.len(),
            window_start = %self.window.start,
            window_end = %self.window.end,
            "Applied time window"
        );

        let export = FilteredExport {
            posts,
            comments,
            post_votes: tables.post_votes.iter().map(VoteEntry::from_row).collect(),
            comment_votes: tables.comment_votes.iter().map(VoteEntry::from_row).collect(),
        };

        (export, filtered_out)
    }
}
