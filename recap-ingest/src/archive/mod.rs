//! Export archive reading
//!
//! An export is a zip container holding (at least) four named tables:
//! `posts.csv`, `comments.csv`, `post_votes.csv` and `comment_votes.csv`.
//! Tables are matched by base name anywhere in the container; other
//! entries are ignored and missing tables read as empty.

mod table;

pub use table::parse_table;

use crate::models::CsvRow;
use std::io::{Cursor, Read};
use thiserror::Error;
use tracing::{debug, info};

/// Archive-level failures. These abort an ingest and are reported to the
/// user; nothing is published when one occurs.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Archive is not a readable zip container: {0}")]
    Corrupt(String),

    #[error("Failed to read archive entry {name}: {message}")]
    UnreadableEntry { name: String, message: String },

    #[error("Malformed table {name}: {message}")]
    MalformedTable { name: String, message: String },

    #[error("No posts or comments found inside the selected time window")]
    EmptyWindow,
}

/// Named tables recognised inside an export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTable {
    Posts,
    Comments,
    PostVotes,
    CommentVotes,
}

impl ExportTable {
    pub const ALL: [ExportTable; 4] = [
        ExportTable::Posts,
        ExportTable::Comments,
        ExportTable::PostVotes,
        ExportTable::CommentVotes,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            ExportTable::Posts => "posts.csv",
            ExportTable::Comments => "comments.csv",
            ExportTable::PostVotes => "post_votes.csv",
            ExportTable::CommentVotes => "comment_votes.csv",
        }
    }

    /// Match an archive entry by its base name
    pub fn from_entry_name(entry_name: &str) -> Option<Self> {
        let base_name = entry_name.rsplit(['/', '\\']).next().unwrap_or(entry_name);
        Self::ALL
            .into_iter()
            .find(|table| table.file_name() == base_name)
    }
}

/// Raw rows of the four export tables, unfiltered
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportTables {
    pub posts: Vec<CsvRow>,
    pub comments: Vec<CsvRow>,
    pub post_votes: Vec<CsvRow>,
    pub comment_votes: Vec<CsvRow>,
}

impl ExportTables {
    fn slot(&mut self, table: ExportTable) -> &mut Vec<CsvRow> {
        match table {
            ExportTable::Posts => &mut self.posts,
            ExportTable::Comments => &mut self.comments,
            ExportTable::PostVotes => &mut self.post_votes,
            ExportTable::CommentVotes => &mut self.comment_votes,
        }
    }
}

/// Read the four export tables out of a zip archive held in memory
///
/// CPU-bound (decompression and parsing); async callers should run it on a
/// blocking thread.
pub fn read_export(bytes: &[u8]) -> Result<ExportTables, ArchiveError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ArchiveError::Corrupt(e.to_string()))?;

    let mut tables = ExportTables::default();

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| ArchiveError::Corrupt(e.to_string()))?;

        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_string();
        let Some(table) = ExportTable::from_entry_name(&name) else {
            debug!(entry = %name, "Skipping unrecognised archive entry");
            continue;
        };

        let mut raw = Vec::new();
        entry
            .read_to_end(&mut raw)
            .map_err(|e| ArchiveError::UnreadableEntry {
                name: name.clone(),
                message: e.to_string(),
            })?;

        let text = String::from_utf8_lossy(&raw);
        let rows = parse_table(&text).map_err(|e| ArchiveError::MalformedTable {
            name: name.clone(),
            message: e.to_string(),
        })?;

        info!(entry = %name, rows = rows.len(), "Read export table");
        *tables.slot(table) = rows;
    }

    Ok(tables)
}

/// Account name from the conventional export file name
/// `export_<user>_<YYYYMMDD>.zip`
pub fn user_from_archive_name(archive_name: &str) -> Option<String> {
    let base_name = archive_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(archive_name);
    let stem = base_name.strip_suffix(".zip")?;
    let rest = stem.strip_prefix("export_")?;
    let (user, date) = rest.rsplit_once('_')?;

    let is_date = date.len() == 8 && date.chars().all(|c| c.is_ascii_digit());
    if is_date && !user.is_empty() {
        Some(user.to_string())
    } else {
        None
    }
}
