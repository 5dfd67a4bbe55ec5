//! In-memory export archive builder

use super::{comment_permalink, post_permalink};
use std::io::{Cursor, Write};
use zip::write::FileOptions;

const POST_HEADERS: [&str; 7] = ["id", "permalink", "date", "ip", "subreddit", "title", "body"];
const COMMENT_HEADERS: [&str; 7] = ["id", "permalink", "date", "ip", "subreddit", "parent", "body"];
const VOTE_HEADERS: [&str; 3] = ["id", "permalink", "direction"];

/// Builds a zip export with the four standard tables
#[derive(Default)]
pub struct ExportBuilder {
    posts: Vec<Vec<String>>,
    comments: Vec<Vec<String>>,
    post_votes: Vec<Vec<String>>,
    comment_votes: Vec<Vec<String>>,
    extra_entries: Vec<(String, String)>,
    folder: Option<String>,
}

impl ExportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post dated `date` (`YYYY-MM-DD HH:MM:SS UTC` or any accepted form)
    pub fn post(mut self, id: &str, community: &str, date: &str) -> Self {
        self.posts.push(vec![
            id.to_string(),
            post_permalink(community, id),
            date.to_string(),
            String::new(),
            community.to_string(),
            format!("Post {}", id),
            "hello, world".to_string(),
        ]);
        self
    }

    /// Post row without a permalink
    pub fn post_without_permalink(mut self, id: &str, community: &str, date: &str) -> Self {
        self.posts.push(vec![
            id.to_string(),
            String::new(),
            date.to_string(),
            String::new(),
            community.to_string(),
            format!("Post {}", id),
            String::new(),
        ]);
        self
    }

    pub fn comment(mut self, id: &str, community: &str, date: &str) -> Self {
        self.comments.push(vec![
            id.to_string(),
            comment_permalink(community, id),
            date.to_string(),
            String::new(),
            community.to_string(),
            format!("t3_{}", id),
            "a \"quoted\" reply".to_string(),
        ]);
        self
    }

    pub fn post_vote(mut self, id: &str, community: &str, direction: &str) -> Self {
        self.post_votes.push(vec![
            id.to_string(),
            post_permalink(community, id),
            direction.to_string(),
        ]);
        self
    }

    pub fn comment_vote(mut self, id: &str, community: &str, direction: &str) -> Self {
        self.comment_votes.push(vec![
            id.to_string(),
            comment_permalink(community, id),
            direction.to_string(),
        ]);
        self
    }

    /// Unrelated entry stored next to the tables
    pub fn extra_entry(mut self, name: &str, content: &str) -> Self {
        self.extra_entries.push((name.to_string(), content.to_string()));
        self
    }

    /// Store the tables under a folder inside the container
    pub fn in_folder(mut self, folder: &str) -> Self {
        self.folder = Some(folder.to_string());
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let prefix = self
            .folder
            .as_deref()
            .map(|folder| format!("{}/", folder))
            .unwrap_or_default();

        let tables = [
            ("posts.csv", &POST_HEADERS[..], &self.posts),
            ("comments.csv", &COMMENT_HEADERS[..], &self.comments),
            ("post_votes.csv", &VOTE_HEADERS[..], &self.post_votes),
            ("comment_votes.csv", &VOTE_HEADERS[..], &self.comment_votes),
        ];

        for (name, headers, rows) in tables {
            writer
                .start_file(format!("{}{}", prefix, name), FileOptions::default())
                .unwrap();
            writer.write_all(&to_csv(headers, rows)).unwrap();
        }

        for (name, content) in &self.extra_entries {
            writer.start_file(name.as_str(), FileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }

        writer.finish().unwrap().into_inner()
    }
}

fn to_csv(headers: &[&str], rows: &[Vec<String>]) -> Vec<u8> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers).unwrap();
    for row in rows {
        writer.write_record(row).unwrap();
    }
    writer.into_inner().unwrap()
}
