//! Target URL construction for the remote source

/// Builds record and community URLs relative to the source base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUrls {
    base_url: String,
}

impl SourceUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// JSON endpoint for a record permalink
    ///
    /// Trims whitespace, drops one trailing slash, appends `.json` and
    /// prefixes the base URL when the permalink is relative.
    pub fn record_json_url(&self, permalink: &str) -> String {
        let trimmed = permalink.trim();
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            format!("{}.json", trimmed)
        } else if trimmed.starts_with('/') {
            format!("{}{}.json", self.base_url, trimmed)
        } else {
            format!("{}/{}.json", self.base_url, trimmed)
        }
    }

    /// `about.json` endpoint for a community
    pub fn community_about_url(&self, community: &str) -> String {
        format!("{}/r/{}/about.json", self.base_url, community)
    }
}

impl Default for SourceUrls {
    fn default() -> Self {
        Self::new("https://www.reddit.com")
    }
}
