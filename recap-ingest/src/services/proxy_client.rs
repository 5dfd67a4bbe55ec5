//! Relay-proxy HTTP client
//!
//! Every outbound request is routed through a relay endpoint as
//! `GET {relay}?url=<percent-encoded target>`; the relay forwards the
//! upstream status and body unchanged.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Fetch failure classes the enrichers react to differently
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Upstream signalled rate limiting (HTTP 429 or 403)
    #[error("Throttled by upstream (HTTP {status})")]
    Throttled { status: u16 },

    /// Any other non-success status
    #[error("Upstream returned HTTP {status}")]
    Status { status: u16 },

    /// Connection, timeout or body read failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Success status but the body is not JSON
    #[error("Response body is not JSON: {0}")]
    Decode(String),
}

impl FetchError {
    /// Classify a non-success status
    pub fn from_status(status: u16) -> Self {
        match status {
            429 | 403 => FetchError::Throttled { status },
            _ => FetchError::Status { status },
        }
    }

    pub fn is_throttled(&self) -> bool {
        matches!(self, FetchError::Throttled { .. })
    }
}

/// Fetches a target URL through the relay and decodes the JSON body
#[async_trait]
pub trait ProxyFetcher: Send + Sync {
    async fn fetch_json(&self, target_url: &str) -> Result<serde_json::Value, FetchError>;
}

/// reqwest-backed relay client
pub struct HttpProxyClient {
    http_client: reqwest::Client,
    relay_url: reqwest::Url,
}

impl HttpProxyClient {
    pub fn new(relay_url: &str, timeout: Duration) -> recap_common::Result<Self> {
        let relay_url = reqwest::Url::parse(relay_url).map_err(|e| {
            recap_common::Error::Config(format!("Invalid relay URL '{}': {}", relay_url, e))
        })?;

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| recap_common::Error::Internal(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            relay_url,
        })
    }

    /// Relay URL carrying `target_url` as its `url` query parameter
    pub fn proxied_url(&self, target_url: &str) -> reqwest::Url {
        let mut url = self.relay_url.clone();
        url.query_pairs_mut().append_pair("url", target_url);
        url
    }
}

#[async_trait]
impl ProxyFetcher for HttpProxyClient {
    async fn fetch_json(&self, target_url: &str) -> Result<serde_json::Value, FetchError> {
        let url = self.proxied_url(target_url);
        tracing::debug!(target_url = %target_url, "Fetching through relay");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TARGET: &str = "https://www.reddit.com/r/rust/comments/abc/title.json";

    async fn client_for(server: &MockServer) -> HttpProxyClient {
        HttpProxyClient::new(&format!("{}/api/proxy", server.uri()), Duration::from_secs(5))
            .unwrap()
    }

    #[test]
    fn test_status_classification() {
        assert!(FetchError::from_status(429).is_throttled());
        assert!(FetchError::from_status(403).is_throttled());
        assert_eq!(
            FetchError::from_status(404),
            FetchError::Status { status: 404 }
        );
        assert!(!FetchError::Transport("reset".into()).is_throttled());
    }

    #[test]
    fn test_invalid_relay_url_rejected() {
        let result = HttpProxyClient::new("not a url", Duration::from_secs(1));
        assert!(matches!(result, Err(recap_common::Error::Config(_))));
    }

    #[test]
    fn test_target_is_percent_encoded() {
        let client =
            HttpProxyClient::new("http://127.0.0.1:5780/api/proxy", Duration::from_secs(1))
                .unwrap();
        let url = client.proxied_url("https://example.com/r/a?x=1&y=2");
        let (key, value) = url.query_pairs().next().unwrap();
        assert_eq!(key, "url");
        assert_eq!(value, "https://example.com/r/a?x=1&y=2");
        assert!(!url.as_str().contains("&y=2"));
    }

    #[tokio::test]
    async fn test_success_returns_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/proxy"))
            .and(query_param("url", TARGET))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"ok": true}])))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let body = client.fetch_json(TARGET).await.unwrap();
        assert_eq!(body, json!([{"ok": true}]));
    }

    #[tokio::test]
    async fn test_throttling_statuses() {
        for status in [429u16, 403] {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(status))
                .mount(&server)
                .await;

            let client = client_for(&server).await;
            let err = client.fetch_json(TARGET).await.unwrap_err();
            assert_eq!(err, FetchError::Throttled { status });
        }
    }

    #[tokio::test]
    async fn test_other_status_and_bad_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("url", "https://a.test/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("url", "https://a.test/html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(
            client.fetch_json("https://a.test/missing").await.unwrap_err(),
            FetchError::Status { status: 404 }
        );
        assert!(matches!(
            client.fetch_json("https://a.test/html").await.unwrap_err(),
            FetchError::Decode(_)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_transport_error() {
        let client =
            HttpProxyClient::new("http://127.0.0.1:9/api/proxy", Duration::from_millis(500))
                .unwrap();
        assert!(matches!(
            client.fetch_json(TARGET).await.unwrap_err(),
            FetchError::Transport(_)
        ));
    }
}
