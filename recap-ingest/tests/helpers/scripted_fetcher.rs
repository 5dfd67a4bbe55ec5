//! Scripted relay fetcher
//!
//! Serves queued responses per target URL, then a fallback. Every call is
//! recorded with its start and finish instants so tests can check
//! sequencing and pacing under paused time.

use async_trait::async_trait;
use recap_ingest::services::{FetchError, ProxyFetcher};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct FetchCall {
    pub url: String,
    pub started: Instant,
    pub finished: Instant,
}

pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, VecDeque<Result<Value, FetchError>>>>,
    fallback: Result<Value, FetchError>,
    latency: Duration,
    calls: Mutex<Vec<FetchCall>>,
}

impl ScriptedFetcher {
    /// Fetcher answering every unscripted URL with `fallback`
    pub fn new(fallback: Result<Value, FetchError>) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            fallback,
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Simulated round-trip time of every call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queue responses for `url`, served in order before the fallback
    pub fn script<I>(&self, url: &str, responses: I)
    where
        I: IntoIterator<Item = Result<Value, FetchError>>,
    {
        self.scripts
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .extend(responses);
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.url == url)
            .count()
    }

    /// URLs in call order
    pub fn urls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|call| call.url.clone())
            .collect()
    }
}

#[async_trait]
impl ProxyFetcher for ScriptedFetcher {
    async fn fetch_json(&self, target_url: &str) -> Result<Value, FetchError> {
        let started = Instant::now();
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(target_url)
            .and_then(VecDeque::pop_front);
        let result = scripted.unwrap_or_else(|| self.fallback.clone());

        self.calls.lock().unwrap().push(FetchCall {
            url: target_url.to_string(),
            started,
            finished: Instant::now(),
        });

        result
    }
}
