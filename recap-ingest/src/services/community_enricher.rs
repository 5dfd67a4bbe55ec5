//! Community metadata enrichment
//!
//! Resolves display metadata (icon, title, subscribers, color) for
//! community identifiers. Each identifier is fetched at most once per
//! session: resolved entries (including the unavailable sentinel) are
//! served from the session cache, and identifiers already in flight are
//! skipped. Fetches run one at a time through a [`SerialFetchQueue`].

use super::fetch_queue::SerialFetchQueue;
use super::proxy_client::ProxyFetcher;
use super::response_decoder::decode_community_metadata;
use super::session::{Admission, EnrichmentSession, PendingGuard};
use super::source_urls::SourceUrls;
use crate::config::CommunityEnrichmentSettings;
use recap_common::CommunityMetadata;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Receives partial `{community -> metadata}` maps as entries resolve
pub type CommunityUpdateFn = Arc<dyn Fn(HashMap<String, CommunityMetadata>) + Send + Sync>;

/// How one `enrich` call partitioned its input
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommunityBatch {
    /// Served from cache; already delivered to the callback
    pub cached: Vec<String>,
    /// Skipped because a fetch is already queued or running
    pub in_flight: Vec<String>,
    /// Newly enqueued for fetching
    pub enqueued: Vec<String>,
}

pub struct CommunityEnricher {
    fetcher: Arc<dyn ProxyFetcher>,
    session: Arc<EnrichmentSession>,
    queue: SerialFetchQueue,
    urls: SourceUrls,
    throttle_cooldown: Duration,
}

impl CommunityEnricher {
    /// Create the enricher and its fetch queue (requires a tokio runtime)
    pub fn new(
        fetcher: Arc<dyn ProxyFetcher>,
        session: Arc<EnrichmentSession>,
        urls: SourceUrls,
        settings: &CommunityEnrichmentSettings,
    ) -> Self {
        Self {
            fetcher,
            session,
            queue: SerialFetchQueue::new(settings.pacing),
            urls,
            throttle_cooldown: settings.throttle_cooldown,
        }
    }

    pub fn session(&self) -> &Arc<EnrichmentSession> {
        &self.session
    }

    pub fn queue(&self) -> &SerialFetchQueue {
        &self.queue
    }

    /// Resolve metadata for `communities`
    ///
    /// Cached entries are delivered synchronously in one callback before
    /// this returns. Every other identifier not already in flight is
    /// marked pending and enqueued; its result arrives later through
    /// `on_update` as a single-entry map. Throttled fetches are not
    /// cached and not reported, so a later call may retry them.
    pub fn enrich<I, S>(&self, communities: I, on_update: CommunityUpdateFn) -> CommunityBatch
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut batch = CommunityBatch::default();
        let mut seen = HashSet::new();
        let mut cached = HashMap::new();

        for community in communities {
            let community = community.as_ref().trim();
            if community.is_empty() || !seen.insert(community.to_string()) {
                continue;
            }

            match self.session.admit(community) {
                Admission::Cached(metadata) => {
                    cached.insert(community.to_string(), metadata);
                    batch.cached.push(community.to_string());
                }
                Admission::InFlight => batch.in_flight.push(community.to_string()),
                Admission::Admitted => {
                    let guard = PendingGuard::new(Arc::clone(&self.session), community.to_string());
                    self.queue.enqueue(fetch_community(
                        guard,
                        Arc::clone(&self.fetcher),
                        self.urls.community_about_url(community),
                        self.throttle_cooldown,
                        Arc::clone(&on_update),
                    ));
                    batch.enqueued.push(community.to_string());
                }
            }
        }

        if !cached.is_empty() {
            on_update(cached);
        }

        debug!(
            cached = batch.cached.len(),
            in_flight = batch.in_flight.len(),
            enqueued = batch.enqueued.len(),
            "Community enrichment batch accepted"
        );

        batch
    }

    /// Resolve once every queued community fetch has finished
    pub async fn wait_idle(&self) {
        self.queue.wait_idle().await;
    }
}

async fn fetch_community(
    guard: PendingGuard,
    fetcher: Arc<dyn ProxyFetcher>,
    url: String,
    throttle_cooldown: Duration,
    on_update: CommunityUpdateFn,
) {
    let community = guard.id().to_string();

    match fetcher.fetch_json(&url).await {
        Ok(body) => {
            let metadata = match decode_community_metadata(&body, &community) {
                Some(metadata) => {
                    info!(community = %community, "Community metadata resolved");
                    metadata
                }
                None => {
                    warn!(community = %community, "Community response had no data object");
                    CommunityMetadata::unavailable()
                }
            };
            resolve(&guard, community, metadata, &on_update);
        }
        Err(e) if e.is_throttled() => {
            // Left uncached so a later call can retry; the queue stays
            // blocked for the cooldown.
            warn!(
                community = %community,
                cooldown_ms = throttle_cooldown.as_millis() as u64,
                "Community fetch throttled: {}", e
            );
            tokio::time::sleep(throttle_cooldown).await;
        }
        Err(e) => {
            warn!(community = %community, "Community fetch failed: {}", e);
            resolve(&guard, community, CommunityMetadata::unavailable(), &on_update);
        }
    }

    // `guard` drops here and releases the pending entry
}

fn resolve(
    guard: &PendingGuard,
    community: String,
    metadata: CommunityMetadata,
    on_update: &CommunityUpdateFn,
) {
    guard.session().store(&community, metadata.clone());
    on_update(HashMap::from([(community, metadata)]));
}
