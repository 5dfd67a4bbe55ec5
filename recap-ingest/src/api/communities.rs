//! Community metadata endpoints
//!
//! POST /api/communities/enrich, GET /api/communities

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use recap_common::events::RecapEvent;
use recap_common::CommunityMetadata;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::{
    services::CommunityUpdateFn,
    stats::{resolve_community, UNKNOWN_LABEL},
    AppState,
};

/// POST /api/communities/enrich request
#[derive(Debug, Default, Deserialize)]
pub struct EnrichCommunitiesRequest {
    /// Communities to resolve; defaults to every community in the current
    /// snapshot
    #[serde(default)]
    pub communities: Option<Vec<String>>,
}

/// POST /api/communities/enrich response
#[derive(Debug, Serialize, Deserialize)]
pub struct EnrichCommunitiesResponse {
    /// Resolved immediately from cache
    pub cached: HashMap<String, CommunityMetadata>,
    /// Already being fetched by an earlier request
    pub in_flight: Vec<String>,
    /// Queued; results arrive as `CommunityResolved` events
    pub enqueued: Vec<String>,
}

/// GET /api/communities response
#[derive(Debug, Serialize, Deserialize)]
pub struct CommunitiesResponse {
    pub communities: HashMap<String, CommunityMetadata>,
    pub pending: usize,
    pub queued: usize,
}

/// Distinct communities across the current snapshot's posts, comments
/// and votes
fn snapshot_communities(state: &AppState) -> Vec<String> {
    let Some(snapshot) = state.store.snapshot() else {
        return Vec::new();
    };

    let records = snapshot
        .posts
        .iter()
        .chain(snapshot.comments.iter())
        .map(resolve_community);
    let votes = snapshot
        .post_votes
        .iter()
        .chain(snapshot.comment_votes.iter())
        .map(resolve_community);

    records
        .chain(votes)
        .filter(|community| community != UNKNOWN_LABEL)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// POST /api/communities/enrich
pub async fn enrich_communities(
    State(state): State<AppState>,
    request: Option<Json<EnrichCommunitiesRequest>>,
) -> Json<EnrichCommunitiesResponse> {
    let requested = request.and_then(|Json(request)| request.communities);
    let communities = requested.unwrap_or_else(|| snapshot_communities(&state));

    let event_bus = state.event_bus.clone();
    let on_update: CommunityUpdateFn = Arc::new(move |update: HashMap<String, CommunityMetadata>| {
        for (community, metadata) in update {
            event_bus.emit_lossy(RecapEvent::CommunityResolved {
                community,
                metadata,
                timestamp: recap_common::time::now(),
            });
        }
    });

    let batch = state.communities.enrich(&communities, on_update);
    let session = state.communities.session();
    let cached = batch
        .cached
        .iter()
        .filter_map(|community| {
            session
                .cached(community)
                .map(|metadata| (community.clone(), metadata))
        })
        .collect();

    tracing::info!(
        requested = communities.len(),
        cached = batch.cached.len(),
        enqueued = batch.enqueued.len(),
        "Community enrichment requested"
    );

    Json(EnrichCommunitiesResponse {
        cached,
        in_flight: batch.in_flight,
        enqueued: batch.enqueued,
    })
}

/// GET /api/communities
pub async fn list_communities(State(state): State<AppState>) -> Json<CommunitiesResponse> {
    let session = state.communities.session();
    Json(CommunitiesResponse {
        communities: session.cache_snapshot(),
        pending: session.pending_count(),
        queued: state.communities.queue().outstanding(),
    })
}

pub fn community_routes() -> Router<AppState> {
    Router::new()
        .route("/api/communities", get(list_communities))
        .route("/api/communities/enrich", post(enrich_communities))
}
