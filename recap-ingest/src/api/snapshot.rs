//! Current snapshot endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::{models::Snapshot, AppState};

/// GET /api/snapshot response
#[derive(Debug, Serialize)]
pub struct SnapshotResponse {
    pub loading: bool,
    /// Posts and comments with metrics populated
    pub enriched: usize,
    pub total: usize,
    /// `null` until an export was ingested
    pub snapshot: Option<Snapshot>,
}

/// GET /api/snapshot
pub async fn get_snapshot(State(state): State<AppState>) -> Json<SnapshotResponse> {
    let snapshot = state.store.snapshot();
    let (enriched, total) = snapshot
        .as_ref()
        .map(Snapshot::enrichment_progress)
        .unwrap_or((0, 0));

    Json(SnapshotResponse {
        loading: state.store.is_loading(),
        enriched,
        total,
        snapshot,
    })
}

pub fn snapshot_routes() -> Router<AppState> {
    Router::new().route("/api/snapshot", get(get_snapshot))
}
