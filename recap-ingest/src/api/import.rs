//! Export upload handlers
//!
//! POST /api/import, POST /api/import/cancel

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use recap_common::events::EnrichmentSummary;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    AppState,
};

/// POST /api/import query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ImportQuery {
    /// Original file name of the upload (used to identify the account)
    pub name: Option<String>,
    /// Accept an export with no posts or comments inside the window
    #[serde(default)]
    pub allow_empty: bool,
}

/// POST /api/import response
#[derive(Debug, Serialize, Deserialize)]
pub struct ImportResponse {
    pub job_id: Uuid,
    pub user: Option<String>,
    pub posts: usize,
    pub comments: usize,
    pub post_votes: usize,
    pub comment_votes: usize,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

/// POST /api/import/cancel response
#[derive(Debug, Serialize, Deserialize)]
pub struct CancelImportResponse {
    pub job_id: Uuid,
    pub summary: EnrichmentSummary,
    pub cancelled_at: chrono::DateTime<chrono::Utc>,
}

/// POST /api/import
///
/// Body is the raw zip archive. Any enrichment run still going is
/// cancelled and awaited first, so only one run ever writes to the
/// record store. Returns 202 once the unenriched snapshot is published.
/// Health and cancel requests stay responsive while the archive is read.
pub async fn import_archive(
    State(state): State<AppState>,
    Query(query): Query<ImportQuery>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<ImportResponse>)> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("Upload body is empty".to_string()));
    }

    let _import = state.import_lock.lock().await;

    let previous = state.active_job.lock().await.take();
    if let Some(previous) = previous {
        let previous_id = previous.id();
        info!(job_id = %previous_id, "Cancelling previous enrichment run");
        previous.cancel();
        if let Err(e) = previous.wait().await {
            warn!(job_id = %previous_id, "Previous enrichment run ended abnormally: {}", e);
        }
    }

    let job = match state
        .pipeline
        .ingest(body.to_vec(), query.name, query.allow_empty)
        .await
    {
        Ok(job) => job,
        Err(e) => {
            *state.last_error.write().await = Some(e.to_string());
            return Err(e.into());
        }
    };

    let snapshot = state.store.snapshot().unwrap_or_default();
    let response = ImportResponse {
        job_id: job.id(),
        user: snapshot.user.clone(),
        posts: snapshot.posts.len(),
        comments: snapshot.comments.len(),
        post_votes: snapshot.post_votes.len(),
        comment_votes: snapshot.comment_votes.len(),
        started_at: chrono::Utc::now(),
    };
    *state.active_job.lock().await = Some(job);

    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// POST /api/import/cancel
///
/// Stops the current enrichment run and returns its summary. Records
/// already enriched stay enriched.
pub async fn cancel_import(State(state): State<AppState>) -> ApiResult<Json<CancelImportResponse>> {
    let job = state
        .active_job
        .lock()
        .await
        .take()
        .ok_or_else(|| ApiError::NotFound("No enrichment run".to_string()))?;

    let job_id = job.id();
    job.cancel();
    let summary = job.wait().await?;

    info!(
        job_id = %job_id,
        records_processed = summary.records_processed(),
        "Enrichment run cancelled"
    );

    Ok(Json(CancelImportResponse {
        job_id,
        summary,
        cancelled_at: chrono::Utc::now(),
    }))
}

/// Build import routes
pub fn import_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/api/import", post(import_archive))
        .route("/api/import/cancel", post(cancel_import))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}
