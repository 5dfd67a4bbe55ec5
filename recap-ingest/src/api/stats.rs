//! Chart data endpoints
//!
//! GET /api/stats/monthly, GET /api/stats/communities

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use recap_common::Bucket;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, ApiResult},
    stats::{community_buckets, monthly_buckets, DEFAULT_MIN_COUNT},
    AppState,
};

/// GET /api/stats/monthly response
#[derive(Debug, Serialize, Deserialize)]
pub struct MonthlyStatsResponse {
    /// Posts and comments together
    pub activity: Vec<Bucket>,
    pub posts: Vec<Bucket>,
    pub comments: Vec<Bucket>,
}

/// Which sequences feed the community breakdown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunityScope {
    /// Posts and comments
    #[default]
    Activity,
    /// Upvotes on posts and comments
    Votes,
}

#[derive(Debug, Deserialize)]
pub struct CommunityStatsQuery {
    #[serde(default)]
    pub scope: CommunityScope,
    pub min_count: Option<usize>,
}

/// GET /api/stats/communities response
#[derive(Debug, Serialize, Deserialize)]
pub struct CommunityStatsResponse {
    pub scope: CommunityScope,
    pub min_count: usize,
    pub buckets: Vec<Bucket>,
}

fn current_snapshot(state: &AppState) -> ApiResult<crate::models::Snapshot> {
    state
        .store
        .snapshot()
        .ok_or_else(|| ApiError::NotFound("No export ingested yet".to_string()))
}

/// GET /api/stats/monthly
pub async fn monthly_stats(State(state): State<AppState>) -> ApiResult<Json<MonthlyStatsResponse>> {
    let snapshot = current_snapshot(&state)?;
    let posts = snapshot.posts.as_slice();
    let comments = snapshot.comments.as_slice();

    Ok(Json(MonthlyStatsResponse {
        activity: monthly_buckets(&[posts, comments]),
        posts: monthly_buckets(&[posts]),
        comments: monthly_buckets(&[comments]),
    }))
}

/// GET /api/stats/communities?scope=activity|votes&min_count=N
pub async fn community_stats(
    State(state): State<AppState>,
    Query(query): Query<CommunityStatsQuery>,
) -> ApiResult<Json<CommunityStatsResponse>> {
    let snapshot = current_snapshot(&state)?;
    let min_count = query.min_count.unwrap_or(DEFAULT_MIN_COUNT);

    let buckets = match query.scope {
        CommunityScope::Activity => community_buckets(
            &[snapshot.posts.as_slice(), snapshot.comments.as_slice()],
            min_count,
        ),
        CommunityScope::Votes => community_buckets(
            &[
                snapshot.post_votes.as_slice(),
                snapshot.comment_votes.as_slice(),
            ],
            min_count,
        ),
    };

    Ok(Json(CommunityStatsResponse {
        scope: query.scope,
        min_count,
        buckets,
    }))
}

pub fn stats_routes() -> Router<AppState> {
    Router::new()
        .route("/api/stats/monthly", get(monthly_stats))
        .route("/api/stats/communities", get(community_stats))
}
