//! Relay proxy endpoint
//!
//! GET /api/proxy?url=<target>. Forwards a GET to an allow-listed host
//! with the configured User-Agent and returns the upstream JSON body
//! unchanged. The enrichers reach the remote source only through here.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    config::RelaySettings,
    error::{ApiError, ApiResult},
    AppState,
};

/// Redirect hops the relay follows before giving up
const MAX_RELAY_REDIRECTS: usize = 5;

/// Redirect policy for the relay client
///
/// Every hop must land on an allow-listed host. A redirect anywhere else
/// is not followed; the 3xx response is relayed as an upstream error.
pub fn redirect_policy(relay: RelaySettings) -> reqwest::redirect::Policy {
    reqwest::redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() > MAX_RELAY_REDIRECTS {
            return attempt.error("too many redirects");
        }
        let allowed = attempt
            .url()
            .host_str()
            .is_some_and(|host| relay.is_allowed_host(host));
        if allowed {
            attempt.follow()
        } else {
            warn!(target = %attempt.url(), "Relay redirect to host outside allow-list");
            attempt.stop()
        }
    })
}

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub url: Option<String>,
}

/// Parse and vet a relay target
fn validate_target(state: &AppState, raw: Option<&str>) -> ApiResult<reqwest::Url> {
    let raw = raw
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing url parameter".to_string()))?;

    let url = reqwest::Url::parse(raw)
        .map_err(|e| ApiError::BadRequest(format!("Invalid url '{}': {}", raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::BadRequest(format!(
            "Unsupported scheme: {}",
            url.scheme()
        )));
    }

    let host = url.host_str().unwrap_or_default();
    if !state.config.relay.is_allowed_host(host) {
        return Err(ApiError::BadRequest(format!("Host not allowed: {}", host)));
    }

    Ok(url)
}

/// GET /api/proxy
pub async fn relay(
    State(state): State<AppState>,
    Query(query): Query<ProxyQuery>,
) -> ApiResult<Response> {
    let target = validate_target(&state, query.url.as_deref())?;
    debug!(target = %target, "Relaying request");

    let response = state
        .relay_client
        .get(target.clone())
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(|e| {
            warn!(target = %target, "Relay transport error: {}", e);
            ApiError::Internal(e.to_string())
        })?;

    let status = response.status();
    if !status.is_success() {
        warn!(target = %target, status = status.as_u16(), "Upstream returned error status");
        return Err(ApiError::Upstream {
            status: status.as_u16(),
            message: format!("Upstream responded with {}", status),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

pub fn proxy_routes() -> Router<AppState> {
    Router::new().route("/api/proxy", get(relay))
}
