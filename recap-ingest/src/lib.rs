//! recap-ingest library interface
//!
//! Ingests a personal-data export archive, filters it to a time window,
//! enriches each record with live metrics from the remote source and
//! serves the progressively updated results and chart aggregations.

pub mod api;
pub mod archive;
pub mod config;
pub mod error;
pub mod filter;
pub mod logging;
pub mod models;
pub mod services;
pub mod stats;
pub mod store;
pub mod workflow;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use recap_common::events::EventBus;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::IngestConfig;
use crate::filter::TimeWindowFilter;
use crate::services::{
    CommunityEnricher, EnrichmentSession, HttpProxyClient, ProxyFetcher, RecordEnricher,
    SourceUrls,
};
use crate::store::RecordStore;
use crate::workflow::{EnrichmentJob, IngestPipeline};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<IngestConfig>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    pub store: RecordStore,
    pub pipeline: Arc<IngestPipeline>,
    pub communities: Arc<CommunityEnricher>,
    /// Upstream client used by the relay endpoint
    pub relay_client: reqwest::Client,
    /// Enrichment run started by the latest import
    pub active_job: Arc<Mutex<Option<EnrichmentJob>>>,
    /// Held for a whole import so uploads never overlap; `active_job`
    /// itself is only locked for short hand-offs
    pub import_lock: Arc<Mutex<()>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    /// Wire the services with enrichers fetching through the configured
    /// relay URL. Must be called inside a tokio runtime.
    pub fn new(config: IngestConfig, event_bus: EventBus) -> recap_common::Result<Self> {
        let fetcher = HttpProxyClient::new(&config.relay.url, config.relay.timeout)?;
        Self::with_fetcher(config, event_bus, Arc::new(fetcher))
    }

    /// Wire the services around an explicit fetcher
    pub fn with_fetcher(
        config: IngestConfig,
        event_bus: EventBus,
        fetcher: Arc<dyn ProxyFetcher>,
    ) -> recap_common::Result<Self> {
        let relay_client = reqwest::Client::builder()
            .user_agent(config.relay.user_agent.clone())
            .timeout(config.relay.timeout)
            .redirect(api::redirect_policy(config.relay.clone()))
            .build()
            .map_err(|e| recap_common::Error::Internal(format!("HTTP client: {}", e)))?;

        let store = RecordStore::new();
        let urls = SourceUrls::new(config.source_base_url.clone());

        let enricher = RecordEnricher::new(
            Arc::clone(&fetcher),
            store.clone(),
            urls.clone(),
            config.records.clone(),
        )
        .with_event_bus(event_bus.clone());

        let pipeline = IngestPipeline::new(
            store.clone(),
            TimeWindowFilter::new(config.window),
            Arc::new(enricher),
            event_bus.clone(),
        );

        let communities = CommunityEnricher::new(
            fetcher,
            Arc::new(EnrichmentSession::new()),
            urls,
            &config.communities,
        );

        Ok(Self {
            config: Arc::new(config),
            event_bus,
            store,
            pipeline: Arc::new(pipeline),
            communities: Arc::new(communities),
            relay_client,
            active_job: Arc::new(Mutex::new(None)),
            import_lock: Arc::new(Mutex::new(())),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        })
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let max_upload_bytes = state.config.max_upload_bytes;

    Router::new()
        .merge(api::import_routes(max_upload_bytes))
        .merge(api::snapshot_routes())
        .merge(api::stats_routes())
        .merge(api::community_routes())
        .merge(api::proxy_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .layer(TraceLayer::new_for_http())
        // Browser dashboards on other local ports read the API directly
        .layer(CorsLayer::permissive())
        .with_state(state)
}
