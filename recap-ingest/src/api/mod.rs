//! HTTP API handlers for recap-ingest
//!
//! REST endpoints for upload, snapshot and chart data, the relay proxy
//! used by the enrichers, and an SSE stream of progress events.

pub mod communities;
pub mod health;
pub mod import;
pub mod proxy;
pub mod snapshot;
pub mod sse;
pub mod stats;

pub use communities::community_routes;
pub use health::health_routes;
pub use import::import_routes;
pub use proxy::{proxy_routes, redirect_policy};
pub use snapshot::snapshot_routes;
pub use sse::event_stream;
pub use stats::stats_routes;
