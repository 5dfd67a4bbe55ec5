//! Server-Sent Events stream of ingest and enrichment progress

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use recap_common::sse::event_bus_sse_stream;
use std::convert::Infallible;

/// GET /events
///
/// Streams every `RecapEvent`: ingest start/failure, snapshot
/// publications, enrichment completion or cancellation, and resolved
/// community metadata.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    event_bus_sse_stream("recap-ingest", &state.event_bus)
}
