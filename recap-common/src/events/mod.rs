//! Event types for the recap event system
//!
//! Provides shared event definitions and the EventBus used to stream
//! ingest and enrichment progress to SSE clients.

mod ingest_types;

pub use ingest_types::{EnrichmentSummary, IngestCounts, SnapshotCollection};

use crate::models::CommunityMetadata;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Recap event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RecapEvent {
    /// Archive accepted and unenriched snapshot published
    IngestStarted {
        job_id: Uuid,
        archive_name: Option<String>,
        counts: IngestCounts,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Archive rejected; nothing was published
    IngestFailed {
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Working sequence of one collection published into the record store
    SnapshotPublished {
        job_id: Uuid,
        collection: SnapshotCollection,
        /// Records finalised so far in this collection
        processed: usize,
        total: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Enrichment run finished every record
    EnrichmentCompleted {
        job_id: Uuid,
        summary: EnrichmentSummary,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Enrichment run stopped through its cancellation token
    EnrichmentCancelled {
        job_id: Uuid,
        summary: EnrichmentSummary,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Community metadata became available (fetched, cached or sentinel)
    CommunityResolved {
        community: String,
        metadata: CommunityMetadata,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl RecapEvent {
    /// SSE event name for this variant
    pub fn event_type(&self) -> &str {
        match self {
            RecapEvent::IngestStarted { .. } => "IngestStarted",
            RecapEvent::IngestFailed { .. } => "IngestFailed",
            RecapEvent::SnapshotPublished { .. } => "SnapshotPublished",
            RecapEvent::EnrichmentCompleted { .. } => "EnrichmentCompleted",
            RecapEvent::EnrichmentCancelled { .. } => "EnrichmentCancelled",
            RecapEvent::CommunityResolved { .. } => "CommunityResolved",
        }
    }
}

/// Central event distribution bus
///
/// Uses tokio::broadcast internally:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use recap_common::events::{EventBus, RecapEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(RecapEvent::IngestFailed {
///     message: "corrupt archive".to_string(),
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(matches!(rx.try_recv(), Ok(RecapEvent::IngestFailed { .. })));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RecapEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per
    /// subscriber before old events are dropped
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<RecapEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: RecapEvent,
    ) -> Result<usize, broadcast::error::SendError<RecapEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: RecapEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
