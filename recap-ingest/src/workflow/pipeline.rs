//! Archive → filtered snapshot → background enrichment

use super::job::EnrichmentJob;
use crate::archive::{read_export, user_from_archive_name, ArchiveError};
use crate::filter::TimeWindowFilter;
use crate::models::FilteredExport;
use crate::services::RecordEnricher;
use crate::store::RecordStore;
use recap_common::events::{EventBus, IngestCounts, RecapEvent};
use recap_common::time::now;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

pub struct IngestPipeline {
    store: RecordStore,
    filter: TimeWindowFilter,
    enricher: Arc<RecordEnricher>,
    event_bus: EventBus,
}

impl IngestPipeline {
    pub fn new(
        store: RecordStore,
        filter: TimeWindowFilter,
        enricher: Arc<RecordEnricher>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            store,
            filter,
            enricher,
            event_bus,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Ingest an export archive held in memory
    ///
    /// On success the unenriched snapshot is already published and
    /// enrichment runs in the background. On failure nothing is published
    /// and the previous snapshot stays in place. An archive with no posts
    /// or comments inside the window is rejected unless `allow_empty`.
    pub async fn ingest(
        &self,
        bytes: Vec<u8>,
        archive_name: Option<String>,
        allow_empty: bool,
    ) -> Result<EnrichmentJob, ArchiveError> {
        info!(
            archive = archive_name.as_deref().unwrap_or("<unnamed>"),
            bytes = bytes.len(),
            "Ingest started"
        );
        self.store.set_loading(true);

        let (export, filtered_out) = match self.read_and_filter(bytes, allow_empty).await {
            Ok(result) => result,
            Err(e) => {
                self.store.set_loading(false);
                warn!("Ingest rejected: {}", e);
                self.event_bus.emit_lossy(RecapEvent::IngestFailed {
                    message: e.to_string(),
                    timestamp: now(),
                });
                return Err(e);
            }
        };

        let user = archive_name.as_deref().and_then(user_from_archive_name);
        let counts = IngestCounts {
            posts: export.posts.len(),
            comments: export.comments.len(),
            post_votes: export.post_votes.len(),
            comment_votes: export.comment_votes.len(),
            filtered_out,
        };

        self.store.set(export.to_snapshot(user));
        self.store.set_loading(false);

        let job_id = Uuid::new_v4();
        info!(
            job_id = %job_id,
            posts = counts.posts,
            comments = counts.comments,
            post_votes = counts.post_votes,
            comment_votes = counts.comment_votes,
            filtered_out = counts.filtered_out,
            "Unenriched snapshot published"
        );
        self.event_bus.emit_lossy(RecapEvent::IngestStarted {
            job_id,
            archive_name,
            counts,
            timestamp: now(),
        });

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_enrichment(
            Arc::clone(&self.enricher),
            self.event_bus.clone(),
            job_id,
            export,
            cancel.clone(),
        ));

        Ok(EnrichmentJob::new(job_id, cancel, handle))
    }

    async fn read_and_filter(
        &self,
        bytes: Vec<u8>,
        allow_empty: bool,
    ) -> Result<(FilteredExport, usize), ArchiveError> {
        let tables = tokio::task::spawn_blocking(move || read_export(&bytes))
            .await
            .map_err(|e| ArchiveError::Corrupt(format!("archive reader failed: {}", e)))??;

        let (export, filtered_out) = self.filter.apply(&tables);
        if !export.has_activity() && !allow_empty {
            return Err(ArchiveError::EmptyWindow);
        }

        Ok((export, filtered_out))
    }
}

async fn run_enrichment(
    enricher: Arc<RecordEnricher>,
    event_bus: EventBus,
    job_id: Uuid,
    export: FilteredExport,
    cancel: CancellationToken,
) -> recap_common::events::EnrichmentSummary {
    let summary = enricher.enrich(job_id, export, &cancel).await;

    let event = if summary.cancelled {
        info!(job_id = %job_id, "Enrichment cancelled");
        RecapEvent::EnrichmentCancelled {
            job_id,
            summary: summary.clone(),
            timestamp: now(),
        }
    } else {
        RecapEvent::EnrichmentCompleted {
            job_id,
            summary: summary.clone(),
            timestamp: now(),
        }
    };

    event_bus.emit_lossy(event);

    summary
}
