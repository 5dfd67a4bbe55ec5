//! Record metrics enrichment
//!
//! Walks posts then comments in order, fetching live metrics for each
//! record through the relay. Records are strictly sequential: the next
//! record's first attempt never starts before the previous record is
//! finalised. Retries are bounded; a record whose attempts are exhausted
//! is finalised with zero metrics and processing continues.
//!
//! The working sequence is published into the [`RecordStore`] at a fixed
//! stride and once more after the last record, so readers see progress
//! without a publication per record.

use super::proxy_client::ProxyFetcher;
use super::response_decoder::{decode_record_metrics, DecodedMetrics};
use super::source_urls::SourceUrls;
use crate::config::RecordEnrichmentSettings;
use crate::models::{FilteredExport, Record, RecordKind, RecordMetrics};
use crate::store::RecordStore;
use recap_common::events::{EnrichmentSummary, EventBus, RecapEvent, SnapshotCollection};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Result of the bounded attempt loop for one record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOutcome {
    /// `None` when every attempt failed
    pub decoded: Option<DecodedMetrics>,
    pub throttled_attempts: usize,
    pub failed_attempts: usize,
}

pub struct RecordEnricher {
    fetcher: Arc<dyn ProxyFetcher>,
    store: RecordStore,
    urls: SourceUrls,
    settings: RecordEnrichmentSettings,
    event_bus: Option<EventBus>,
}

impl RecordEnricher {
    pub fn new(
        fetcher: Arc<dyn ProxyFetcher>,
        store: RecordStore,
        urls: SourceUrls,
        settings: RecordEnrichmentSettings,
    ) -> Self {
        Self {
            fetcher,
            store,
            urls,
            settings,
            event_bus: None,
        }
    }

    /// Announce every publication on `event_bus`
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn settings(&self) -> &RecordEnrichmentSettings {
        &self.settings
    }

    /// Enrich posts, then comments
    ///
    /// Never fails: fetch errors turn into default metrics. When `cancel`
    /// fires, the current collection's working sequence is published once
    /// more and the run stops with `summary.cancelled` set.
    pub async fn enrich(
        &self,
        job_id: Uuid,
        data: FilteredExport,
        cancel: &CancellationToken,
    ) -> EnrichmentSummary {
        let mut summary = EnrichmentSummary::default();
        let FilteredExport {
            posts, comments, ..
        } = data;

        info!(
            job_id = %job_id,
            posts = posts.len(),
            comments = comments.len(),
            "Record enrichment started"
        );

        let mut completed = self
            .enrich_collection(job_id, SnapshotCollection::Posts, posts, cancel, &mut summary)
            .await;
        if completed {
            completed = self
                .enrich_collection(
                    job_id,
                    SnapshotCollection::Comments,
                    comments,
                    cancel,
                    &mut summary,
                )
                .await;
        }
        summary.cancelled = !completed;

        info!(
            job_id = %job_id,
            posts = summary.posts_processed,
            comments = summary.comments_processed,
            fetched = summary.fetched,
            defaulted = summary.defaulted,
            throttled_attempts = summary.throttled_attempts,
            failed_attempts = summary.failed_attempts,
            cancelled = summary.cancelled,
            "Record enrichment finished"
        );

        summary
    }

    /// Returns false when stopped by cancellation
    async fn enrich_collection(
        &self,
        job_id: Uuid,
        collection: SnapshotCollection,
        mut working: Vec<Record>,
        cancel: &CancellationToken,
        summary: &mut EnrichmentSummary,
    ) -> bool {
        let total = working.len();
        if total == 0 {
            return !cancel.is_cancelled();
        }

        let interval = match collection {
            SnapshotCollection::Posts => self.settings.post_publish_interval,
            SnapshotCollection::Comments => self.settings.comment_publish_interval,
        }
        .max(1);

        for index in 0..total {
            if cancel.is_cancelled() {
                self.publish(job_id, collection, &working, index);
                return false;
            }

            let permalink = working[index].permalink.trim().to_string();
            let kind = working[index].kind;

            let metrics = if permalink.is_empty() {
                debug!(id = %working[index].id, "Record has no permalink, using defaults");
                summary.defaulted += 1;
                RecordMetrics::default()
            } else {
                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    outcome = self.fetch_metrics(&permalink, kind) => Some(outcome),
                };
                let Some(outcome) = outcome else {
                    self.publish(job_id, collection, &working, index);
                    return false;
                };

                summary.throttled_attempts += outcome.throttled_attempts;
                summary.failed_attempts += outcome.failed_attempts;
                match outcome.decoded {
                    Some(decoded) => {
                        summary.fetched += 1;
                        if !decoded.matched {
                            warn!(permalink = %permalink, "Unexpected response shape, using defaults");
                            summary.decode_fallbacks += 1;
                        }
                        decoded.metrics
                    }
                    None => {
                        warn!(
                            permalink = %permalink,
                            attempts = self.settings.max_attempts,
                            "Attempts exhausted, using defaults"
                        );
                        summary.defaulted += 1;
                        RecordMetrics::default()
                    }
                }
            };

            working[index] = working[index].with_metrics(metrics);
            match collection {
                SnapshotCollection::Posts => summary.posts_processed += 1,
                SnapshotCollection::Comments => summary.comments_processed += 1,
            }

            if index % interval == 0 || index + 1 == total {
                self.publish(job_id, collection, &working, index + 1);
            }
        }

        true
    }

    /// Bounded attempt loop for one record
    ///
    /// Each attempt is preceded by one pacing interval. Throttling waits
    /// the long cooldown; any other failure waits the short one.
    pub async fn fetch_metrics(&self, permalink: &str, kind: RecordKind) -> FetchOutcome {
        let url = self.urls.record_json_url(permalink);
        let mut outcome = FetchOutcome::default();

        for attempt in 1..=self.settings.max_attempts {
            self.settings.pacing.wait().await;

            match self.fetcher.fetch_json(&url).await {
                Ok(body) => {
                    outcome.decoded = Some(decode_record_metrics(&body, kind));
                    return outcome;
                }
                Err(e) if e.is_throttled() => {
                    outcome.throttled_attempts += 1;
                    warn!(url = %url, attempt, "Throttled: {}", e);
                    tokio::time::sleep(self.settings.throttle_cooldown).await;
                }
                Err(e) => {
                    outcome.failed_attempts += 1;
                    warn!(url = %url, attempt, "Fetch failed: {}", e);
                    tokio::time::sleep(self.settings.failure_cooldown).await;
                }
            }
        }

        outcome
    }

    /// Replace one collection in the store with the working sequence
    fn publish(
        &self,
        job_id: Uuid,
        collection: SnapshotCollection,
        working: &[Record],
        processed: usize,
    ) {
        let records = working.to_vec();
        let total = records.len();

        self.store.update(move |snapshot| match collection {
            SnapshotCollection::Posts => snapshot.with_posts(records),
            SnapshotCollection::Comments => snapshot.with_comments(records),
        });

        debug!(
            job_id = %job_id,
            collection = collection.as_str(),
            processed,
            total,
            "Published working sequence"
        );

        if let Some(event_bus) = &self.event_bus {
            event_bus.emit_lossy(RecapEvent::SnapshotPublished {
                job_id,
                collection,
                processed,
                total,
                timestamp: recap_common::time::now(),
            });
        }
    }
}
