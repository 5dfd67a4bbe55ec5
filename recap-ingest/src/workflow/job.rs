//! Handle to a background enrichment run

use recap_common::events::EnrichmentSummary;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Running record enrichment started by an ingest
///
/// Dropping the handle does not stop the run; call [`cancel`] for that.
///
/// [`cancel`]: EnrichmentJob::cancel
pub struct EnrichmentJob {
    id: Uuid,
    cancel: CancellationToken,
    handle: JoinHandle<EnrichmentSummary>,
}

impl EnrichmentJob {
    pub(crate) fn new(
        id: Uuid,
        cancel: CancellationToken,
        handle: JoinHandle<EnrichmentSummary>,
    ) -> Self {
        Self { id, cancel, handle }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Request the run to stop after publishing its working sequence
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the run to end
    pub async fn wait(self) -> recap_common::Result<EnrichmentSummary> {
        self.handle.await.map_err(|e| {
            recap_common::Error::Internal(format!("Enrichment task {} failed: {}", self.id, e))
        })
    }
}
