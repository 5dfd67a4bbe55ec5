//! Observable record store
//!
//! Holds the current [`Snapshot`] and the ingest loading flag. The ingest
//! workflow and the record enricher are its only writers; readers either
//! take a snapshot or subscribe to changes.

use crate::models::Snapshot;
use std::sync::Arc;
use tokio::sync::watch;

struct StoreInner {
    snapshot: watch::Sender<Option<Snapshot>>,
    loading: watch::Sender<bool>,
}

/// Shared, observable container for the published snapshot
#[derive(Clone)]
pub struct RecordStore {
    inner: Arc<StoreInner>,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(None);
        let (loading, _) = watch::channel(false);
        Self {
            inner: Arc::new(StoreInner { snapshot, loading }),
        }
    }

    /// Replace the entire snapshot
    pub fn set(&self, snapshot: Snapshot) {
        self.inner.snapshot.send_replace(Some(snapshot));
    }

    /// Apply a pure transform to the current snapshot (an empty snapshot if
    /// nothing was published yet)
    pub fn update<F>(&self, transform: F)
    where
        F: FnOnce(&Snapshot) -> Snapshot,
    {
        self.inner.snapshot.send_modify(|current| {
            let next = transform(current.as_ref().unwrap_or(&Snapshot::default()));
            *current = Some(next);
        });
    }

    /// Current snapshot; collections are shared, so this is cheap
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.inner.snapshot.borrow().clone()
    }

    /// Receiver notified on every publication
    pub fn subscribe(&self) -> watch::Receiver<Option<Snapshot>> {
        self.inner.snapshot.subscribe()
    }

    pub fn set_loading(&self, loading: bool) {
        self.inner.loading.send_replace(loading);
    }

    pub fn is_loading(&self) -> bool {
        *self.inner.loading.borrow()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.inner.loading.subscribe()
    }
}
