//! Enrichment session state
//!
//! Owns the community metadata cache and the set of community ids with a
//! fetch currently queued or in flight. One session lives for the whole
//! process (or one test) and is shared through `Arc`.

use recap_common::CommunityMetadata;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct SessionState {
    cache: HashMap<String, CommunityMetadata>,
    pending: HashSet<String>,
}

/// Outcome of asking the session whether a community needs fetching
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    /// Already resolved (possibly as the unavailable sentinel)
    Cached(CommunityMetadata),
    /// A fetch for this id is already queued or running
    InFlight,
    /// Marked pending; the caller must fetch and release it
    Admitted,
}

/// Metadata cache plus pending set
#[derive(Default)]
pub struct EnrichmentSession {
    state: Mutex<SessionState>,
}

impl EnrichmentSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // State stays consistent across a poisoned lock: every critical
        // section is a single map operation.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Check cache, then pending set, then mark pending, all atomically
    pub fn admit(&self, id: &str) -> Admission {
        let mut state = self.lock();
        if let Some(metadata) = state.cache.get(id) {
            return Admission::Cached(metadata.clone());
        }
        if !state.pending.insert(id.to_string()) {
            return Admission::InFlight;
        }
        Admission::Admitted
    }

    pub fn cached(&self, id: &str) -> Option<CommunityMetadata> {
        self.lock().cache.get(id).cloned()
    }

    pub fn store(&self, id: &str, metadata: CommunityMetadata) {
        self.lock().cache.insert(id.to_string(), metadata);
    }

    /// Remove from the pending set; returns whether it was pending
    pub fn release(&self, id: &str) -> bool {
        self.lock().pending.remove(id)
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.lock().pending.contains(id)
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn cache_len(&self) -> usize {
        self.lock().cache.len()
    }

    /// Copy of every resolved entry
    pub fn cache_snapshot(&self) -> HashMap<String, CommunityMetadata> {
        self.lock().cache.clone()
    }
}

/// Releases a pending id when dropped
///
/// Moved into the queued fetch task, so the id leaves the pending set
/// exactly once whether the task completes, panics or is never run.
pub struct PendingGuard {
    session: Arc<EnrichmentSession>,
    id: String,
}

impl PendingGuard {
    pub fn new(session: Arc<EnrichmentSession>, id: String) -> Self {
        Self { session, id }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn session(&self) -> &EnrichmentSession {
        &self.session
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.session.release(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admit_marks_pending_once() {
        let session = EnrichmentSession::new();
        assert_eq!(session.admit("rust"), Admission::Admitted);
        assert_eq!(session.admit("rust"), Admission::InFlight);
        assert!(session.is_pending("rust"));
        assert_eq!(session.pending_count(), 1);
    }

    #[test]
    fn test_cached_entry_wins_over_pending() {
        let session = EnrichmentSession::new();
        let metadata = CommunityMetadata {
            title: Some("Rust".to_string()),
            ..Default::default()
        };
        session.store("rust", metadata.clone());
        assert_eq!(session.admit("rust"), Admission::Cached(metadata));
        assert!(!session.is_pending("rust"));
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let session = Arc::new(EnrichmentSession::new());
        assert_eq!(session.admit("rust"), Admission::Admitted);

        let guard = PendingGuard::new(Arc::clone(&session), "rust".to_string());
        assert_eq!(guard.id(), "rust");
        assert!(session.is_pending("rust"));

        drop(guard);
        assert!(!session.is_pending("rust"));
        assert_eq!(session.admit("rust"), Admission::Admitted);
    }

    #[test]
    fn test_sentinel_is_cached() {
        let session = EnrichmentSession::new();
        session.store("gone", CommunityMetadata::unavailable());
        assert_eq!(session.cache_len(), 1);
        assert!(session.cached("gone").unwrap().is_unavailable());
        assert!(session.cache_snapshot().contains_key("gone"));
    }
}
