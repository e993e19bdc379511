//! Pending guard for resources under background convergence
//!
//! While a key is converging, reads report [`CanonicalState::Pending`] no
//! matter what the backend says. When convergence gives up, the entry turns
//! into a failure and reads report [`CanonicalState::Failed`] until cleared.

use crate::state::{CanonicalState, ResourceKey};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingEntry {
    Converging { since: DateTime<Utc> },
    Failed { reason: String, at: DateTime<Utc> },
}

impl PendingEntry {
    pub fn state(&self) -> CanonicalState {
        match self {
            PendingEntry::Converging { .. } => CanonicalState::Pending,
            PendingEntry::Failed { .. } => CanonicalState::Failed,
        }
    }
}

/// Cloneable handle over the shared pending set
#[derive(Debug, Clone, Default)]
pub struct PendingRegistry {
    entries: Arc<Mutex<HashMap<ResourceKey, PendingEntry>>>,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ResourceKey, PendingEntry>> {
        // entries stay consistent even if a holder panicked
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Mark `key` as converging. Returns false if it already was.
    pub fn begin(&self, key: ResourceKey) -> bool {
        let mut entries = self.lock();
        let already = matches!(entries.get(&key), Some(PendingEntry::Converging { .. }));
        if !already {
            tracing::debug!("Pending guard set: {}", key);
            entries.insert(key, PendingEntry::Converging { since: Utc::now() });
        }
        !already
    }

    /// Convergence finished; normal normalization applies again
    pub fn clear(&self, key: &ResourceKey) -> Option<PendingEntry> {
        let removed = self.lock().remove(key);
        if removed.is_some() {
            tracing::debug!("Pending guard cleared: {}", key);
        }
        removed
    }

    /// Convergence gave up; reads report FAILED until [`Self::clear`]
    pub fn fail(&self, key: &ResourceKey, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!("Pending guard failed for {}: {}", key, reason);
        self.lock().insert(
            key.clone(),
            PendingEntry::Failed {
                reason,
                at: Utc::now(),
            },
        );
    }

    pub fn get(&self, key: &ResourceKey) -> Option<PendingEntry> {
        self.lock().get(key).cloned()
    }

    /// Canonical state forced by the guard, if any
    pub fn overlay(&self, key: &ResourceKey) -> Option<CanonicalState> {
        self.lock().get(key).map(PendingEntry::state)
    }

    pub fn is_pending(&self, key: &ResourceKey) -> bool {
        matches!(self.get(key), Some(PendingEntry::Converging { .. }))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ResourceKind;

    fn key(id: &str) -> ResourceKey {
        ResourceKey::new("mock", ResourceKind::Instance, id)
    }

    #[test]
    fn test_begin_clear_cycle() {
        let pending = PendingRegistry::new();

        assert!(pending.begin(key("a")));
        assert!(!pending.begin(key("a")));
        assert_eq!(pending.overlay(&key("a")), Some(CanonicalState::Pending));
        assert!(pending.is_pending(&key("a")));
        assert_eq!(pending.overlay(&key("b")), None);

        assert!(pending.clear(&key("a")).is_some());
        assert_eq!(pending.overlay(&key("a")), None);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_failed_entry_reports_failed() {
        let pending = PendingRegistry::new();
        pending.begin(key("a"));
        pending.fail(&key("a"), "retry budget exhausted");

        assert_eq!(pending.overlay(&key("a")), Some(CanonicalState::Failed));
        assert!(!pending.is_pending(&key("a")));
        match pending.get(&key("a")) {
            Some(PendingEntry::Failed { reason, .. }) => {
                assert_eq!(reason, "retry budget exhausted")
            }
            other => panic!("unexpected entry: {:?}", other),
        }

        // a new create for the same id starts converging again
        assert!(pending.begin(key("a")));
        assert_eq!(pending.overlay(&key("a")), Some(CanonicalState::Pending));
    }

    #[test]
    fn test_clones_share_state() {
        let pending = PendingRegistry::new();
        let handle = pending.clone();

        let worker = std::thread::spawn(move || {
            handle.begin(key("threaded"));
        });
        worker.join().unwrap();

        assert!(pending.is_pending(&key("threaded")));
        assert_eq!(pending.len(), 1);
    }
}
