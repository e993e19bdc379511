//! Capability sets and the per-backend capability registry

use crate::error::{GatewayError, Result};
use crate::provider::{BackendAdapter, Operation};
use crate::state::ResourceKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Operation names a backend declares it implements
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet(BTreeSet<String>);

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_operations<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        names.into_iter().map(str::to_string).collect()
    }

    pub fn with(mut self, name: impl Into<String>) -> Self {
        self.0.insert(name.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.0.insert(name.into())
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.0.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn supports(&self, kind: ResourceKind, action: &str) -> bool {
        self.contains(&Operation::new(kind, action).name())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<String> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Registered backend adapters, answering "does backend X implement operation Y?"
///
/// Built once at startup. Lookups never fail: unknown backends and unknown
/// operations are simply unsupported.
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    adapters: HashMap<String, Arc<dyn BackendAdapter>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: Arc<dyn BackendAdapter>) -> Result<()> {
        let id = adapter.id().to_string();
        if self.adapters.contains_key(&id) {
            return Err(GatewayError::BackendAlreadyRegistered(id));
        }
        tracing::debug!("Registered backend adapter: {}", id);
        self.adapters.insert(id, adapter);
        Ok(())
    }

    pub fn adapter(&self, backend: &str) -> Option<Arc<dyn BackendAdapter>> {
        self.adapters.get(backend).cloned()
    }

    pub fn supports(&self, backend: &str, operation: &str) -> bool {
        self.adapters
            .get(backend)
            .is_some_and(|adapter| adapter.capabilities().contains(operation))
    }

    pub fn operations(&self, backend: &str) -> CapabilitySet {
        self.adapters
            .get(backend)
            .map(|adapter| adapter.capabilities())
            .unwrap_or_default()
    }

    pub fn backends(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("backends", &self.backends())
            .finish()
    }
}
