//! Resource lookup routing by backend id

use async_trait::async_trait;
use cloudgate_core::{BackendResult, Resource, ResourceKind, ResourceLookup};
use std::collections::HashMap;
use std::sync::Arc;

/// Sends each lookup to the collaborator registered for its backend.
/// Unrouted backends have no resources.
#[derive(Clone, Default)]
pub struct LookupRouter {
    routes: HashMap<String, Arc<dyn ResourceLookup>>,
}

impl LookupRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, backend: impl Into<String>, lookup: Arc<dyn ResourceLookup>) -> Self {
        self.routes.insert(backend.into(), lookup);
        self
    }

    pub fn backends(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl ResourceLookup for LookupRouter {
    async fn find(
        &self,
        backend: &str,
        kind: ResourceKind,
        id: &str,
    ) -> BackendResult<Option<Resource>> {
        match self.routes.get(backend) {
            Some(lookup) => lookup.find(backend, kind, id).await,
            None => {
                tracing::debug!("No lookup route for backend {}", backend);
                Ok(None)
            }
        }
    }
}

impl std::fmt::Debug for LookupRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupRouter")
            .field("backends", &self.backends())
            .finish()
    }
}
