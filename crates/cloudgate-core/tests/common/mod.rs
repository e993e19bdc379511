use async_trait::async_trait;
use cloudgate_core::{
    ActionPayload, BackendAdapter, BackendError, BackendResult, CapabilitySet, CreatedResource,
    Operation, Resource, ResourceKind, ResourceLookup, StatusTable,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const BACKEND: &str = "fake";

/// Scripted answer for one operation
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum Response {
    Status(String),
    Fail(BackendError),
    Hang(Duration),
}

/// Backend adapter and resource lookup in one, driven by scripted responses
pub struct FakeBackend {
    capabilities: Mutex<CapabilitySet>,
    table: StatusTable,
    resources: Mutex<HashMap<(ResourceKind, String), Resource>>,
    responses: Mutex<HashMap<String, Response>>,
    progressions: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<String>>,
    lookups: AtomicUsize,
    next_id: AtomicUsize,
}

#[allow(dead_code)]
impl FakeBackend {
    pub fn new(capabilities: &[&str], table: StatusTable) -> Self {
        Self {
            capabilities: Mutex::new(CapabilitySet::from_operations(capabilities.iter().copied())),
            table,
            resources: Mutex::new(HashMap::new()),
            responses: Mutex::new(HashMap::new()),
            progressions: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            lookups: AtomicUsize::new(0),
            next_id: AtomicUsize::new(1),
        }
    }

    pub fn put(&self, kind: ResourceKind, id: &str, raw_status: &str) {
        self.resources.lock().unwrap().insert(
            (kind, id.to_string()),
            Resource::new(BACKEND, kind, id, raw_status),
        );
    }

    pub fn remove(&self, kind: ResourceKind, id: &str) {
        self.resources.lock().unwrap().remove(&(kind, id.to_string()));
    }

    pub fn respond(&self, operation: &str, response: Response) {
        self.responses
            .lock()
            .unwrap()
            .insert(operation.to_string(), response);
    }

    /// Each lookup that observes `from` moves the resource on to `to`
    pub fn progress(&self, from: &str, to: &str) {
        self.progressions
            .lock()
            .unwrap()
            .insert(from.to_string(), to.to_string());
    }

    pub fn raw_status(&self, kind: ResourceKind, id: &str) -> Option<String> {
        self.resources
            .lock()
            .unwrap()
            .get(&(kind, id.to_string()))
            .map(|r| r.raw_status.clone())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendAdapter for FakeBackend {
    fn id(&self) -> &str {
        BACKEND
    }

    fn display_name(&self) -> &str {
        "Fake"
    }

    fn capabilities(&self) -> CapabilitySet {
        self.capabilities.lock().unwrap().clone()
    }

    fn status_table(&self) -> StatusTable {
        self.table.clone()
    }

    async fn invoke(
        &self,
        operation: &Operation,
        resource_id: &str,
        _payload: &ActionPayload,
    ) -> BackendResult<String> {
        self.calls.lock().unwrap().push(operation.name());
        let response = self.responses.lock().unwrap().get(&operation.name()).cloned();

        match response {
            Some(Response::Status(raw)) => {
                if let Some(resource) = self
                    .resources
                    .lock()
                    .unwrap()
                    .get_mut(&(operation.kind, resource_id.to_string()))
                {
                    resource.set_raw_status(raw.clone());
                }
                Ok(raw)
            }
            Some(Response::Fail(err)) => Err(err),
            Some(Response::Hang(duration)) => {
                tokio::time::sleep(duration).await;
                Ok("hung".to_string())
            }
            None => Err(BackendError::Vendor {
                code: "500".to_string(),
                message: format!("no scripted response for {}", operation),
            }),
        }
    }

    async fn create(
        &self,
        kind: ResourceKind,
        _payload: &ActionPayload,
    ) -> BackendResult<CreatedResource> {
        let name = format!("create_{}", kind);
        self.calls.lock().unwrap().push(name.clone());

        let response = self.responses.lock().unwrap().get(&name).cloned();
        let raw = match response {
            Some(Response::Status(raw)) => raw,
            Some(Response::Fail(err)) => return Err(err),
            Some(Response::Hang(duration)) => {
                tokio::time::sleep(duration).await;
                "hung".to_string()
            }
            None => "pending".to_string(),
        };

        let id = format!("{}-{}", kind, self.next_id.fetch_add(1, Ordering::SeqCst));
        self.put(kind, &id, &raw);
        Ok(CreatedResource::new(id, raw))
    }
}

#[async_trait]
impl ResourceLookup for FakeBackend {
    async fn find(
        &self,
        backend: &str,
        kind: ResourceKind,
        id: &str,
    ) -> BackendResult<Option<Resource>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if backend != BACKEND {
            return Ok(None);
        }

        let mut resources = self.resources.lock().unwrap();
        let Some(resource) = resources.get_mut(&(kind, id.to_string())) else {
            return Ok(None);
        };
        let observed = resource.clone();

        if let Some(next) = self.progressions.lock().unwrap().get(&resource.raw_status) {
            resource.set_raw_status(next.clone());
        }
        Ok(Some(observed))
    }
}
