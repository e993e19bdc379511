//! In-memory backend
//!
//! `MockBackend` replays a [`BackendProfile`]: it answers actions with the
//! profile's reported statuses and moves resources along the profile's
//! progressions each time they are looked up. It is both the adapter and the
//! lookup for its own resources.

use crate::error::Result;
use crate::profile::BackendProfile;
use crate::router::LookupRouter;
use async_trait::async_trait;
use cloudgate_core::{
    ActionPayload, BackendAdapter, BackendError, BackendResult, CanonicalState, CapabilitySet,
    CreatedResource, DispatcherBuilder, Operation, Resource, ResourceKind, ResourceLookup,
    StatusTable,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use uuid::Uuid;

pub const PROFILE: &str = "mock";

pub fn status_table() -> StatusTable {
    use CanonicalState::*;

    StatusTable::new()
        .alias(&["creating", "provisioning"], Pending)
        .map("running", Running)
        .map("stopping", Stopping)
        .map("stopped", Stopped)
        .map("paused", Paused)
        .map("suspended", Suspended)
        .map("deleted", Finish)
}

/// Profile covering every kind of the standard catalog
pub fn profile() -> BackendProfile {
    BackendProfile::new(PROFILE, "In-memory mock", status_table())
        .supports(
            ResourceKind::Instance,
            &["create", "start", "stop", "reboot", "destroy", "post_create"],
        )
        .supports(
            ResourceKind::System,
            &[
                "create", "start", "stop", "restart", "pause", "suspend", "destroy",
            ],
        )
        .supports(
            ResourceKind::Network,
            &["create", "start", "stop", "suspend", "destroy"],
        )
        .supports(
            ResourceKind::LoadBalancer,
            &["create", "register", "unregister", "destroy"],
        )
        .created_as("creating")
        .created_kind_as(ResourceKind::LoadBalancer, "provisioning")
        .progress("creating", "stopped")
        .progress("provisioning", "running")
        .progress("stopping", "stopped")
        .reports("start", "running")
        .reports("reboot", "running")
        .reports("restart", "running")
        .reports("register", "running")
        .reports("unregister", "running")
        .reports("stop", "stopping")
        .reports("pause", "paused")
        .reports("suspend", "suspended")
        .reports("destroy", "deleted")
}

pub struct MockBackend {
    profile: BackendProfile,
    resources: Mutex<HashMap<(ResourceKind, String), Resource>>,
    failures: Mutex<HashMap<String, BackendError>>,
    latency: Duration,
}

impl MockBackend {
    pub fn new(profile: BackendProfile) -> Self {
        Self {
            profile,
            resources: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            latency: Duration::ZERO,
        }
    }

    /// Delay every adapter call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn profile(&self) -> &BackendProfile {
        &self.profile
    }

    /// Seed a resource with a raw status
    pub fn insert(&self, kind: ResourceKind, id: impl Into<String>, raw_status: impl Into<String>) {
        let id = id.into();
        let resource = Resource::new(self.profile.id(), kind, id.clone(), raw_status);
        lock(&self.resources).insert((kind, id), resource);
    }

    /// Make the next call of `operation` fail with `error`
    pub fn fail_next(&self, operation: impl Into<String>, error: BackendError) {
        lock(&self.failures).insert(operation.into(), error);
    }

    pub fn raw_status(&self, kind: ResourceKind, id: &str) -> Option<String> {
        lock(&self.resources)
            .get(&(kind, id.to_string()))
            .map(|r| r.raw_status.clone())
    }

    pub fn len(&self) -> usize {
        lock(&self.resources).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.resources).is_empty()
    }

    async fn enter(&self, operation: &str) -> BackendResult<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match lock(&self.failures).remove(operation) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Register one mock backend per profile and route lookups to each of them
pub fn mount(
    builder: DispatcherBuilder,
    profiles: impl IntoIterator<Item = BackendProfile>,
) -> Result<(DispatcherBuilder, Vec<Arc<MockBackend>>)> {
    let mut builder = builder;
    let mut router = LookupRouter::new();
    let mut backends = Vec::new();

    for profile in profiles {
        let backend = Arc::new(MockBackend::new(profile));
        builder = builder.backend(backend.clone())?;
        router = router.route(backend.profile().id(), backend.clone());
        backends.push(backend);
    }

    Ok((builder.lookup(Arc::new(router)), backends))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl BackendAdapter for MockBackend {
    fn id(&self) -> &str {
        self.profile.id()
    }

    fn display_name(&self) -> &str {
        self.profile.display_name()
    }

    fn capabilities(&self) -> CapabilitySet {
        self.profile.capabilities().clone()
    }

    fn status_table(&self) -> StatusTable {
        self.profile.status_table().clone()
    }

    async fn invoke(
        &self,
        operation: &Operation,
        resource_id: &str,
        _payload: &ActionPayload,
    ) -> BackendResult<String> {
        self.enter(&operation.name()).await?;

        let mut resources = lock(&self.resources);
        let resource = resources
            .get_mut(&(operation.kind, resource_id.to_string()))
            .ok_or_else(|| {
                BackendError::ObjectNotFound(format!("{} {}", operation.kind, resource_id))
            })?;

        if let Some(raw) = self.profile.reported_status(&operation.action) {
            resource.set_raw_status(raw);
        }
        tracing::debug!(
            "{} {} on {}: now '{}'",
            self.profile.id(),
            operation,
            resource_id,
            resource.raw_status
        );
        Ok(resource.raw_status.clone())
    }

    async fn create(
        &self,
        kind: ResourceKind,
        payload: &ActionPayload,
    ) -> BackendResult<CreatedResource> {
        self.enter(&Operation::new(kind, "create").name()).await?;

        let id = Uuid::new_v4().to_string();
        let raw = self.profile.created_status(kind).to_string();
        let mut resource = Resource::new(self.profile.id(), kind, id.clone(), raw.clone());
        if let Some(body) = payload.body.as_object() {
            for (key, value) in body {
                resource = resource.with_attribute(key.clone(), value.clone());
            }
        }

        lock(&self.resources).insert((kind, id.clone()), resource);
        tracing::info!("{} created {} {} ('{}')", self.profile.id(), kind, id, raw);
        Ok(CreatedResource::new(id, raw))
    }
}

#[async_trait]
impl ResourceLookup for MockBackend {
    async fn find(
        &self,
        backend: &str,
        kind: ResourceKind,
        id: &str,
    ) -> BackendResult<Option<Resource>> {
        if backend != self.profile.id() {
            return Ok(None);
        }

        let mut resources = lock(&self.resources);
        let Some(resource) = resources.get_mut(&(kind, id.to_string())) else {
            return Ok(None);
        };
        let observed = resource.clone();
        if let Some(next) = self.profile.next_status(&resource.raw_status) {
            resource.set_raw_status(next);
        }
        Ok(Some(observed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    fn backend() -> MockBackend {
        MockBackend::new(profile())
    }

    #[tokio::test]
    async fn test_create_then_progress() {
        let backend = backend();
        let payload = ActionPayload {
            body: serde_json::json!({"name": "web-1"}),
            ..Default::default()
        };

        let created = assert_ok!(backend.create(ResourceKind::Instance, &payload).await);
        assert_eq!(created.raw_status, "creating");

        let first = backend
            .find(PROFILE, ResourceKind::Instance, &created.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.raw_status, "creating");
        assert_eq!(first.get_attribute::<String>("name").as_deref(), Some("web-1"));

        let second = backend
            .find(PROFILE, ResourceKind::Instance, &created.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.raw_status, "stopped");
    }

    #[tokio::test]
    async fn test_invoke_reports_profile_status() {
        let backend = backend();
        backend.insert(ResourceKind::Instance, "vm-1", "stopped");

        let raw = backend
            .invoke(
                &Operation::new(ResourceKind::Instance, "start"),
                "vm-1",
                &ActionPayload::default(),
            )
            .await
            .unwrap();
        assert_eq!(raw, "running");

        // no reported status for post_create: the raw status is left alone
        let raw = backend
            .invoke(
                &Operation::new(ResourceKind::Instance, "post_create"),
                "vm-1",
                &ActionPayload::default(),
            )
            .await
            .unwrap();
        assert_eq!(raw, "running");
    }

    #[tokio::test]
    async fn test_invoke_missing_resource() {
        let backend = backend();
        let err = backend
            .invoke(
                &Operation::new(ResourceKind::Network, "start"),
                "net-404",
                &ActionPayload::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::ObjectNotFound(_)));
    }

    #[tokio::test]
    async fn test_fail_next_is_one_shot() {
        let backend = backend();
        backend.insert(ResourceKind::Instance, "vm-1", "running");
        backend.fail_next(
            "stop_instance",
            BackendError::Network("connection refused".to_string()),
        );
        let stop = Operation::new(ResourceKind::Instance, "stop");

        let first = backend.invoke(&stop, "vm-1", &ActionPayload::default()).await;
        assert!(matches!(first, Err(BackendError::Network(_))));
        assert_eq!(
            backend.raw_status(ResourceKind::Instance, "vm-1").as_deref(),
            Some("running")
        );

        let second = backend.invoke(&stop, "vm-1", &ActionPayload::default()).await;
        assert_eq!(second.unwrap(), "stopping");
    }

    #[tokio::test]
    async fn test_find_ignores_other_backends() {
        let backend = backend();
        backend.insert(ResourceKind::Instance, "vm-1", "running");

        let found = backend
            .find("paci", ResourceKind::Instance, "vm-1")
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_mount_rejects_duplicate_ids() {
        let result = mount(
            cloudgate_core::ActionDispatcher::builder(),
            [profile(), crate::paci::profile().with_id(PROFILE)],
        );
        assert!(matches!(result, Err(crate::DriverError::Gateway(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency() {
        let backend = backend().with_latency(Duration::from_secs(3));
        backend.insert(ResourceKind::Instance, "vm-1", "stopped");
        let start = tokio::time::Instant::now();

        backend
            .invoke(
                &Operation::new(ResourceKind::Instance, "start"),
                "vm-1",
                &ActionPayload::default(),
            )
            .await
            .unwrap();

        assert!(start.elapsed() >= Duration::from_secs(3));
    }
}
