//! Backend adapter and resource lookup traits

use crate::capability::CapabilitySet;
use crate::error::BackendResult;
use crate::normalizer::StatusTable;
use crate::state::{Resource, ResourceKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Backend adapter abstraction
///
/// Every backend (PACI, vCloud, the in-memory mock, ...) implements this trait.
/// The gateway never inspects the concrete type: what an adapter supports is
/// whatever [`BackendAdapter::capabilities`] declares.
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    /// Returns the backend id (e.g., "paci", "vcloud")
    fn id(&self) -> &str;

    /// Returns the backend display name for UI
    fn display_name(&self) -> &str;

    /// Operations this backend implements, named `<action>_<kind>`.
    /// Read on every request, so an adapter may change it at runtime.
    fn capabilities(&self) -> CapabilitySet;

    /// Raw status vocabulary, registered with the normalizer at startup
    fn status_table(&self) -> StatusTable;

    /// Run a named operation against an existing resource and return the raw
    /// status the backend reports afterwards
    async fn invoke(
        &self,
        operation: &Operation,
        resource_id: &str,
        payload: &ActionPayload,
    ) -> BackendResult<String>;

    /// Create a new resource of `kind`
    async fn create(
        &self,
        kind: ResourceKind,
        payload: &ActionPayload,
    ) -> BackendResult<CreatedResource>;
}

/// Resolves resources to their last backend-reported state
#[async_trait]
pub trait ResourceLookup: Send + Sync {
    async fn find(
        &self,
        backend: &str,
        kind: ResourceKind,
        id: &str,
    ) -> BackendResult<Option<Resource>>;
}

/// Opaque caller credentials, passed through to backends unchanged
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Named operation on a resource kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Operation {
    pub kind: ResourceKind,
    pub action: String,
}

impl Operation {
    pub fn new(kind: ResourceKind, action: impl Into<String>) -> Self {
        Self {
            kind,
            action: action.into(),
        }
    }

    /// Capability name, e.g. `start_instance`
    pub fn name(&self) -> String {
        format!("{}_{}", self.action, self.kind)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.action, self.kind)
    }
}

/// What a backend handler receives alongside the resource id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionPayload {
    pub credentials: Credentials,

    /// Request body, untouched by the gateway
    pub body: serde_json::Value,
}

/// Result of a backend create call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedResource {
    pub id: String,
    pub raw_status: String,
}

impl CreatedResource {
    pub fn new(id: impl Into<String>, raw_status: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            raw_status: raw_status.into(),
        }
    }
}
