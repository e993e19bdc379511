//! Canonical states, resource kinds and resource records
//!
//! Every backend reports status in its own vocabulary. The gateway only ever
//! exposes the small closed set of [`CanonicalState`] values defined here.

use crate::error::GatewayError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Category of a managed resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Instance,
    Image,
    Network,
    Volume,
    System,
    LoadBalancer,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Instance,
        ResourceKind::Image,
        ResourceKind::Network,
        ResourceKind::Volume,
        ResourceKind::System,
        ResourceKind::LoadBalancer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Instance => "instance",
            ResourceKind::Image => "image",
            ResourceKind::Network => "network",
            ResourceKind::Volume => "volume",
            ResourceKind::System => "system",
            ResourceKind::LoadBalancer => "load_balancer",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| GatewayError::UnknownResourceKind(s.to_string()))
    }
}

/// Backend-agnostic lifecycle label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CanonicalState {
    /// Before creation; only `create` leaves it
    Start,
    Pending,
    Running,
    Stopping,
    Stopped,
    Paused,
    Suspended,
    /// Destroyed
    Finish,
    /// Background convergence gave up
    Failed,
    Unknown,
}

impl CanonicalState {
    pub const ALL: [CanonicalState; 10] = [
        CanonicalState::Start,
        CanonicalState::Pending,
        CanonicalState::Running,
        CanonicalState::Stopping,
        CanonicalState::Stopped,
        CanonicalState::Paused,
        CanonicalState::Suspended,
        CanonicalState::Finish,
        CanonicalState::Failed,
        CanonicalState::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalState::Start => "START",
            CanonicalState::Pending => "PENDING",
            CanonicalState::Running => "RUNNING",
            CanonicalState::Stopping => "STOPPING",
            CanonicalState::Stopped => "STOPPED",
            CanonicalState::Paused => "PAUSED",
            CanonicalState::Suspended => "SUSPENDED",
            CanonicalState::Finish => "FINISH",
            CanonicalState::Failed => "FAILED",
            CanonicalState::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for CanonicalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalState {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        CanonicalState::ALL
            .into_iter()
            .find(|state| state.as_str() == upper)
            .ok_or_else(|| GatewayError::UnknownState(s.to_string()))
    }
}

/// Identity of a resource across backends, rendered as `backend:kind:id`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKey {
    pub backend: String,
    pub kind: ResourceKind,
    pub id: String,
}

impl ResourceKey {
    pub fn new(backend: impl Into<String>, kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            kind,
            id: id.into(),
        }
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.backend, self.kind, self.id)
    }
}

/// A resource as reported by the lookup collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Backend-specific resource ID
    pub id: String,

    pub kind: ResourceKind,

    /// Backend that owns the resource
    pub backend: String,

    /// Status token exactly as the backend reported it
    pub raw_status: String,

    /// Resource attributes (IP, profile, etc.)
    pub attributes: HashMap<String, serde_json::Value>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Resource {
    pub fn new(
        backend: impl Into<String>,
        kind: ResourceKind,
        id: impl Into<String>,
        raw_status: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            kind,
            backend: backend.into(),
            raw_status: raw_status.into(),
            attributes: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(self.backend.clone(), self.kind, self.id.clone())
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn set_raw_status(&mut self, raw_status: impl Into<String>) {
        self.raw_status = raw_status.into();
        self.updated_at = Utc::now();
    }

    pub fn get_attribute<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}
