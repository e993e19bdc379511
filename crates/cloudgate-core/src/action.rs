//! Action requests and their outcomes

use crate::error::BackendError;
use crate::lifecycle::IllegalTransition;
use crate::provider::{ActionPayload, Credentials, Operation};
use crate::state::{CanonicalState, ResourceKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A caller's request to run a named action against a resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Backend the resource lives on
    pub backend: String,

    pub kind: ResourceKind,

    pub resource_id: String,

    /// Action name (e.g., "start", "stop", "reboot", "destroy")
    pub action: String,

    pub credentials: Credentials,

    /// Request body, passed to the backend unchanged
    pub body: serde_json::Value,
}

impl ActionRequest {
    pub fn new(
        backend: impl Into<String>,
        kind: ResourceKind,
        resource_id: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            backend: backend.into(),
            kind,
            resource_id: resource_id.into(),
            action: action.into(),
            credentials: Credentials::default(),
            body: serde_json::Value::Null,
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = body;
        self
    }

    pub fn operation(&self) -> Operation {
        Operation::new(self.kind, self.action.clone())
    }

    pub fn payload(&self) -> ActionPayload {
        ActionPayload {
            credentials: self.credentials.clone(),
            body: self.body.clone(),
        }
    }
}

/// A caller's request to create a new resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRequest {
    pub backend: String,
    pub kind: ResourceKind,
    pub credentials: Credentials,
    pub body: serde_json::Value,
}

impl CreateRequest {
    pub fn new(backend: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            backend: backend.into(),
            kind,
            credentials: Credentials::default(),
            body: serde_json::Value::Null,
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = body;
        self
    }

    pub fn operation(&self) -> Operation {
        Operation::new(self.kind, "create")
    }

    pub fn payload(&self) -> ActionPayload {
        ActionPayload {
            credentials: self.credentials.clone(),
            body: self.body.clone(),
        }
    }
}

/// Classification of a failed action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The backend does not implement the operation
    NotSupported,
    /// The resource id does not resolve
    NotFound,
    /// The action is not legal from the current canonical state
    IllegalTransition,
    /// The backend call returned an error
    BackendFailure,
    /// The backend call exceeded its time bound
    Timeout,
}

impl ErrorCategory {
    pub fn status_hint(&self) -> u16 {
        match self {
            ErrorCategory::NotSupported => 501,
            ErrorCategory::NotFound => 404,
            ErrorCategory::IllegalTransition => 409,
            ErrorCategory::BackendFailure => 502,
            ErrorCategory::Timeout => 504,
        }
    }

    /// Whether the category is decided before any backend call
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ErrorCategory::NotSupported | ErrorCategory::NotFound | ErrorCategory::IllegalTransition
        )
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::NotSupported => write!(f, "not supported"),
            ErrorCategory::NotFound => write!(f, "not found"),
            ErrorCategory::IllegalTransition => write!(f, "conflict"),
            ErrorCategory::BackendFailure => write!(f, "backend failure"),
            ErrorCategory::Timeout => write!(f, "timeout"),
        }
    }
}

/// What is known about real-world effects of a failed action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideEffect {
    /// Nothing was sent to the backend
    None,
    /// The backend was called; the effect may or may not have applied.
    /// Callers should re-read the resource instead of retrying blindly.
    Unknown,
    /// The backend accepted the call but its answer could not be understood
    Applied,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionError {
    pub category: ErrorCategory,
    pub side_effect: SideEffect,
    pub message: String,
}

/// Outcome of a single dispatched action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_state: Option<CanonicalState>,

    /// HTTP-like status for the rendering layer
    pub status_hint: u16,

    /// Id of the resource the result refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ActionError>,
}

impl ActionResult {
    pub fn accepted(resource_id: impl Into<String>, new_state: CanonicalState) -> Self {
        Self {
            success: true,
            new_state: Some(new_state),
            status_hint: 202,
            resource_id: Some(resource_id.into()),
            error: None,
        }
    }

    pub fn failure(
        category: ErrorCategory,
        side_effect: SideEffect,
        message: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            new_state: None,
            status_hint: category.status_hint(),
            resource_id: None,
            error: Some(ActionError {
                category,
                side_effect,
                message: message.into(),
            }),
        }
    }

    pub fn not_supported(backend: &str, operation: &Operation) -> Self {
        Self::failure(
            ErrorCategory::NotSupported,
            SideEffect::None,
            format!("Backend '{}' does not support '{}'", backend, operation),
        )
    }

    pub fn not_found(kind: ResourceKind, id: &str) -> Self {
        Self::failure(
            ErrorCategory::NotFound,
            SideEffect::None,
            format!("{} '{}' not found", kind, id),
        )
    }

    pub fn illegal(err: &IllegalTransition) -> Self {
        Self::failure(
            ErrorCategory::IllegalTransition,
            SideEffect::None,
            err.to_string(),
        )
    }

    /// Backend error raised after the backend was called
    pub fn backend_failure(err: &BackendError) -> Self {
        let side_effect = match err {
            BackendError::ResponseParse(_) => SideEffect::Applied,
            _ => SideEffect::Unknown,
        };
        let mut result = Self::failure(ErrorCategory::BackendFailure, side_effect, err.to_string());
        result.status_hint = err.status_hint();
        result
    }

    pub fn timeout(operation: &Operation, bound: Duration) -> Self {
        Self::failure(
            ErrorCategory::Timeout,
            SideEffect::Unknown,
            format!("'{}' did not complete within {:?}", operation, bound),
        )
    }

    pub fn with_resource_id(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }

    pub fn category(&self) -> Option<ErrorCategory> {
        self.error.as_ref().map(|e| e.category)
    }

    pub fn side_effect(&self) -> Option<SideEffect> {
        self.error.as_ref().map(|e| e.side_effect)
    }
}
