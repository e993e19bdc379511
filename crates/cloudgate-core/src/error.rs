//! Gateway and backend error types

use thiserror::Error;

/// Errors raised while assembling or configuring the gateway.
///
/// None of these are produced by [`crate::ActionDispatcher::dispatch`]; request-time
/// problems are reported through [`crate::ActionResult`] instead.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Backend already registered: {0}")]
    BackendAlreadyRegistered(String),

    #[error("Unknown resource kind: {0}")]
    UnknownResourceKind(String),

    #[error("Unknown canonical state: {0}")]
    UnknownState(String),
}

pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors a backend adapter (or the resource lookup collaborator) may return.
///
/// The dispatcher converts these into [`crate::ActionResult`] failures; they never
/// escape its boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Vendor error {code}: {message}")]
    Vendor { code: String, message: String },

    #[error("Could not parse backend response: {0}")]
    ResponseParse(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

impl BackendError {
    /// HTTP-like status the rendering layer should use for this failure
    pub fn status_hint(&self) -> u16 {
        match self {
            BackendError::Authentication(_) => 401,
            BackendError::ObjectNotFound(_) => 404,
            BackendError::Unavailable(_) => 503,
            _ => 502,
        }
    }
}
