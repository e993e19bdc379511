//! cloudgate core
//!
//! This crate holds the backend-independent heart of cloudgate: deciding
//! which operations a backend supports, validating actions against canonical
//! lifecycle state machines, dispatching them to backend adapters and
//! normalizing whatever status the backend reports.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │          REST / CLI surface (out of crate)       │
//! └─────────────────┬───────────────────────────────┘
//!                   │ ActionRequest / ActionResult
//! ┌─────────────────▼───────────────────────────────┐
//! │                cloudgate-core                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │            ActionDispatcher               │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐ ┌─────────────┐ ┌──────────┐  │
//! │  │ Capabilities │ │ Lifecycle   │ │Normalizer│  │
//! │  └──────────────┘ └─────────────┘ └──────────┘  │
//! │  ┌──────────────┐ ┌─────────────┐               │
//! │  │ PendingGuard │ │ Convergence │               │
//! │  └──────────────┘ └─────────────┘               │
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │ BackendAdapter│ │ResourceLookup │
//! └───────────────┘ └───────────────┘
//! ```

pub mod action;
pub mod capability;
pub mod convergence;
pub mod dispatcher;
pub mod error;
pub mod lifecycle;
pub mod normalizer;
pub mod pending;
pub mod provider;
pub mod state;

// Re-exports
pub use action::{
    ActionError, ActionRequest, ActionResult, CreateRequest, ErrorCategory, SideEffect,
};
pub use capability::{CapabilityRegistry, CapabilitySet};
pub use convergence::{ConvergenceConfig, ConvergenceOutcome, POST_CREATE_ACTION};
pub use dispatcher::{
    ActionDispatcher, DEFAULT_BACKEND_TIMEOUT, DispatcherBuilder, Provisioning,
};
pub use error::{BackendError, BackendResult, GatewayError, Result};
pub use lifecycle::{
    IllegalTransition, LifecycleCatalog, LifecycleStateMachine, StateMachineBuilder, Transition,
    Trigger,
};
pub use normalizer::{DEFAULT_FALLBACK, StateNormalizer, StatusTable};
pub use pending::{PendingEntry, PendingRegistry};
pub use provider::{
    ActionPayload, BackendAdapter, CreatedResource, Credentials, Operation, ResourceLookup,
};
pub use state::{CanonicalState, Resource, ResourceKey, ResourceKind};
