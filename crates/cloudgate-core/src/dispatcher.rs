//! Action dispatcher
//!
//! ```text
//! ActionRequest
//!   │ 1. capability   ── no ──▶ NotSupported
//!   │ 2. lookup       ── none ─▶ NotFound
//!   │ 3. legality     ── no ──▶ IllegalTransition
//!   │ 4. backend call ── err ─▶ BackendFailure / Timeout
//!   ▼ 5. normalize
//! ActionResult (202, new canonical state)
//! ```

use crate::action::{ActionRequest, ActionResult, CreateRequest, ErrorCategory, SideEffect};
use crate::capability::CapabilityRegistry;
use crate::convergence::{self, ConvergenceConfig, ConvergenceOutcome};
use crate::error::{BackendResult, GatewayError, Result};
use crate::lifecycle::LifecycleCatalog;
use crate::normalizer::StateNormalizer;
use crate::pending::PendingRegistry;
use crate::provider::{ActionPayload, BackendAdapter, Operation, ResourceLookup};
use crate::state::{CanonicalState, ResourceKey, ResourceKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Default bound on a single backend call
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything a dispatch needs, shared read-only between requests and
/// background convergence tasks. Only `pending` is mutable.
pub(crate) struct DispatchContext {
    pub(crate) capabilities: CapabilityRegistry,
    pub(crate) catalog: LifecycleCatalog,
    pub(crate) normalizer: StateNormalizer,
    pub(crate) lookup: Arc<dyn ResourceLookup>,
    pub(crate) pending: PendingRegistry,
    pub(crate) backend_timeout: Duration,
    pub(crate) convergence: ConvergenceConfig,
}

/// Assembles an [`ActionDispatcher`]
pub struct DispatcherBuilder {
    capabilities: CapabilityRegistry,
    normalizer: StateNormalizer,
    catalog: Option<LifecycleCatalog>,
    lookup: Option<Arc<dyn ResourceLookup>>,
    pending: PendingRegistry,
    backend_timeout: Duration,
    convergence: ConvergenceConfig,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self {
            capabilities: CapabilityRegistry::new(),
            normalizer: StateNormalizer::new(),
            catalog: None,
            lookup: None,
            pending: PendingRegistry::new(),
            backend_timeout: DEFAULT_BACKEND_TIMEOUT,
            convergence: ConvergenceConfig::default(),
        }
    }
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter's capabilities and status vocabulary
    pub fn backend(mut self, adapter: Arc<dyn BackendAdapter>) -> Result<Self> {
        let id = adapter.id().to_string();
        let table = adapter.status_table();
        self.capabilities.register(adapter)?;
        self.normalizer.register(id, table);
        Ok(self)
    }

    pub fn catalog(mut self, catalog: LifecycleCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn lookup(mut self, lookup: Arc<dyn ResourceLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn pending(mut self, pending: PendingRegistry) -> Self {
        self.pending = pending;
        self
    }

    pub fn backend_timeout(mut self, timeout: Duration) -> Self {
        self.backend_timeout = timeout;
        self
    }

    pub fn convergence(mut self, config: ConvergenceConfig) -> Self {
        self.convergence = config;
        self
    }

    pub fn build(self) -> Result<ActionDispatcher> {
        let lookup = self.lookup.ok_or_else(|| {
            GatewayError::Configuration("a resource lookup must be configured".to_string())
        })?;
        if self.backend_timeout.is_zero() {
            return Err(GatewayError::Configuration(
                "backend timeout must be greater than zero".to_string(),
            ));
        }
        if self.convergence.max_attempts == 0 {
            return Err(GatewayError::Configuration(
                "convergence needs at least one attempt".to_string(),
            ));
        }
        let catalog = match self.catalog {
            Some(catalog) => catalog,
            None => LifecycleCatalog::standard()?,
        };

        Ok(ActionDispatcher {
            ctx: Arc::new(DispatchContext {
                capabilities: self.capabilities,
                catalog,
                normalizer: self.normalizer,
                lookup,
                pending: self.pending,
                backend_timeout: self.backend_timeout,
                convergence: self.convergence,
            }),
        })
    }
}

/// Result of [`ActionDispatcher::create`]
#[derive(Debug)]
pub struct Provisioning {
    /// What the caller gets back right away
    pub result: ActionResult,

    /// Background convergence, if the create was accepted. Dropping the
    /// handle detaches the task; it keeps running.
    pub convergence: Option<JoinHandle<ConvergenceOutcome>>,
}

/// Validates and executes generic actions against backend resources
#[derive(Clone)]
pub struct ActionDispatcher {
    ctx: Arc<DispatchContext>,
}

impl ActionDispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    pub async fn dispatch(&self, request: ActionRequest) -> ActionResult {
        let ctx = &self.ctx;
        let operation = request.operation();
        let key = ResourceKey::new(request.backend.clone(), request.kind, request.resource_id.clone());

        if !ctx.capabilities.supports(&request.backend, &operation.name()) {
            tracing::debug!("{} does not support {}", request.backend, operation);
            return ActionResult::not_supported(&request.backend, &operation);
        }
        let Some(adapter) = ctx.capabilities.adapter(&request.backend) else {
            return ActionResult::not_supported(&request.backend, &operation);
        };
        let Some(machine) = ctx.catalog.get(request.kind) else {
            return ActionResult::failure(
                ErrorCategory::NotSupported,
                SideEffect::None,
                format!("No lifecycle defined for {}", request.kind),
            );
        };

        let resource = match ctx
            .lookup
            .find(&request.backend, request.kind, &request.resource_id)
            .await
        {
            Ok(Some(resource)) => resource,
            Ok(None) => return ActionResult::not_found(request.kind, &request.resource_id),
            Err(e) => {
                tracing::warn!("Lookup of {} failed: {}", key, e);
                let mut result = ActionResult::failure(
                    ErrorCategory::BackendFailure,
                    SideEffect::None,
                    format!("Resource lookup failed: {}", e),
                );
                result.status_hint = e.status_hint();
                return result;
            }
        };

        let current = match ctx.pending.overlay(&key) {
            Some(state) => state,
            None => ctx.normalizer.normalize(&request.backend, &resource.raw_status),
        };

        let expected = match machine.check(current, &request.action) {
            Ok(to) => to,
            Err(illegal) => {
                tracing::debug!("Rejected {}: {}", key, illegal);
                return ActionResult::illegal(&illegal).with_resource_id(&request.resource_id);
            }
        };

        tracing::info!("Dispatching {} on {} ({} -> {})", operation, key, current, expected);

        let payload = request.payload();
        let outcome = tokio::time::timeout(
            ctx.backend_timeout,
            adapter.invoke(&operation, &request.resource_id, &payload),
        )
        .await;

        match outcome {
            Ok(Ok(raw_status)) => {
                let state = ctx.normalizer.normalize(&request.backend, &raw_status);
                if state != expected {
                    tracing::debug!(
                        "{} reported '{}' ({}), table expected {}",
                        key,
                        raw_status,
                        state,
                        expected
                    );
                }
                ActionResult::accepted(&request.resource_id, state)
            }
            Ok(Err(e)) => {
                tracing::warn!("{} on {} failed: {}", operation, key, e);
                ActionResult::backend_failure(&e).with_resource_id(&request.resource_id)
            }
            Err(_) => {
                tracing::warn!(
                    "{} on {} timed out after {:?}",
                    operation,
                    key,
                    ctx.backend_timeout
                );
                ActionResult::timeout(&operation, ctx.backend_timeout)
                    .with_resource_id(&request.resource_id)
            }
        }
    }

    /// Create a resource, set its pending guard and start background
    /// convergence. Returns immediately with PENDING on success.
    pub async fn create(&self, request: CreateRequest) -> Provisioning {
        let ctx = &self.ctx;
        let operation = request.operation();

        if !ctx.capabilities.supports(&request.backend, &operation.name()) {
            tracing::debug!("{} does not support {}", request.backend, operation);
            return Provisioning {
                result: ActionResult::not_supported(&request.backend, &operation),
                convergence: None,
            };
        }
        let Some(adapter) = ctx.capabilities.adapter(&request.backend) else {
            return Provisioning {
                result: ActionResult::not_supported(&request.backend, &operation),
                convergence: None,
            };
        };

        let payload = request.payload();
        let outcome = tokio::time::timeout(
            ctx.backend_timeout,
            adapter.create(request.kind, &payload),
        )
        .await;

        let created = match outcome {
            Ok(Ok(created)) => created,
            Ok(Err(e)) => {
                tracing::warn!("{} on {} failed: {}", operation, request.backend, e);
                return Provisioning {
                    result: ActionResult::backend_failure(&e),
                    convergence: None,
                };
            }
            Err(_) => {
                tracing::warn!("{} on {} timed out", operation, request.backend);
                return Provisioning {
                    result: ActionResult::timeout(&operation, ctx.backend_timeout),
                    convergence: None,
                };
            }
        };

        let key = ResourceKey::new(request.backend.clone(), request.kind, created.id.clone());
        ctx.pending.begin(key.clone());
        tracing::info!(
            "Created {} (raw '{}'), converging in background",
            key,
            created.raw_status
        );

        let handle = tokio::spawn(convergence::converge(self.ctx.clone(), key, payload));

        Provisioning {
            result: ActionResult::accepted(created.id, CanonicalState::Pending),
            convergence: Some(handle),
        }
    }

    /// Run convergence for `key` inline, setting its pending guard first.
    ///
    /// Returns [`ConvergenceOutcome::AlreadyConverging`] without polling if
    /// another convergence holds the guard.
    pub async fn converge(&self, key: ResourceKey, payload: ActionPayload) -> ConvergenceOutcome {
        if !self.ctx.pending.begin(key.clone()) {
            tracing::debug!("{} is already converging", key);
            return ConvergenceOutcome::AlreadyConverging;
        }
        convergence::converge(self.ctx.clone(), key, payload).await
    }

    /// Canonical state for read paths: the pending guard wins over the backend
    pub async fn current_state(
        &self,
        backend: &str,
        kind: ResourceKind,
        id: &str,
    ) -> BackendResult<Option<CanonicalState>> {
        let key = ResourceKey::new(backend, kind, id);
        if let Some(state) = self.ctx.pending.overlay(&key) {
            return Ok(Some(state));
        }
        let resource = self.ctx.lookup.find(backend, kind, id).await?;
        Ok(resource.map(|r| self.ctx.normalizer.normalize(backend, &r.raw_status)))
    }

    /// Caller actions currently available on a resource
    pub async fn available_actions(
        &self,
        backend: &str,
        kind: ResourceKind,
        id: &str,
    ) -> BackendResult<Vec<String>> {
        let Some(state) = self.current_state(backend, kind, id).await? else {
            return Ok(Vec::new());
        };
        let Some(machine) = self.ctx.catalog.get(kind) else {
            return Ok(Vec::new());
        };
        Ok(machine
            .actions_for(state)
            .into_iter()
            .filter(|action| {
                self.ctx
                    .capabilities
                    .supports(backend, &Operation::new(kind, *action).name())
            })
            .map(str::to_string)
            .collect())
    }

    /// Forget a failed convergence so the backend state is reported again
    pub fn clear_failure(&self, backend: &str, kind: ResourceKind, id: &str) -> bool {
        let key = ResourceKey::new(backend, kind, id);
        match self.ctx.pending.get(&key) {
            Some(entry) if entry.state() == CanonicalState::Failed => {
                self.ctx.pending.clear(&key);
                true
            }
            _ => false,
        }
    }

    pub fn normalize(&self, backend: &str, raw_status: &str) -> CanonicalState {
        self.ctx.normalizer.normalize(backend, raw_status)
    }

    pub fn supports(&self, backend: &str, operation: &str) -> bool {
        self.ctx.capabilities.supports(backend, operation)
    }

    pub fn capabilities(&self) -> &CapabilityRegistry {
        &self.ctx.capabilities
    }

    pub fn catalog(&self) -> &LifecycleCatalog {
        &self.ctx.catalog
    }

    pub fn normalizer(&self) -> &StateNormalizer {
        &self.ctx.normalizer
    }

    pub fn pending(&self) -> &PendingRegistry {
        &self.ctx.pending
    }

    pub fn backend_timeout(&self) -> Duration {
        self.ctx.backend_timeout
    }
}

impl std::fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("capabilities", &self.ctx.capabilities)
            .field("kinds", &self.ctx.catalog.kinds())
            .field("backend_timeout", &self.ctx.backend_timeout)
            .field("convergence", &self.ctx.convergence)
            .finish()
    }
}
