//! Background convergence after create
//!
//! A freshly created resource is reported PENDING until its backend settles.
//! Convergence polls the lookup collaborator at a fixed interval with a
//! bounded attempt budget, then either clears the pending guard or marks it
//! failed.

use crate::dispatcher::DispatchContext;
use crate::provider::{ActionPayload, Operation};
use crate::state::{CanonicalState, ResourceKey};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Operation run once a new resource has settled, if the backend declares it
pub const POST_CREATE_ACTION: &str = "post_create";

/// Polling budget for background convergence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvergenceConfig {
    /// Number of polls before giving up
    pub max_attempts: u32,

    /// Fixed delay between polls
    pub poll_interval: Duration,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            poll_interval: Duration::from_secs(10),
        }
    }
}

impl ConvergenceConfig {
    pub fn new(max_attempts: u32, poll_interval: Duration) -> Self {
        Self {
            max_attempts,
            poll_interval,
        }
    }

    /// Upper bound on how long convergence can take, ignoring lookup latency
    pub fn budget(&self) -> Duration {
        self.poll_interval * self.max_attempts.saturating_sub(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvergenceOutcome {
    /// The resource settled and the pending guard was cleared
    Converged(CanonicalState),
    /// The resource settled but the post-create step failed; guard marked failed
    PostCreateFailed(String),
    /// The resource was destroyed before it settled; guard cleared, no post-create
    Removed(Option<CanonicalState>),
    /// The attempt budget ran out; guard marked failed
    Exhausted {
        attempts: u32,
        last_seen: Option<CanonicalState>,
    },
    /// Another convergence already owns this guard
    AlreadyConverging,
}

impl ConvergenceOutcome {
    pub fn is_converged(&self) -> bool {
        matches!(self, ConvergenceOutcome::Converged(_))
    }
}

pub(crate) async fn converge(
    ctx: Arc<DispatchContext>,
    key: ResourceKey,
    payload: ActionPayload,
) -> ConvergenceOutcome {
    let config = &ctx.convergence;
    let machine = ctx.catalog.get(key.kind);
    let mut last_seen = None;

    for attempt in 0..config.max_attempts {
        match ctx.lookup.find(&key.backend, key.kind, &key.id).await {
            Ok(Some(resource)) => {
                let state = ctx.normalizer.normalize(&key.backend, &resource.raw_status);
                last_seen = Some(state);

                let (terminal, settled) = match machine {
                    Some(machine) => (
                        machine.states().contains(&state) && machine.is_terminal(state),
                        machine.is_settled(state),
                    ),
                    None => (
                        state == CanonicalState::Finish,
                        !matches!(state, CanonicalState::Pending | CanonicalState::Unknown),
                    ),
                };

                tracing::debug!(
                    "Convergence poll {}/{} for {}: raw '{}' -> {}",
                    attempt + 1,
                    config.max_attempts,
                    key,
                    resource.raw_status,
                    state
                );

                // destroyed while the guard was up
                if terminal {
                    ctx.pending.clear(&key);
                    tracing::info!("{} reached {} before converging", key, state);
                    return ConvergenceOutcome::Removed(Some(state));
                }

                if settled {
                    if let Err(reason) = post_create(&ctx, &key, &payload).await {
                        ctx.pending.fail(&key, reason.clone());
                        return ConvergenceOutcome::PostCreateFailed(reason);
                    }
                    ctx.pending.clear(&key);
                    tracing::info!("{} converged to {}", key, state);
                    return ConvergenceOutcome::Converged(state);
                }
            }
            Ok(None) if last_seen.is_some() => {
                ctx.pending.clear(&key);
                tracing::info!("{} disappeared before converging", key);
                return ConvergenceOutcome::Removed(None);
            }
            Ok(None) => {
                tracing::debug!("Convergence poll {}: {} not visible yet", attempt + 1, key);
            }
            Err(e) => {
                tracing::debug!("Convergence poll {} for {} failed: {}", attempt + 1, key, e);
            }
        }

        if attempt + 1 < config.max_attempts {
            sleep(config.poll_interval).await;
        }
    }

    let reason = match last_seen {
        Some(state) => format!(
            "still {} after {} attempts",
            state, config.max_attempts
        ),
        None => format!("not visible after {} attempts", config.max_attempts),
    };
    ctx.pending.fail(&key, reason);

    ConvergenceOutcome::Exhausted {
        attempts: config.max_attempts,
        last_seen,
    }
}

async fn post_create(
    ctx: &DispatchContext,
    key: &ResourceKey,
    payload: &ActionPayload,
) -> Result<(), String> {
    let operation = Operation::new(key.kind, POST_CREATE_ACTION);
    if !ctx.capabilities.supports(&key.backend, &operation.name()) {
        return Ok(());
    }
    let Some(adapter) = ctx.capabilities.adapter(&key.backend) else {
        return Ok(());
    };

    tracing::debug!("Running {} for {}", operation, key);
    match tokio::time::timeout(
        ctx.backend_timeout,
        adapter.invoke(&operation, &key.id, payload),
    )
    .await
    {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => Err(format!("{} failed: {}", operation, e)),
        Err(_) => Err(format!(
            "{} did not complete within {:?}",
            operation, ctx.backend_timeout
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget() {
        let config = ConvergenceConfig::new(5, Duration::from_millis(200));
        assert_eq!(config.budget(), Duration::from_millis(800));

        let single = ConvergenceConfig::new(1, Duration::from_secs(10));
        assert_eq!(single.budget(), Duration::ZERO);
    }

    #[test]
    fn test_default_config() {
        let config = ConvergenceConfig::default();
        assert_eq!(config.max_attempts, 30);
        assert_eq!(config.poll_interval, Duration::from_secs(10));
    }
}
