//! Declarative lifecycle state machines
//!
//! Each [`ResourceKind`] owns one [`LifecycleStateMachine`], built once at
//! startup from a transition table and shared read-only afterwards.
//!
//! ```text
//! START ──create──▶ PENDING ──(auto)──▶ STOPPED ──start──▶ RUNNING
//!                                         ▲                   │
//!                                         └──(auto)── STOPPING ◀┘ stop
//! ```

use crate::error::{GatewayError, Result};
use crate::state::{CanonicalState, ResourceKind};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

/// What causes a transition to fire
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Fires only when a caller requests the named action
    Action(String),
    /// Fires on backend-side progress, without a caller action
    Automatic,
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trigger::Action(name) => write!(f, "{}", name),
            Trigger::Automatic => write!(f, "(automatic)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: CanonicalState,
    pub trigger: Trigger,
    pub to: CanonicalState,
}

/// A requested action has no transition from the current state
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Action '{action}' is not allowed for {kind} in state {from}")]
pub struct IllegalTransition {
    pub kind: ResourceKind,
    pub from: CanonicalState,
    pub action: String,
}

/// Collects transitions and validates them into a [`LifecycleStateMachine`]
#[derive(Debug, Clone)]
pub struct StateMachineBuilder {
    kind: ResourceKind,
    initial: CanonicalState,
    transitions: Vec<Transition>,
}

impl StateMachineBuilder {
    pub fn new(kind: ResourceKind, initial: CanonicalState) -> Self {
        Self {
            kind,
            initial,
            transitions: Vec::new(),
        }
    }

    /// Caller-triggered transition `from --action--> to`
    pub fn on(mut self, from: CanonicalState, action: &str, to: CanonicalState) -> Self {
        self.transitions.push(Transition {
            from,
            trigger: Trigger::Action(action.to_string()),
            to,
        });
        self
    }

    /// Automatic transition `from --> to`
    pub fn automatically(mut self, from: CanonicalState, to: CanonicalState) -> Self {
        self.transitions.push(Transition {
            from,
            trigger: Trigger::Automatic,
            to,
        });
        self
    }

    /// Validate the table. Ambiguities are configuration errors, never request-time errors.
    pub fn build(self) -> Result<LifecycleStateMachine> {
        let mut actions: HashMap<(CanonicalState, String), CanonicalState> = HashMap::new();
        let mut automatic: HashMap<CanonicalState, CanonicalState> = HashMap::new();
        let mut transitions: Vec<Transition> = Vec::with_capacity(self.transitions.len());

        for transition in self.transitions {
            match &transition.trigger {
                Trigger::Action(name) => {
                    if name.trim().is_empty() {
                        return Err(GatewayError::Configuration(format!(
                            "{}: empty action name on transition from {}",
                            self.kind, transition.from
                        )));
                    }
                    let key = (transition.from, name.clone());
                    if let Some(existing) = actions.get(&key) {
                        if *existing != transition.to {
                            return Err(GatewayError::Configuration(format!(
                                "{}: action '{}' from {} leads to both {} and {}",
                                self.kind, name, transition.from, existing, transition.to
                            )));
                        }
                        continue;
                    }
                    actions.insert(key, transition.to);
                }
                Trigger::Automatic => {
                    if transition.from == transition.to {
                        return Err(GatewayError::Configuration(format!(
                            "{}: automatic self-loop on {}",
                            self.kind, transition.from
                        )));
                    }
                    if let Some(existing) = automatic.get(&transition.from) {
                        if *existing != transition.to {
                            return Err(GatewayError::Configuration(format!(
                                "{}: ambiguous automatic transitions from {} ({} and {})",
                                self.kind, transition.from, existing, transition.to
                            )));
                        }
                        continue;
                    }
                    automatic.insert(transition.from, transition.to);
                }
            }
            transitions.push(transition);
        }

        Ok(LifecycleStateMachine {
            kind: self.kind,
            initial: self.initial,
            transitions,
            actions,
            automatic,
        })
    }
}

/// Validated transition table for one resource kind
#[derive(Debug, Clone)]
pub struct LifecycleStateMachine {
    kind: ResourceKind,
    initial: CanonicalState,
    transitions: Vec<Transition>,
    actions: HashMap<(CanonicalState, String), CanonicalState>,
    automatic: HashMap<CanonicalState, CanonicalState>,
}

impl LifecycleStateMachine {
    pub fn builder(kind: ResourceKind, initial: CanonicalState) -> StateMachineBuilder {
        StateMachineBuilder::new(kind, initial)
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn initial_state(&self) -> CanonicalState {
        self.initial
    }

    /// Destination of the caller-triggered transition `action` from `from`, if any
    pub fn is_legal(&self, from: CanonicalState, action: &str) -> Option<CanonicalState> {
        self.actions.get(&(from, action.to_string())).copied()
    }

    /// Like [`Self::is_legal`], reporting the illegal case as a value
    pub fn check(
        &self,
        from: CanonicalState,
        action: &str,
    ) -> std::result::Result<CanonicalState, IllegalTransition> {
        self.is_legal(from, action).ok_or_else(|| IllegalTransition {
            kind: self.kind,
            from,
            action: action.to_string(),
        })
    }

    pub fn automatic_successor(&self, from: CanonicalState) -> Option<CanonicalState> {
        self.automatic.get(&from).copied()
    }

    /// Caller actions available from `state`, sorted by name
    pub fn actions_for(&self, state: CanonicalState) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .actions
            .keys()
            .filter(|(from, _)| *from == state)
            .map(|(_, name)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    pub fn is_terminal(&self, state: CanonicalState) -> bool {
        !self.transitions.iter().any(|t| t.from == state)
    }

    /// Part of this machine and not waiting on backend progress
    pub fn is_settled(&self, state: CanonicalState) -> bool {
        self.states().contains(&state) && self.automatic_successor(state).is_none()
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn states(&self) -> BTreeSet<CanonicalState> {
        let mut states = BTreeSet::new();
        states.insert(self.initial);
        for t in &self.transitions {
            states.insert(t.from);
            states.insert(t.to);
        }
        states
    }
}

/// One state machine per resource kind
#[derive(Debug, Clone, Default)]
pub struct LifecycleCatalog {
    machines: HashMap<ResourceKind, LifecycleStateMachine>,
}

impl LifecycleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a machine, replacing any previous one for the same kind
    pub fn insert(&mut self, machine: LifecycleStateMachine) {
        self.machines.insert(machine.kind(), machine);
    }

    pub fn with(mut self, machine: LifecycleStateMachine) -> Self {
        self.insert(machine);
        self
    }

    pub fn get(&self, kind: ResourceKind) -> Option<&LifecycleStateMachine> {
        self.machines.get(&kind)
    }

    pub fn kinds(&self) -> Vec<ResourceKind> {
        let mut kinds: Vec<_> = self.machines.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Tables for instances, systems, networks and load balancers
    pub fn standard() -> Result<Self> {
        use CanonicalState::*;

        let instance = LifecycleStateMachine::builder(ResourceKind::Instance, Start)
            .on(Start, "create", Pending)
            .automatically(Pending, Stopped)
            .on(Pending, "destroy", Finish)
            .on(Stopped, "start", Running)
            .on(Running, "reboot", Running)
            .on(Running, "stop", Stopping)
            .automatically(Stopping, Stopped)
            .on(Stopped, "destroy", Finish)
            .build()?;

        let system = LifecycleStateMachine::builder(ResourceKind::System, Start)
            .on(Start, "create", Pending)
            .automatically(Pending, Stopped)
            .on(Pending, "destroy", Finish)
            .on(Stopped, "start", Running)
            .on(Running, "restart", Running)
            .on(Running, "stop", Stopping)
            .automatically(Stopping, Stopped)
            .on(Running, "pause", Paused)
            .on(Paused, "start", Running)
            .on(Running, "suspend", Suspended)
            .on(Suspended, "start", Running)
            .on(Stopped, "destroy", Finish)
            .build()?;

        let network = LifecycleStateMachine::builder(ResourceKind::Network, Start)
            .on(Start, "create", Pending)
            .automatically(Pending, Stopped)
            .on(Stopped, "start", Running)
            .on(Running, "stop", Stopped)
            .on(Running, "suspend", Suspended)
            .on(Suspended, "start", Running)
            .on(Stopped, "destroy", Finish)
            .build()?;

        let load_balancer = LifecycleStateMachine::builder(ResourceKind::LoadBalancer, Start)
            .on(Start, "create", Pending)
            .automatically(Pending, Running)
            .on(Running, "register", Running)
            .on(Running, "unregister", Running)
            .on(Running, "destroy", Finish)
            .build()?;

        Ok(Self::new()
            .with(instance)
            .with(system)
            .with(network)
            .with(load_balancer))
    }
}
