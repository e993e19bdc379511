//! Backend profiles
//!
//! A profile is everything cloudgate knows about a backend family without
//! talking to it: its id, status vocabulary, declared capabilities, and how
//! its raw statuses move on their own. The mock backend replays a profile.

use crate::error::{DriverError, Result};
use crate::{mock, paci, vcloud};
use cloudgate_core::{CapabilitySet, Operation, ResourceKind, StatusTable};
use std::collections::HashMap;

/// Names accepted by [`profile`]
pub const PROFILE_NAMES: &[&str] = &[paci::PROFILE, vcloud::PROFILE, mock::PROFILE];

#[derive(Debug, Clone)]
pub struct BackendProfile {
    id: String,
    display_name: String,
    capabilities: CapabilitySet,
    status_table: StatusTable,
    default_created: String,
    created: HashMap<ResourceKind, String>,
    progressions: HashMap<String, String>,
    reports: HashMap<String, String>,
}

impl BackendProfile {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        status_table: StatusTable,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            capabilities: CapabilitySet::new(),
            status_table,
            default_created: String::new(),
            created: HashMap::new(),
            progressions: HashMap::new(),
            reports: HashMap::new(),
        }
    }

    /// Same profile under another backend id, e.g. two PACI endpoints
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Declare `<action>_<kind>` for each action
    pub fn supports(mut self, kind: ResourceKind, actions: &[&str]) -> Self {
        for action in actions {
            self.capabilities.insert(Operation::new(kind, *action).name());
        }
        self
    }

    /// Raw status a freshly created resource reports
    pub fn created_as(mut self, raw: impl Into<String>) -> Self {
        self.default_created = raw.into();
        self
    }

    /// Per-kind override of [`created_as`](Self::created_as)
    pub fn created_kind_as(mut self, kind: ResourceKind, raw: impl Into<String>) -> Self {
        self.created.insert(kind, raw.into());
        self
    }

    /// Backend-side progress: a resource observed in `from` moves on to `to`
    pub fn progress(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.progressions.insert(from.into(), to.into());
        self
    }

    /// Raw status the backend answers with after `action`
    pub fn reports(mut self, action: impl Into<String>, raw: impl Into<String>) -> Self {
        self.reports.insert(action.into(), raw.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    pub fn status_table(&self) -> &StatusTable {
        &self.status_table
    }

    pub fn created_status(&self, kind: ResourceKind) -> &str {
        self.created
            .get(&kind)
            .map(String::as_str)
            .unwrap_or(&self.default_created)
    }

    pub fn next_status(&self, raw: &str) -> Option<&str> {
        self.progressions.get(raw).map(String::as_str)
    }

    pub fn reported_status(&self, action: &str) -> Option<&str> {
        self.reports.get(action).map(String::as_str)
    }
}

/// Look up a built-in profile by name
pub fn profile(name: &str) -> Result<BackendProfile> {
    match name.trim().to_lowercase().as_str() {
        paci::PROFILE => Ok(paci::profile()),
        vcloud::PROFILE => Ok(vcloud::profile()),
        mock::PROFILE => Ok(mock::profile()),
        other => Err(DriverError::UnknownProfile(other.to_string())),
    }
}
