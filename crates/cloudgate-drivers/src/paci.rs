//! PACI backend profile
//!
//! PACI reports progress words (`START_IN_PROGRESS`, `STARTED`, ...) rather
//! than power states. Its native lifecycle has two automatic transitions out
//! of pending, which the canonical machines do not allow, so only the
//! vocabulary is carried here.

use crate::profile::BackendProfile;
use cloudgate_core::{CanonicalState, ResourceKind, StatusTable};

pub const PROFILE: &str = "paci";

pub fn status_table() -> StatusTable {
    use CanonicalState::*;

    StatusTable::new()
        .map("CREATE", Start)
        .map("CREATION_IN_PROGRESS", Pending)
        .map("CREATED", Stopped)
        .alias(&["START_IN_PROGRESS", "STARTED"], Running)
        .map("STOP_IN_PROGRESS", Stopping)
        .map("STOPPED", Stopped)
        .map("DELETE_IN_PROGRESS", Stopping)
        .map("DELETED", Finish)
}

pub fn profile() -> BackendProfile {
    BackendProfile::new(PROFILE, "PACI", status_table())
        .supports(
            ResourceKind::Instance,
            &["create", "start", "stop", "destroy"],
        )
        .supports(
            ResourceKind::LoadBalancer,
            &["create", "register", "unregister", "destroy"],
        )
        .created_as("CREATION_IN_PROGRESS")
        .created_kind_as(ResourceKind::LoadBalancer, "STARTED")
        .progress("CREATION_IN_PROGRESS", "CREATED")
        .progress("START_IN_PROGRESS", "STARTED")
        .progress("STOP_IN_PROGRESS", "STOPPED")
        .progress("DELETE_IN_PROGRESS", "DELETED")
        .reports("start", "START_IN_PROGRESS")
        .reports("stop", "STOP_IN_PROGRESS")
        .reports("destroy", "DELETE_IN_PROGRESS")
        .reports("register", "STARTED")
        .reports("unregister", "STARTED")
}
