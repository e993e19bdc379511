//! vCloud backend profile
//!
//! vCloud reports numeric power states; `4` and `8` are the only ones with a
//! stable meaning, everything else is in flight. A destroyed vApp shows up as
//! `DELETED` until it drops out of the listing.

use crate::profile::BackendProfile;
use cloudgate_core::{CanonicalState, ResourceKind, StatusTable};

pub const PROFILE: &str = "vcloud";

pub fn status_table() -> StatusTable {
    StatusTable::new()
        .alias(&["4", "POWERED_ON"], CanonicalState::Running)
        .alias(&["8", "POWERED_OFF"], CanonicalState::Stopped)
        // a deleted vApp is gone; lookups after destroy report this token
        .map("DELETED", CanonicalState::Finish)
        .with_fallback(CanonicalState::Pending)
}

pub fn profile() -> BackendProfile {
    BackendProfile::new(PROFILE, "VMware vCloud", status_table())
        .supports(
            ResourceKind::Instance,
            &["create", "start", "stop", "reboot", "destroy"],
        )
        // UNRESOLVED (0) and RESOLVED (1) precede the first power-off
        .created_as("0")
        .progress("0", "1")
        .progress("1", "8")
        .reports("start", "4")
        .reports("reboot", "4")
        .reports("stop", "8")
        .reports("destroy", "DELETED")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_states() {
        let table = status_table();
        assert_eq!(table.resolve("4"), CanonicalState::Running);
        assert_eq!(table.resolve("powered_on"), CanonicalState::Running);
        assert_eq!(table.resolve("8"), CanonicalState::Stopped);
        assert_eq!(table.resolve("POWERED_OFF"), CanonicalState::Stopped);
    }

    #[test]
    fn test_everything_else_is_pending() {
        let table = status_table();
        for raw in ["0", "1", "3", "SUSPENDED", ""] {
            assert_eq!(table.resolve(raw), CanonicalState::Pending, "raw {:?}", raw);
        }
    }

    #[test]
    fn test_destroy_finishes() {
        let profile = profile();
        let raw = profile.reported_status("destroy").unwrap();
        assert_eq!(profile.status_table().resolve(raw), CanonicalState::Finish);
    }

    #[test]
    fn test_reboot_supported() {
        assert!(profile().capabilities().contains("reboot_instance"));
    }
}
