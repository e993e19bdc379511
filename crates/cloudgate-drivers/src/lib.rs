//! Backend drivers for cloudgate
//!
//! Built-in backend profiles (status vocabulary + capability set) and an
//! in-memory backend that replays them.
//!
//! # Example
//!
//! ```ignore
//! use cloudgate_core::ActionDispatcher;
//! use cloudgate_drivers::{mock, profile};
//!
//! let (builder, backends) = mock::mount(
//!     ActionDispatcher::builder(),
//!     [profile("vcloud")?, profile("paci")?.with_id("paci-eu")],
//! )?;
//! let dispatcher = builder.build()?;
//! ```

pub mod error;
pub mod mock;
pub mod paci;
pub mod profile;
pub mod router;
pub mod vcloud;

pub use error::{DriverError, Result};
pub use mock::MockBackend;
pub use profile::{BackendProfile, PROFILE_NAMES, profile};
pub use router::LookupRouter;
