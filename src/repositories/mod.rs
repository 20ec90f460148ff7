//! # Repository Layer
//!
//! SeaORM-backed implementations of the registry's store seams.

pub mod organization;
pub mod partition;

pub use organization::OrganizationRepository;
pub use partition::SqlPartitionStore;
