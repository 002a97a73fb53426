//! Flotilla Network - Address pools, allocation and name resolution
//!
//! Tracks reservation state of network addresses per network and hands out
//! reservations with no-double-allocation guarantees. Address state is the
//! one resource in Flotilla shared across deployments, so it is guarded by
//! its own per-network lock, independent of the deployment-level lock
//! manager.
//!
//! ## Key Concepts
//!
//! - **Dynamic pool address**: drawn from an unassigned pool, exclusively
//!   owned until released
//! - **Static address**: explicitly requested; conflicts surface as errors
//! - **Vip**: virtual/floating address, rebindable between instances
//!   without an intermediate release
//! - **Dry-run mode**: the same allocator computing but discarding results,
//!   used by structural manifest validation

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod allocator;
pub mod dns;
pub mod error;
pub mod pool;

// Re-exports
pub use allocator::{AddressAllocator, AddressReclaimer, AllocatorMode};
pub use dns::{InMemoryNameResolutionStore, NameResolutionStore};
pub use error::{NetworkError, Result};
pub use pool::{AddressRepository, NetworkPool, NetworkScope, Reservation};
