//! Flotilla Registry - Persistence seams for deployment state
//!
//! Repository-style traits over the records Flotilla persists: deployments,
//! instances, variable sets and cloud configs. The real system backs these
//! with a transactional relational store; this crate ships in-memory
//! implementations suitable for development and testing.
//!
//! ## Architectural Boundaries
//!
//! - This crate owns: record storage and the variable resolution rule
//!   (latest successful set only)
//! - `flotilla-network` owns: address reservation state
//! - `flotilla-director` owns: locking, teardown ordering, orchestration

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod cloud_config;
pub mod deployment;
pub mod error;
pub mod instance;
pub mod memory;
pub mod variables;

// Re-exports
pub use cloud_config::CloudConfigRegistry;
pub use deployment::DeploymentRegistry;
pub use error::{RegistryError, Result};
pub use instance::InstanceRegistry;
pub use memory::{
    InMemoryCloudConfigRegistry, InMemoryDeploymentRegistry, InMemoryInstanceRegistry,
    InMemoryVariableSetRegistry,
};
pub use variables::VariableSetRegistry;
