//! Flotilla Director - Deployment lifecycle orchestration
//!
//! The top of the Flotilla stack: serializes mutations per deployment
//! through named locks, drives the ordered teardown pipeline, keeps
//! variable-set bookkeeping consistent with which deployments are alive,
//! and validates cloud configurations before persisting them.
//!
//! ## Architectural Boundaries
//!
//! - `flotilla-registry` owns: record storage and variable resolution
//! - `flotilla-network` owns: address reservation state and name records
//! - `flotilla-director` owns: locking, teardown ordering, force-mode
//!   failure policy, manifest validation
//!
//! ## Key Principle
//!
//! Every mutation of one deployment happens under that deployment's lock,
//! held for the whole operation. The teardown pipeline's intermediate
//! states are never observable by a concurrent operation on the same
//! deployment; operations on different deployments run fully in parallel.
//!
//! ## Usage
//!
//! ```no_run
//! use flotilla_director::{
//!     DeploymentOrchestrator, DirectorConfig, FakeCloudProvider, LockManager, PipelineParts,
//! };
//! use flotilla_network::{AddressAllocator, AddressRepository, InMemoryNameResolutionStore};
//! use flotilla_registry::{
//!     InMemoryDeploymentRegistry, InMemoryInstanceRegistry, InMemoryVariableSetRegistry,
//! };
//! use flotilla_types::{DeploymentName, TeardownOptions};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DirectorConfig::default();
//! let repo = Arc::new(AddressRepository::new(config.scope));
//! let orchestrator = DeploymentOrchestrator::new(
//!     config,
//!     Arc::new(LockManager::new()),
//!     Arc::new(InMemoryDeploymentRegistry::new()),
//!     Arc::new(InMemoryVariableSetRegistry::new()),
//!     PipelineParts {
//!         instances: Arc::new(InMemoryInstanceRegistry::new()),
//!         reclaimer: Arc::new(AddressAllocator::new(repo)),
//!         records: Arc::new(InMemoryNameResolutionStore::new()),
//!         cloud: Arc::new(FakeCloudProvider::new()),
//!     },
//! );
//!
//! let receipt = orchestrator
//!     .delete_deployment(&DeploymentName::new("shop"), TeardownOptions::default())
//!     .await?;
//! println!("{}", receipt.locator);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod cloud;
pub mod config;
pub mod error;
pub mod lock;
pub mod manifest;
pub mod orchestrator;
pub mod teardown;

// Re-exports
pub use cloud::{CloudError, CloudProvider, CloudResult, FakeCloudProvider};
pub use config::DirectorConfig;
pub use error::{DirectorError, Result};
pub use lock::{DeploymentLease, LockManager};
pub use manifest::{CloudConfigManager, CloudManifest, CloudManifestParser};
pub use orchestrator::{
    DeletionReceipt, DeploymentOrchestrator, PipelineParts, VariableUsage, VariableUser,
};
pub use teardown::{TeardownPipeline, TeardownReport};
