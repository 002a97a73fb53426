//! Flotilla Types - Core types for VM fleet lifecycle orchestration
//!
//! Flotilla is the control plane of a deployment orchestrator: it manages
//! the lifecycle of virtual machine fleets provisioned on an IaaS backend.
//! This crate holds the domain types shared by every other Flotilla crate.
//!
//! ## Key Concepts
//!
//! - **Deployment**: a named, independently lockable unit of managed
//!   infrastructure (a set of instances sharing a manifest)
//! - **Instance**: one compute unit belonging to a deployment, holding
//!   network address assignments and an opaque VM handle
//! - **VariableSet**: a versioned snapshot of the named credentials a
//!   deployment used at one point in time
//! - **CloudConfig**: an append-only, versioned cloud configuration
//! - **Teardown**: options, stages and events for ordered deployment
//!   destruction

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod cloud_config;
pub mod deployment;
pub mod ids;
pub mod instance;
pub mod teardown;
pub mod variables;

// Re-export main types
pub use cloud_config::CloudConfig;
pub use deployment::{Deployment, DeploymentLifecycle};
pub use ids::{DeploymentName, InstanceId, NetworkName, VmHandle};
pub use instance::{AddressAssignment, AddressKind, Instance};
pub use teardown::{
    DrainPolicy, TeardownEvent, TeardownOptions, TeardownStage, TeardownStep, TeardownWarning,
};
pub use variables::{Variable, VariableSet};
