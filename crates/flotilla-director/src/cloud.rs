//! Cloud provider interface
//!
//! The seam to the IaaS backend. Flotilla only needs three calls from it:
//! drain a workload, destroy a VM, and clean up a VM's disk snapshots.
//! Destroying an unknown VM reports `NotFound`, which teardown treats as
//! success-equivalent so retries tolerate already-destroyed instances.

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use flotilla_types::VmHandle;
use thiserror::Error;

/// Cloud provider errors
#[derive(Debug, Error)]
pub enum CloudError {
    /// The VM does not exist (possibly destroyed by an earlier attempt)
    #[error("VM not found: {0}")]
    NotFound(VmHandle),

    /// Any other provider-side failure
    #[error("Provider error: {0}")]
    Provider(String),
}

/// Result type for cloud provider calls
pub type CloudResult<T> = std::result::Result<T, CloudError>;

/// The Cloud Provider Interface consumed by teardown
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Let the workload finish in-flight work before destruction
    async fn drain(&self, vm: &VmHandle) -> CloudResult<()>;

    /// Destroy the compute resource
    async fn destroy_vm(&self, vm: &VmHandle) -> CloudResult<()>;

    /// Remove local disk snapshots of the VM
    async fn delete_snapshots(&self, vm: &VmHandle) -> CloudResult<()>;
}

/// Scriptable in-memory provider for development and tests
///
/// Holds a set of live VMs and per-handle failure switches so tests can
/// exercise partial-failure teardown paths.
pub struct FakeCloudProvider {
    vms: DashMap<VmHandle, ()>,
    snapshots: DashMap<VmHandle, u32>,
    fail_destroy: DashSet<VmHandle>,
    fail_drain: DashSet<VmHandle>,
}

impl FakeCloudProvider {
    pub fn new() -> Self {
        Self {
            vms: DashMap::new(),
            snapshots: DashMap::new(),
            fail_destroy: DashSet::new(),
            fail_drain: DashSet::new(),
        }
    }

    /// Register a live VM with some snapshots
    pub fn add_vm(&self, vm: VmHandle) {
        self.snapshots.insert(vm.clone(), 2);
        self.vms.insert(vm, ());
    }

    /// Make subsequent destroy calls for this VM fail
    pub fn fail_destroy_for(&self, vm: VmHandle) {
        self.fail_destroy.insert(vm);
    }

    /// Make subsequent drain calls for this VM fail
    pub fn fail_drain_for(&self, vm: VmHandle) {
        self.fail_drain.insert(vm);
    }

    /// Clear failure switches (the provider "recovered")
    pub fn recover(&self) {
        self.fail_destroy.clear();
        self.fail_drain.clear();
    }

    /// Whether the VM still exists
    pub fn exists(&self, vm: &VmHandle) -> bool {
        self.vms.contains_key(vm)
    }

    /// Snapshot count for a VM handle (kept after destroy so tests can
    /// observe the keep-snapshots option)
    pub fn snapshot_count(&self, vm: &VmHandle) -> u32 {
        self.snapshots.get(vm).map(|s| *s).unwrap_or(0)
    }
}

impl Default for FakeCloudProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CloudProvider for FakeCloudProvider {
    async fn drain(&self, vm: &VmHandle) -> CloudResult<()> {
        if self.fail_drain.contains(vm) {
            return Err(CloudError::Provider(format!("drain refused for {}", vm)));
        }
        if !self.vms.contains_key(vm) {
            return Err(CloudError::NotFound(vm.clone()));
        }
        Ok(())
    }

    async fn destroy_vm(&self, vm: &VmHandle) -> CloudResult<()> {
        if self.fail_destroy.contains(vm) {
            return Err(CloudError::Provider(format!("destroy refused for {}", vm)));
        }
        if self.vms.remove(vm).is_none() {
            return Err(CloudError::NotFound(vm.clone()));
        }
        Ok(())
    }

    async fn delete_snapshots(&self, vm: &VmHandle) -> CloudResult<()> {
        self.snapshots.remove(vm);
        Ok(())
    }
}
