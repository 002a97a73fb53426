//! Instance repository trait

use crate::error::Result;
use async_trait::async_trait;
use flotilla_types::{DeploymentName, Instance, InstanceId, VmHandle};

/// Storage for instance records
#[async_trait]
pub trait InstanceRegistry: Send + Sync {
    /// Persist a new instance
    async fn register(&self, instance: Instance) -> Result<()>;

    /// Look up an instance by id
    async fn get(&self, id: &InstanceId) -> Result<Option<Instance>>;

    /// All instances belonging to one deployment
    async fn list_for_deployment(&self, deployment: &DeploymentName) -> Result<Vec<Instance>>;

    /// Record that the instance's VM is gone (destroyed by teardown)
    async fn clear_vm(&self, id: &InstanceId) -> Result<()>;

    /// Update the VM handle after provisioning
    async fn set_vm(&self, id: &InstanceId, vm: VmHandle) -> Result<()>;

    /// Remove the instance record. Idempotent for teardown retries.
    async fn remove(&self, id: &InstanceId) -> Result<()>;
}
