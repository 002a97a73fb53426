//! Deployment repository trait

use crate::error::Result;
use async_trait::async_trait;
use flotilla_types::{Deployment, DeploymentLifecycle, DeploymentName};

/// Storage for deployment root records
///
/// Deployment records are protected by the deployment lock; the registry
/// itself performs no per-deployment serialization.
#[async_trait]
pub trait DeploymentRegistry: Send + Sync {
    /// Persist a new deployment; fails if the name is taken
    async fn create(&self, deployment: Deployment) -> Result<()>;

    /// Look up a deployment by name
    async fn find_by_name(&self, name: &DeploymentName) -> Result<Option<Deployment>>;

    /// Transition the lifecycle status
    async fn update_lifecycle(
        &self,
        name: &DeploymentName,
        lifecycle: DeploymentLifecycle,
    ) -> Result<()>;

    /// Remove the root record. Idempotent: removing an absent record is a
    /// no-op so teardown retries are safe.
    async fn delete(&self, name: &DeploymentName) -> Result<()>;

    /// List all deployments
    async fn list(&self) -> Result<Vec<Deployment>>;
}
