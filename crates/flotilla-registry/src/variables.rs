//! Variable set repository trait
//!
//! Variable sets are append-only per deployment, ordered by a monotonic
//! sequence number. Resolution by name must only ever consult a
//! deployment's latest *successfully deployed* set: an abandoned set would
//! otherwise misreport a credential as in use when it never actually
//! deployed.

use crate::error::Result;
use async_trait::async_trait;
use flotilla_types::{DeploymentName, Variable, VariableSet};

/// Storage and resolution for variable sets
#[async_trait]
pub trait VariableSetRegistry: Send + Sync {
    /// Append a new set for the deployment, assigning the next sequence
    /// number
    async fn append_set(
        &self,
        deployment: &DeploymentName,
        variables: Vec<Variable>,
        deployed_successfully: bool,
    ) -> Result<VariableSet>;

    /// Flag an existing set as successfully deployed
    async fn mark_deployed(&self, deployment: &DeploymentName, seq: u64) -> Result<()>;

    /// The most recent set with the deployed-successfully flag, if any
    async fn latest_successful(&self, deployment: &DeploymentName) -> Result<Option<VariableSet>>;

    /// For every deployment whose latest successful set contains a variable
    /// with this name, the pair `(deployment, variable_id)`.
    ///
    /// Deployments with no successful set, or whose latest successful set
    /// lacks the name, are excluded. Order is unspecified.
    async fn variables_by_name(&self, name: &str) -> Result<Vec<(DeploymentName, String)>>;

    /// Drop every set owned by the deployment. Invoked only after teardown
    /// reaches its terminal stage.
    async fn prune_for_deleted_deployment(&self, deployment: &DeploymentName) -> Result<()>;
}
