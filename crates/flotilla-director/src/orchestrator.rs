//! Deployment orchestrator
//!
//! Top-level entry point for deployment mutations. The orchestrator
//! acquires the deployment lock, drives the teardown pipeline, keeps the
//! registries consistent with which deployments are alive, and answers the
//! variable usage query.

use crate::config::DirectorConfig;
use crate::error::{DirectorError, Result};
use crate::lock::LockManager;
use crate::teardown::TeardownPipeline;
use flotilla_registry::{DeploymentRegistry, VariableSetRegistry};
use flotilla_types::{
    DeploymentLifecycle, DeploymentName, DrainPolicy, TeardownEvent, TeardownOptions,
    TeardownStage, TeardownWarning,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, instrument};

/// Result of a successful delete operation
///
/// Force-mode runs can succeed with skipped sub-steps; those are reported
/// alongside the locator.
#[derive(Debug, Clone, Serialize)]
pub struct DeletionReceipt {
    /// Reference locator for the now-deleted deployment,
    /// e.g. `/deployments/shop`
    pub locator: String,

    /// Sub-steps skipped under force mode
    pub warnings: Vec<TeardownWarning>,
}

/// One deployment using a queried variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableUser {
    /// Deployment name
    pub name: DeploymentName,

    /// The variable id the deployment's latest successful variable set
    /// points at
    pub version: String,
}

/// Answer to the "which deployments use variable X" query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableUsage {
    pub deployments: Vec<VariableUser>,
}

/// Top-level deployment lifecycle orchestrator
pub struct DeploymentOrchestrator {
    /// Director configuration
    config: DirectorConfig,
    /// Per-deployment locks
    locks: Arc<LockManager>,
    /// Deployment root records
    deployments: Arc<dyn DeploymentRegistry>,
    /// Variable set bookkeeping
    variables: Arc<dyn VariableSetRegistry>,
    /// Teardown pipeline
    pipeline: TeardownPipeline,
    /// Event channel (shared with the pipeline)
    event_tx: broadcast::Sender<TeardownEvent>,
}

impl DeploymentOrchestrator {
    pub fn new(
        config: DirectorConfig,
        locks: Arc<LockManager>,
        deployments: Arc<dyn DeploymentRegistry>,
        variables: Arc<dyn VariableSetRegistry>,
        pipeline_parts: PipelineParts,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(4096);
        let pipeline = TeardownPipeline::new(
            pipeline_parts.instances,
            pipeline_parts.reclaimer,
            pipeline_parts.records,
            pipeline_parts.cloud,
            config.max_in_flight,
            config.dns_enabled,
            event_tx.clone(),
        );

        Self {
            config,
            locks,
            deployments,
            variables,
            pipeline,
            event_tx,
        }
    }

    /// Delete a deployment and everything it owns.
    ///
    /// Serialized against any other mutation of the same deployment via
    /// the lock manager; the lease is held for the whole teardown and
    /// released on every exit path.
    #[instrument(skip(self, options), fields(deployment = %name, force = options.force))]
    pub async fn delete_deployment(
        &self,
        name: &DeploymentName,
        options: TeardownOptions,
    ) -> Result<DeletionReceipt> {
        // 1. Acquire the lock; a timeout performs no side effects
        let _lease = self.locks.acquire(name, self.config.lock_timeout).await?;

        // 2. Look up the deployment
        if self.deployments.find_by_name(name).await?.is_none() {
            return Err(DirectorError::DeploymentNotFound(name.clone()));
        }

        info!(deployment = %name, "Deleting deployment");
        self.emit_stage(name, TeardownStage::Deleting);
        self.deployments
            .update_lifecycle(name, DeploymentLifecycle::Deleting)
            .await?;

        // 3. Tear down all instances. A non-force failure propagates here,
        //    leaving the deployment in `Deleting` for a retry.
        let report = self
            .pipeline
            .delete_deployment_instances(name, DrainPolicy::AlwaysSkip, options)
            .await?;

        // 4. Only now that every instance is gone: drop the variable sets
        //    and the root record
        self.variables.prune_for_deleted_deployment(name).await?;
        self.deployments.delete(name).await?;

        self.emit_stage(name, TeardownStage::Deleted);
        let _ = self.event_tx.send(TeardownEvent::Completed {
            deployment: name.clone(),
        });
        info!(deployment = %name, warnings = report.warnings.len(), "Deployment deleted");

        // 5. Return the reference locator
        Ok(DeletionReceipt {
            locator: format!("/deployments/{}", name),
            warnings: report.warnings,
        })
    }

    /// Which deployments currently use the named variable, resolved per
    /// deployment through its latest successfully deployed variable set
    pub async fn variables_by_name(&self, name: &str) -> Result<VariableUsage> {
        let mut users: Vec<VariableUser> = self
            .variables
            .variables_by_name(name)
            .await?
            .into_iter()
            .map(|(deployment, version)| VariableUser {
                name: deployment,
                version,
            })
            .collect();

        // Deterministic output for API consumers
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(VariableUsage { deployments: users })
    }

    /// Subscribe to teardown lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<TeardownEvent> {
        self.event_tx.subscribe()
    }

    fn emit_stage(&self, deployment: &DeploymentName, stage: TeardownStage) {
        let _ = self.event_tx.send(TeardownEvent::StageEntered {
            deployment: deployment.clone(),
            stage,
        });
    }
}

/// The collaborators the teardown pipeline is built from
///
/// Grouped so `DeploymentOrchestrator::new` stays readable.
pub struct PipelineParts {
    pub instances: Arc<dyn flotilla_registry::InstanceRegistry>,
    pub reclaimer: Arc<dyn flotilla_network::AddressReclaimer>,
    pub records: Arc<dyn flotilla_network::NameResolutionStore>,
    pub cloud: Arc<dyn crate::cloud::CloudProvider>,
}
