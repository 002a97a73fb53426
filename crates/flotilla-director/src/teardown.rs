//! Teardown pipeline
//!
//! Orchestrates the ordered, fault-tolerant destruction of one
//! deployment's instances: drain, destroy VM, release addresses, remove
//! name resolution records, delete persisted instance records. Stages run
//! in the fixed order of [`TeardownStage`]; within a stage, instances are
//! processed with bounded concurrency.
//!
//! The caller must hold the deployment lock for the whole run: the
//! pipeline's intermediate states would otherwise be observable by a
//! concurrent operation.

use crate::cloud::{CloudError, CloudProvider};
use crate::error::{DirectorError, Result};
use flotilla_network::{AddressReclaimer, NameResolutionStore};
use flotilla_registry::InstanceRegistry;
use flotilla_types::{
    DeploymentName, DrainPolicy, Instance, TeardownEvent, TeardownOptions, TeardownStage,
    TeardownStep, TeardownWarning,
};
use futures::stream::StreamExt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Outcome of a completed teardown run
///
/// Under force mode the run can succeed while individual steps failed;
/// those are reported here so the caller can surface what was skipped.
#[derive(Debug, Default)]
pub struct TeardownReport {
    /// Step failures swallowed under force mode
    pub warnings: Vec<TeardownWarning>,
}

/// Ordered multi-stage teardown of a deployment's instances
pub struct TeardownPipeline {
    /// Instance records
    instances: Arc<dyn InstanceRegistry>,
    /// Address reclamation
    reclaimer: Arc<dyn AddressReclaimer>,
    /// Name resolution records
    records: Arc<dyn NameResolutionStore>,
    /// Cloud provider interface
    cloud: Arc<dyn CloudProvider>,
    /// Instances processed concurrently per stage
    max_in_flight: usize,
    /// Whether name resolution records are managed at all
    dns_enabled: bool,
    /// Event channel
    event_tx: broadcast::Sender<TeardownEvent>,
}

impl TeardownPipeline {
    pub fn new(
        instances: Arc<dyn InstanceRegistry>,
        reclaimer: Arc<dyn AddressReclaimer>,
        records: Arc<dyn NameResolutionStore>,
        cloud: Arc<dyn CloudProvider>,
        max_in_flight: usize,
        dns_enabled: bool,
        event_tx: broadcast::Sender<TeardownEvent>,
    ) -> Self {
        Self {
            instances,
            reclaimer,
            records,
            cloud,
            max_in_flight: max_in_flight.max(1),
            dns_enabled,
            event_tx,
        }
    }

    /// Tear down every instance of the deployment, in stage order.
    ///
    /// Non-force: the first step failure aborts the run, leaving completed
    /// work in place and the remainder intact for a retry. Force: failures
    /// in the destroy/release/remove-record steps are logged, accumulated
    /// as warnings and skipped.
    ///
    /// The deployment's root record is not touched here; the orchestrator
    /// removes it only after this returns successfully.
    pub async fn delete_deployment_instances(
        &self,
        deployment: &DeploymentName,
        drain_policy: DrainPolicy,
        options: TeardownOptions,
    ) -> Result<TeardownReport> {
        let instances = self.instances.list_for_deployment(deployment).await?;
        let mut report = TeardownReport::default();

        info!(
            %deployment,
            instances = instances.len(),
            force = options.force,
            "Tearing down deployment instances"
        );

        self.enter_stage(deployment, TeardownStage::Draining);
        if drain_policy == DrainPolicy::AskInstance {
            let warnings = self
                .run_stage(&instances, TeardownStep::Drain, options)
                .await?;
            report.warnings.extend(warnings);
        }

        self.enter_stage(deployment, TeardownStage::Destroying);
        let warnings = self
            .run_stage(&instances, TeardownStep::DestroyVm, options)
            .await?;
        report.warnings.extend(warnings);

        self.enter_stage(deployment, TeardownStage::ReleasingResources);
        let warnings = self
            .run_stage(&instances, TeardownStep::ReleaseAddress, options)
            .await?;
        report.warnings.extend(warnings);

        self.enter_stage(deployment, TeardownStage::RemovingRecords);
        if self.dns_enabled {
            let warnings = self
                .run_stage(&instances, TeardownStep::RemoveRecord, options)
                .await?;
            report.warnings.extend(warnings);
        }

        self.enter_stage(deployment, TeardownStage::PersistingDeletion);
        let warnings = self
            .run_stage(&instances, TeardownStep::DeleteRecord, options)
            .await?;
        report.warnings.extend(warnings);

        Ok(report)
    }

    // --- Internal helpers ---

    /// Run one step across all instances with bounded concurrency
    async fn run_stage(
        &self,
        instances: &[Instance],
        step: TeardownStep,
        options: TeardownOptions,
    ) -> Result<Vec<TeardownWarning>> {
        let mut stream = futures::stream::iter(
            instances
                .iter()
                .cloned()
                .map(|instance| self.run_step(instance, step, options)),
        )
        .buffer_unordered(self.max_in_flight);

        let mut warnings = Vec::new();
        while let Some(result) = stream.next().await {
            warnings.extend(result?);
        }
        Ok(warnings)
    }

    /// Run one step for one instance, absorbing failures under force mode
    async fn run_step(
        &self,
        instance: Instance,
        step: TeardownStep,
        options: TeardownOptions,
    ) -> Result<Vec<TeardownWarning>> {
        match step {
            // Drain failures abort in every mode; whole-deployment deletes
            // skip draining entirely via the drain policy.
            TeardownStep::Drain => {
                if let Some(vm) = &instance.vm {
                    self.cloud
                        .drain(vm)
                        .await
                        .map_err(|e| DirectorError::DrainFailed {
                            instance: instance.id.clone(),
                            message: e.to_string(),
                        })?;
                }
                Ok(Vec::new())
            }

            TeardownStep::DestroyVm => {
                let result = self.destroy_vm(&instance, options).await;
                self.absorb(result, &instance, step, options)
            }

            TeardownStep::ReleaseAddress => {
                let mut warnings = Vec::new();
                for assignment in &instance.addresses {
                    let result = self
                        .reclaimer
                        .release(&instance.deployment, &assignment.network, assignment.address)
                        .await
                        .map_err(|e| DirectorError::AddressReleaseFailed {
                            instance: instance.id.clone(),
                            address: assignment.address,
                            message: e.to_string(),
                        });
                    warnings.extend(self.absorb(result, &instance, step, options)?);
                }
                Ok(warnings)
            }

            TeardownStep::RemoveRecord => {
                let name = instance.resolution_name();
                let result = self
                    .records
                    .remove_record(&name)
                    .await
                    .map_err(|e| DirectorError::RecordRemovalFailed {
                        name,
                        message: e.to_string(),
                    });
                self.absorb(result, &instance, step, options)
            }

            // Record deletion failures abort in every mode: losing the
            // record while resources linger would strand them forever.
            TeardownStep::DeleteRecord => {
                self.instances.remove(&instance.id).await?;
                Ok(Vec::new())
            }
        }
    }

    /// Destroy the instance's VM, tolerating an already-destroyed VM so
    /// delete retries converge
    async fn destroy_vm(&self, instance: &Instance, options: TeardownOptions) -> Result<()> {
        let Some(vm) = instance.vm.clone() else {
            return Ok(());
        };

        match self.cloud.destroy_vm(&vm).await {
            Ok(()) | Err(CloudError::NotFound(_)) => {}
            Err(e) => {
                return Err(DirectorError::InstanceDestroyFailed {
                    instance: instance.id.clone(),
                    message: e.to_string(),
                });
            }
        }

        if !options.keep_snapshots {
            self.cloud.delete_snapshots(&vm).await.map_err(|e| {
                DirectorError::InstanceDestroyFailed {
                    instance: instance.id.clone(),
                    message: format!("snapshot cleanup: {}", e),
                }
            })?;
        }

        self.instances.clear_vm(&instance.id).await?;
        Ok(())
    }

    /// Convert a step failure into a warning under force mode
    fn absorb(
        &self,
        result: Result<()>,
        instance: &Instance,
        step: TeardownStep,
        options: TeardownOptions,
    ) -> Result<Vec<TeardownWarning>> {
        match result {
            Ok(()) => Ok(Vec::new()),
            Err(e) if options.force => {
                warn!(
                    instance = %instance.id,
                    deployment = %instance.deployment,
                    step = ?step,
                    error = %e,
                    "Teardown step failed; continuing under force mode"
                );
                let warning = TeardownWarning {
                    instance: instance.id.clone(),
                    step,
                    message: e.to_string(),
                };
                let _ = self.event_tx.send(TeardownEvent::StepSkipped {
                    deployment: instance.deployment.clone(),
                    warning: warning.clone(),
                });
                Ok(vec![warning])
            }
            Err(e) => Err(e),
        }
    }

    fn enter_stage(&self, deployment: &DeploymentName, stage: TeardownStage) {
        info!(%deployment, %stage, "Entering teardown stage");
        let _ = self.event_tx.send(TeardownEvent::StageEntered {
            deployment: deployment.clone(),
            stage,
        });
    }
}
