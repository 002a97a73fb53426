//! Teardown options, stages and events

use crate::{DeploymentName, InstanceId};
use serde::{Deserialize, Serialize};

/// Options recognized by the delete path
///
/// Exactly two switches, with fixed meanings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TeardownOptions {
    /// Continue past per-step infrastructure failures instead of aborting;
    /// failures are recorded as warnings on an overall success
    pub force: bool,

    /// Skip the snapshot cleanup sub-step when destroying a VM, leaving
    /// disk snapshots in the cloud
    pub keep_snapshots: bool,
}

impl TeardownOptions {
    /// Force mode with snapshots cleaned up
    pub fn force() -> Self {
        Self {
            force: true,
            keep_snapshots: false,
        }
    }
}

/// Whether an instance should be drained before destruction
///
/// Whole-deployment deletion always skips draining: nothing will receive
/// traffic afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrainPolicy {
    /// Never drain
    AlwaysSkip,

    /// Drain unless the instance has no running VM
    AskInstance,
}

/// Stages of the teardown state machine, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TeardownStage {
    /// Lock held, teardown starting
    Deleting,
    /// Draining workloads (skipped for whole-deployment deletes)
    Draining,
    /// Destroying compute resources
    Destroying,
    /// Releasing address reservations
    ReleasingResources,
    /// Removing name resolution records
    RemovingRecords,
    /// Deleting persisted state
    PersistingDeletion,
    /// Terminal: everything gone
    Deleted,
}

impl std::fmt::Display for TeardownStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TeardownStage::Deleting => "deleting",
            TeardownStage::Draining => "draining",
            TeardownStage::Destroying => "destroying",
            TeardownStage::ReleasingResources => "releasing_resources",
            TeardownStage::RemovingRecords => "removing_records",
            TeardownStage::PersistingDeletion => "persisting_deletion",
            TeardownStage::Deleted => "deleted",
        };
        write!(f, "{}", s)
    }
}

/// The per-instance teardown steps that can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeardownStep {
    /// Drain the workload
    Drain,
    /// Destroy the VM (including optional snapshot cleanup)
    DestroyVm,
    /// Release one address reservation
    ReleaseAddress,
    /// Remove the name resolution record
    RemoveRecord,
    /// Delete the persisted instance record
    DeleteRecord,
}

/// A step failure swallowed under force mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeardownWarning {
    /// Instance the step belonged to
    pub instance: InstanceId,

    /// Which step failed
    pub step: TeardownStep,

    /// The underlying error, stringified
    pub message: String,
}

/// Observable teardown lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TeardownEvent {
    /// The pipeline entered a new stage
    StageEntered {
        deployment: DeploymentName,
        stage: TeardownStage,
    },

    /// A per-instance step failed and was skipped under force mode
    StepSkipped {
        deployment: DeploymentName,
        warning: TeardownWarning,
    },

    /// Teardown reached the terminal stage
    Completed { deployment: DeploymentName },
}
