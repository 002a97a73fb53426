//! Deployment record types
//!
//! A Deployment is the unit of locking and teardown: a named set of
//! instances sharing one manifest.

use crate::DeploymentName;
use serde::{Deserialize, Serialize};

/// A managed deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    /// Unique deployment name
    pub name: DeploymentName,

    /// Current manifest content as submitted by the operator
    pub manifest: String,

    /// Sequence of the cloud config version this deployment was last
    /// deployed against; absent before the first deploy resolves one
    pub cloud_config_seq: Option<u64>,

    /// Lifecycle status
    pub lifecycle: DeploymentLifecycle,

    /// Created timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,

    /// Last updated timestamp
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Deployment {
    /// Create a new active deployment record
    pub fn new(name: DeploymentName, manifest: impl Into<String>) -> Self {
        let now = chrono::Utc::now();
        Self {
            name,
            manifest: manifest.into(),
            cloud_config_seq: None,
            lifecycle: DeploymentLifecycle::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Deployment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeploymentLifecycle {
    /// Deployment is live and mutable
    Active,

    /// Teardown has started; the deployment is partially destroyed and a
    /// delete retry is the only sensible next operation
    Deleting,

    /// Teardown completed; only the tombstone remains
    Deleted,
}

impl DeploymentLifecycle {
    /// Whether this state admits no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentLifecycle::Deleted)
    }
}

impl std::fmt::Display for DeploymentLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeploymentLifecycle::Active => "active",
            DeploymentLifecycle::Deleting => "deleting",
            DeploymentLifecycle::Deleted => "deleted",
        };
        write!(f, "{}", s)
    }
}
