//! Registry error types

use flotilla_types::{DeploymentName, InstanceId};
use thiserror::Error;

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Deployment not found: {0}")]
    DeploymentNotFound(DeploymentName),

    #[error("Deployment already exists: {0}")]
    DeploymentAlreadyExists(DeploymentName),

    #[error("Instance not found: {0}")]
    InstanceNotFound(InstanceId),

    #[error("Variable set {seq} not found for deployment {deployment}")]
    VariableSetNotFound {
        deployment: DeploymentName,
        seq: u64,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
