//! Error types for the director

use flotilla_network::NetworkError;
use flotilla_registry::RegistryError;
use flotilla_types::{DeploymentName, InstanceId};
use std::net::IpAddr;
use thiserror::Error;

/// Director error type
#[derive(Debug, Error)]
pub enum DirectorError {
    /// The deployment lock could not be acquired in time. Retryable; the
    /// failed operation performed no side effects.
    #[error("Timed out acquiring lock for deployment {deployment}")]
    LockTimeout { deployment: DeploymentName },

    /// No such deployment. Terminal, user error.
    #[error("Deployment not found: {0}")]
    DeploymentNotFound(DeploymentName),

    /// Structural manifest validation failed, with the parser diagnostic
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    /// Drain call failed
    #[error("Failed to drain instance {instance}: {message}")]
    DrainFailed {
        instance: InstanceId,
        message: String,
    },

    /// Cloud provider could not destroy the VM
    #[error("Failed to destroy instance {instance}: {message}")]
    InstanceDestroyFailed {
        instance: InstanceId,
        message: String,
    },

    /// Address reclamation failed during teardown
    #[error("Failed to release address {address} for instance {instance}: {message}")]
    AddressReleaseFailed {
        instance: InstanceId,
        address: IpAddr,
        message: String,
    },

    /// Name resolution record removal failed during teardown
    #[error("Failed to remove resolution record {name}: {message}")]
    RecordRemovalFailed { name: String, message: String },

    /// Registry subsystem error
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Network subsystem error
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
}

/// Result type for director operations
pub type Result<T> = std::result::Result<T, DirectorError>;
