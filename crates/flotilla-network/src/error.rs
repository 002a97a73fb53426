//! Network error types

use flotilla_types::NetworkName;
use std::net::IpAddr;
use thiserror::Error;

/// Network subsystem errors
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The dynamic pool has no free addresses left. Terminal until capacity
    /// is added or addresses are freed.
    #[error("Dynamic pool exhausted for network {network}")]
    PoolExhausted { network: NetworkName },

    /// The address is held by a different owner. Should not occur under
    /// correct locking; surfaced, never silently retried.
    #[error("Address {address} already reserved on network {network}")]
    AddressAlreadyReserved {
        network: NetworkName,
        address: IpAddr,
    },

    /// The network is not part of the configured cloud config
    #[error("Unknown network: {0}")]
    UnknownNetwork(NetworkName),

    /// Name resolution store failure
    #[error("Record store error: {0}")]
    RecordStore(String),
}

/// Result type for network operations
pub type Result<T> = std::result::Result<T, NetworkError>;
