//! Instance types
//!
//! An Instance is one compute unit belonging to a deployment. It carries
//! the network addresses assigned to it and the opaque VM handle returned
//! by the cloud provider at creation time.

use crate::{DeploymentName, InstanceId, NetworkName, VmHandle};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// How an address was obtained, which determines how it is released
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressKind {
    /// Drawn from the network's dynamic pool; exclusively owned until
    /// released
    Dynamic,

    /// Explicitly requested fixed address
    Static,

    /// Virtual/floating address; rebindable between instances without an
    /// intermediate release
    Vip,
}

/// One address assigned to an instance on one network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressAssignment {
    /// Network the address belongs to
    pub network: NetworkName,

    /// The assigned address
    pub address: IpAddr,

    /// Reservation kind
    pub kind: AddressKind,
}

/// A compute instance belonging to a deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    /// Unique instance identifier
    pub id: InstanceId,

    /// Parent deployment
    pub deployment: DeploymentName,

    /// Job (instance group) name from the manifest
    pub job: String,

    /// Index within the job
    pub index: u32,

    /// Assigned addresses, one per attached network
    pub addresses: Vec<AddressAssignment>,

    /// Cloud provider handle; absent if the VM was never provisioned or
    /// was already destroyed
    pub vm: Option<VmHandle>,
}

impl Instance {
    /// Create an instance record with no addresses and no VM yet
    pub fn new(deployment: DeploymentName, job: impl Into<String>, index: u32) -> Self {
        Self {
            id: InstanceId::generate(),
            deployment,
            job: job.into(),
            index,
            addresses: Vec::new(),
            vm: None,
        }
    }

    /// The name under which this instance is registered in the name
    /// resolution store, e.g. `0.web.shop`
    pub fn resolution_name(&self) -> String {
        format!("{}.{}.{}", self.index, self.job, self.deployment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_name() {
        let instance = Instance::new(DeploymentName::new("shop"), "web", 2);
        assert_eq!(instance.resolution_name(), "2.web.shop");
    }
}
