//! Per-network address reservation state
//!
//! Each network's state lives behind its own async lock so that all
//! mutating operations on one pool are linearized. This guard is
//! deliberately independent of the deployment-level lock manager: in
//! global networking mode, addresses are shared across deployments.

use crate::error::{NetworkError, Result};
use dashmap::DashMap;
use flotilla_types::{AddressKind, DeploymentName, InstanceId, NetworkName};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Configured address pool for one network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkPool {
    /// Network name
    pub name: NetworkName,

    /// Dynamic pool, in allocation order
    pub pool: Vec<IpAddr>,

    /// Addresses excluded from dynamic allocation because they are set
    /// aside for static use
    pub statically_reserved: Vec<IpAddr>,
}

impl NetworkPool {
    /// A pool with no statically reserved addresses
    pub fn new(name: NetworkName, pool: Vec<IpAddr>) -> Self {
        Self {
            name,
            pool,
            statically_reserved: Vec::new(),
        }
    }
}

/// Key space mode for reservation state
///
/// Production fleets run with global networking; the mode stays
/// configurable until per-deployment networking requirements are
/// confirmed against the rest of the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkScope {
    /// One reservation table per network, shared by all deployments
    Global,

    /// Separate reservation tables per (network, deployment)
    PerDeployment,
}

/// One active reservation, for inspection and tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub address: IpAddr,
    pub owner: InstanceId,
    pub kind: AddressKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StateKey {
    network: NetworkName,
    deployment: Option<DeploymentName>,
}

/// Mutable reservation table for one network (one key-space slice)
///
/// Only ever touched while holding the owning mutex.
#[derive(Debug, Clone)]
pub struct NetworkState {
    network: NetworkName,
    pool: Vec<IpAddr>,
    statically_excluded: HashSet<IpAddr>,
    reservations: HashMap<IpAddr, (InstanceId, AddressKind)>,
}

impl NetworkState {
    fn from_pool(pool: &NetworkPool) -> Self {
        Self {
            network: pool.name.clone(),
            pool: pool.pool.clone(),
            statically_excluded: pool.statically_reserved.iter().copied().collect(),
            reservations: HashMap::new(),
        }
    }

    /// Deterministic first-free pick from the dynamic pool
    pub(crate) fn reserve_dynamic(&mut self, owner: &InstanceId) -> Result<IpAddr> {
        let picked = self
            .pool
            .iter()
            .copied()
            .find(|addr| {
                !self.statically_excluded.contains(addr) && !self.reservations.contains_key(addr)
            })
            .ok_or_else(|| NetworkError::PoolExhausted {
                network: self.network.clone(),
            })?;

        self.reservations
            .insert(picked, (owner.clone(), AddressKind::Dynamic));
        Ok(picked)
    }

    /// Reserve a specific address. Re-reserving by the same owner is a
    /// no-op; any other holder is a conflict.
    pub(crate) fn reserve_static(&mut self, address: IpAddr, owner: &InstanceId) -> Result<()> {
        match self.reservations.get(&address) {
            Some((holder, _)) if holder != owner => Err(NetworkError::AddressAlreadyReserved {
                network: self.network.clone(),
                address,
            }),
            Some(_) => Ok(()),
            None => {
                self.reservations
                    .insert(address, (owner.clone(), AddressKind::Static));
                Ok(())
            }
        }
    }

    /// Bind a vip to an instance, redirecting any existing vip binding.
    /// A non-vip reservation held by another instance is a conflict.
    pub(crate) fn bind_vip(&mut self, address: IpAddr, owner: &InstanceId) -> Result<()> {
        if let Some((holder, kind)) = self.reservations.get(&address) {
            if *kind != AddressKind::Vip && holder != owner {
                return Err(NetworkError::AddressAlreadyReserved {
                    network: self.network.clone(),
                    address,
                });
            }
        }
        self.reservations
            .insert(address, (owner.clone(), AddressKind::Vip));
        Ok(())
    }

    /// Release an address. Idempotent: releasing an address that is not
    /// reserved is a no-op, never an error, so teardown may retry freely.
    pub(crate) fn release(&mut self, address: IpAddr) {
        self.reservations.remove(&address);
    }

    /// Snapshot of active reservations
    pub(crate) fn reservations(&self) -> Vec<Reservation> {
        self.reservations
            .iter()
            .map(|(address, (owner, kind))| Reservation {
                address: *address,
                owner: owner.clone(),
                kind: *kind,
            })
            .collect()
    }
}

/// Reservation state for all networks
///
/// Pools are registered up front (from the cloud config); per-key state is
/// materialized lazily on first use.
pub struct AddressRepository {
    scope: NetworkScope,
    pools: DashMap<NetworkName, NetworkPool>,
    states: DashMap<StateKey, Arc<Mutex<NetworkState>>>,
}

impl AddressRepository {
    pub fn new(scope: NetworkScope) -> Self {
        Self {
            scope,
            pools: DashMap::new(),
            states: DashMap::new(),
        }
    }

    /// Register (or replace) the configured pool for a network
    pub fn register_network(&self, pool: NetworkPool) {
        self.pools.insert(pool.name.clone(), pool);
    }

    /// The reservation table guarding the given network for the given
    /// deployment, per the configured scope
    pub(crate) fn state(
        &self,
        network: &NetworkName,
        deployment: &DeploymentName,
    ) -> Result<Arc<Mutex<NetworkState>>> {
        let key = StateKey {
            network: network.clone(),
            deployment: match self.scope {
                NetworkScope::Global => None,
                NetworkScope::PerDeployment => Some(deployment.clone()),
            },
        };

        if let Some(state) = self.states.get(&key) {
            return Ok(state.clone());
        }

        let pool = self
            .pools
            .get(network)
            .ok_or_else(|| NetworkError::UnknownNetwork(network.clone()))?;
        let state = Arc::new(Mutex::new(NetworkState::from_pool(&pool)));
        drop(pool);

        // Another task may have materialized the state concurrently; keep
        // whichever entry won.
        Ok(self
            .states
            .entry(key)
            .or_insert_with(|| state)
            .value()
            .clone())
    }
}
