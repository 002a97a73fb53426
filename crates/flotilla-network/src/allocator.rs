//! Address allocator
//!
//! Issues and releases address reservations on top of the
//! [`AddressRepository`], enforcing no-double-allocation and idempotent
//! release. The allocator is the only writer of reservation state; every
//! operation takes the per-network guard for the duration of the mutation.

use crate::error::{NetworkError, Result};
use crate::pool::{AddressRepository, Reservation};
use async_trait::async_trait;
use flotilla_types::{DeploymentName, Instance, NetworkName};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;

/// The slice of the allocator that teardown consumes: giving addresses
/// back. Kept as a trait so teardown failure paths are testable.
#[async_trait]
pub trait AddressReclaimer: Send + Sync {
    /// Release one address reservation; idempotent
    async fn release(
        &self,
        deployment: &DeploymentName,
        network: &NetworkName,
        address: IpAddr,
    ) -> Result<()>;
}

/// Whether allocations actually commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocatorMode {
    /// Normal operation: reservations are recorded
    Commit,

    /// Validation mode: results are computed against current state and
    /// discarded. Used by structural manifest validation, which must not
    /// create reservations as a side effect.
    DryRun,
}

/// Hands out and reclaims address reservations
pub struct AddressAllocator {
    repo: Arc<AddressRepository>,
    mode: AllocatorMode,
}

impl AddressAllocator {
    /// A committing allocator over the shared repository
    pub fn new(repo: Arc<AddressRepository>) -> Self {
        Self {
            repo,
            mode: AllocatorMode::Commit,
        }
    }

    /// A dry-run allocator over the same repository
    pub fn dry_run(repo: Arc<AddressRepository>) -> Self {
        Self {
            repo,
            mode: AllocatorMode::DryRun,
        }
    }

    pub fn mode(&self) -> AllocatorMode {
        self.mode
    }

    /// Pick an available address from the network's dynamic pool.
    ///
    /// The pick is deterministic: first pool address that is neither
    /// reserved nor set aside for static use. Fails with `PoolExhausted`
    /// when none remain.
    pub async fn reserve_dynamic(
        &self,
        network: &NetworkName,
        instance: &Instance,
    ) -> Result<IpAddr> {
        let state = self.repo.state(network, &instance.deployment)?;
        let mut guard = state.lock().await;

        let address = match self.mode {
            AllocatorMode::Commit => guard.reserve_dynamic(&instance.id)?,
            AllocatorMode::DryRun => guard.clone().reserve_dynamic(&instance.id)?,
        };

        debug!(%network, %address, instance = %instance.id, mode = ?self.mode, "Reserved dynamic address");
        Ok(address)
    }

    /// Reserve a specific address; fails with `AddressAlreadyReserved`
    /// when held by a different owner
    pub async fn reserve_static(
        &self,
        network: &NetworkName,
        address: IpAddr,
        instance: &Instance,
    ) -> Result<()> {
        let state = self.repo.state(network, &instance.deployment)?;
        let mut guard = state.lock().await;

        match self.mode {
            AllocatorMode::Commit => guard.reserve_static(address, &instance.id)?,
            AllocatorMode::DryRun => guard.clone().reserve_static(address, &instance.id)?,
        }

        debug!(%network, %address, instance = %instance.id, "Reserved static address");
        Ok(())
    }

    /// Rebind a virtual/floating address to an instance without a prior
    /// release
    pub async fn bind_vip(
        &self,
        network: &NetworkName,
        address: IpAddr,
        instance: &Instance,
    ) -> Result<()> {
        let state = self.repo.state(network, &instance.deployment)?;
        let mut guard = state.lock().await;

        match self.mode {
            AllocatorMode::Commit => guard.bind_vip(address, &instance.id)?,
            AllocatorMode::DryRun => guard.clone().bind_vip(address, &instance.id)?,
        }

        debug!(%network, %address, instance = %instance.id, "Bound vip");
        Ok(())
    }

    /// Release an address reservation.
    ///
    /// Idempotent: releasing an address that is not reserved, or whose
    /// network is no longer configured, is a no-op. Teardown retries rely
    /// on this.
    pub async fn release(
        &self,
        deployment: &DeploymentName,
        network: &NetworkName,
        address: IpAddr,
    ) -> Result<()> {
        let state = match self.repo.state(network, deployment) {
            Ok(state) => state,
            Err(NetworkError::UnknownNetwork(_)) => return Ok(()),
            Err(e) => return Err(e),
        };

        if self.mode == AllocatorMode::Commit {
            state.lock().await.release(address);
            debug!(%network, %address, "Released address");
        }
        Ok(())
    }

    /// Active reservations on one network slice, for inspection and tests
    pub async fn reservations(
        &self,
        network: &NetworkName,
        deployment: &DeploymentName,
    ) -> Result<Vec<Reservation>> {
        let state = self.repo.state(network, deployment)?;
        let guard = state.lock().await;
        Ok(guard.reservations())
    }
}

#[async_trait]
impl AddressReclaimer for AddressAllocator {
    async fn release(
        &self,
        deployment: &DeploymentName,
        network: &NetworkName,
        address: IpAddr,
    ) -> Result<()> {
        AddressAllocator::release(self, deployment, network, address).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{NetworkPool, NetworkScope};
    use flotilla_types::AddressKind;
    use std::collections::HashSet;

    fn addr(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn repo_with_pool(pool: Vec<IpAddr>) -> Arc<AddressRepository> {
        let repo = Arc::new(AddressRepository::new(NetworkScope::Global));
        repo.register_network(NetworkPool::new(NetworkName::new("default"), pool));
        repo
    }

    fn instance(deployment: &str, index: u32) -> Instance {
        Instance::new(DeploymentName::new(deployment), "web", index)
    }

    #[tokio::test]
    async fn test_no_double_allocation_under_concurrency() {
        let repo = repo_with_pool(vec![
            addr("10.0.0.2"),
            addr("10.0.0.3"),
            addr("10.0.0.4"),
            addr("10.0.0.5"),
        ]);
        let allocator = Arc::new(AddressAllocator::new(repo));
        let network = NetworkName::new("default");

        let mut handles = Vec::new();
        for i in 0..4 {
            let allocator = allocator.clone();
            let network = network.clone();
            handles.push(tokio::spawn(async move {
                let instance = instance("shop", i);
                allocator.reserve_dynamic(&network, &instance).await.unwrap()
            }));
        }

        let mut picked = HashSet::new();
        for handle in handles {
            assert!(picked.insert(handle.await.unwrap()));
        }
        assert_eq!(picked.len(), 4);

        // Pool is now exhausted
        let overflow = allocator
            .reserve_dynamic(&network, &instance("shop", 9))
            .await;
        assert!(matches!(overflow, Err(NetworkError::PoolExhausted { .. })));
    }

    #[tokio::test]
    async fn test_dynamic_pick_is_deterministic_and_skips_static() {
        let repo = Arc::new(AddressRepository::new(NetworkScope::Global));
        repo.register_network(NetworkPool {
            name: NetworkName::new("default"),
            pool: vec![addr("10.0.0.2"), addr("10.0.0.3"), addr("10.0.0.4")],
            statically_reserved: vec![addr("10.0.0.2")],
        });
        let allocator = AddressAllocator::new(repo);
        let network = NetworkName::new("default");

        // 10.0.0.2 is set aside for static use; first dynamic pick is .3
        let first = allocator
            .reserve_dynamic(&network, &instance("shop", 0))
            .await
            .unwrap();
        assert_eq!(first, addr("10.0.0.3"));
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let repo = repo_with_pool(vec![addr("10.0.0.2"), addr("10.0.0.3")]);
        let allocator = AddressAllocator::new(repo);
        let network = NetworkName::new("default");
        let deployment = DeploymentName::new("shop");
        let owner = instance("shop", 0);

        let picked = allocator.reserve_dynamic(&network, &owner).await.unwrap();
        let other = allocator
            .reserve_dynamic(&network, &instance("shop", 1))
            .await
            .unwrap();

        allocator.release(&deployment, &network, picked).await.unwrap();
        // Releasing again never fails and never touches other reservations
        allocator.release(&deployment, &network, picked).await.unwrap();

        let reservations = allocator.reservations(&network, &deployment).await.unwrap();
        assert_eq!(reservations.len(), 1);
        assert_eq!(reservations[0].address, other);

        // Releasing on a network that is no longer configured is a no-op
        allocator
            .release(&deployment, &NetworkName::new("gone"), picked)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_static_reservation_conflicts() {
        let repo = repo_with_pool(vec![addr("10.0.0.2")]);
        let allocator = AddressAllocator::new(repo);
        let network = NetworkName::new("default");
        let holder = instance("shop", 0);
        let intruder = instance("shop", 1);

        allocator
            .reserve_static(&network, addr("10.0.0.50"), &holder)
            .await
            .unwrap();

        // Same owner re-reserving is a no-op
        allocator
            .reserve_static(&network, addr("10.0.0.50"), &holder)
            .await
            .unwrap();

        let conflict = allocator
            .reserve_static(&network, addr("10.0.0.50"), &intruder)
            .await;
        assert!(matches!(
            conflict,
            Err(NetworkError::AddressAlreadyReserved { .. })
        ));
    }

    #[tokio::test]
    async fn test_vip_rebinds_without_release() {
        let repo = repo_with_pool(vec![addr("10.0.0.2")]);
        let allocator = AddressAllocator::new(repo);
        let network = NetworkName::new("default");
        let deployment = DeploymentName::new("shop");
        let first = instance("shop", 0);
        let second = instance("shop", 1);
        let vip = addr("192.168.50.10");

        allocator.bind_vip(&network, vip, &first).await.unwrap();
        allocator.bind_vip(&network, vip, &second).await.unwrap();

        let reservations = allocator.reservations(&network, &deployment).await.unwrap();
        assert_eq!(reservations.len(), 1);
        assert_eq!(reservations[0].owner, second.id);
        assert_eq!(reservations[0].kind, AddressKind::Vip);
    }

    #[tokio::test]
    async fn test_dry_run_discards_results() {
        let repo = repo_with_pool(vec![addr("10.0.0.2")]);
        let dry = AddressAllocator::dry_run(repo.clone());
        let network = NetworkName::new("default");
        let deployment = DeploymentName::new("shop");
        let owner = instance("shop", 0);

        // Both calls compute the same pick because nothing commits
        let a = dry.reserve_dynamic(&network, &owner).await.unwrap();
        let b = dry.reserve_dynamic(&network, &owner).await.unwrap();
        assert_eq!(a, b);

        let committing = AddressAllocator::new(repo);
        let reservations = committing.reservations(&network, &deployment).await.unwrap();
        assert!(reservations.is_empty());
    }

    #[tokio::test]
    async fn test_per_deployment_scope_isolates_tables() {
        let repo = Arc::new(AddressRepository::new(NetworkScope::PerDeployment));
        repo.register_network(NetworkPool::new(
            NetworkName::new("default"),
            vec![addr("10.0.0.2")],
        ));
        let allocator = AddressAllocator::new(repo);
        let network = NetworkName::new("default");

        // Each deployment sees its own slice of the key space
        let a = allocator
            .reserve_dynamic(&network, &instance("shop", 0))
            .await
            .unwrap();
        let b = allocator
            .reserve_dynamic(&network, &instance("blog", 0))
            .await
            .unwrap();
        assert_eq!(a, b);
    }
}
