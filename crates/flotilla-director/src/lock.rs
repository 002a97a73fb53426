//! Deployment lock manager
//!
//! Grants mutually-exclusive named leases over deployment names. The lock
//! is the sole serialization point for operations touching the same
//! deployment; operations on different deployments proceed fully in
//! parallel. Leases are ephemeral, never persisted, and release on drop so
//! every exit path (including errors and panics) gives the lock back.

use crate::error::{DirectorError, Result};
use dashmap::DashMap;
use flotilla_types::DeploymentName;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// Exclusive possession of one deployment's mutation right
///
/// Held for the duration of one operation; dropping it releases the lock.
pub struct DeploymentLease {
    name: DeploymentName,
    _guard: OwnedMutexGuard<()>,
}

impl DeploymentLease {
    /// The deployment this lease covers
    pub fn name(&self) -> &DeploymentName {
        &self.name
    }
}

impl Drop for DeploymentLease {
    fn drop(&mut self) {
        debug!(deployment = %self.name, "Released deployment lock");
    }
}

/// Per-deployment named locks
///
/// Acquisition blocks up to the given timeout; a timeout fails the
/// operation with `LockTimeout` and performs no side effects. Leases are
/// not reentrant. Lock entries are retained for the life of the manager:
/// the set of deployment names is small and bounded by fleet size.
pub struct LockManager {
    locks: DashMap<DeploymentName, Arc<Mutex<()>>>,
}

impl LockManager {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Acquire the lock for `name`, waiting up to `timeout`
    pub async fn acquire(
        &self,
        name: &DeploymentName,
        timeout: Duration,
    ) -> Result<DeploymentLease> {
        let mutex = self
            .locks
            .entry(name.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = tokio::time::timeout(timeout, mutex.lock_owned())
            .await
            .map_err(|_| DirectorError::LockTimeout {
                deployment: name.clone(),
            })?;

        debug!(deployment = %name, "Acquired deployment lock");
        Ok(DeploymentLease {
            name: name.clone(),
            _guard: guard,
        })
    }
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new()
    }
}
