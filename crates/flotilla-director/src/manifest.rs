//! Cloud config parsing, structural validation and versioning
//!
//! A submitted cloud configuration is validated structurally before it is
//! persisted: the manifest is parsed and each manual network's pool is
//! exercised through the allocator in dry-run mode, so validation computes
//! real answers but creates no reservations and no records. On success the
//! configuration is appended as the newest version; versions are never
//! mutated in place.

use crate::error::{DirectorError, Result};
use flotilla_network::{AddressAllocator, AddressRepository, NetworkPool, NetworkScope};
use flotilla_registry::CloudConfigRegistry;
use flotilla_types::{CloudConfig, DeploymentName, Instance, NetworkName};
use serde::Deserialize;
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Debug, Deserialize)]
struct RawCloudConfig {
    networks: Vec<RawNetwork>,
    #[serde(default)]
    vm_types: Vec<RawVmType>,
}

#[derive(Debug, Deserialize)]
struct RawNetwork {
    name: String,
    #[serde(rename = "type")]
    kind: RawNetworkKind,
    #[serde(default)]
    pool: Vec<IpAddr>,
    #[serde(default, rename = "static")]
    statically_reserved: Vec<IpAddr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawNetworkKind {
    Manual,
    Dynamic,
    Vip,
}

#[derive(Debug, Deserialize)]
struct RawVmType {
    name: String,
}

/// A structurally valid cloud configuration
#[derive(Debug, Clone)]
pub struct CloudManifest {
    /// Address pools declared by the manifest
    pub pools: Vec<NetworkPool>,

    /// Declared VM type names
    pub vm_types: Vec<String>,
}

/// Structural validator for cloud configurations
///
/// Side-effect free: works against a scratch repository built from the
/// manifest itself, with the allocator in dry-run mode.
pub struct CloudManifestParser {
    scope: NetworkScope,
}

impl CloudManifestParser {
    pub fn new(scope: NetworkScope) -> Self {
        Self { scope }
    }

    /// Parse and validate a cloud config manifest
    pub async fn parse(&self, manifest: &str) -> Result<CloudManifest> {
        let raw: RawCloudConfig = serde_yaml_ng::from_str(manifest)
            .map_err(|e| DirectorError::InvalidManifest(e.to_string()))?;

        if raw.networks.is_empty() {
            return Err(DirectorError::InvalidManifest(
                "at least one network is required".into(),
            ));
        }

        let mut seen = HashSet::new();
        for network in &raw.networks {
            if network.name.is_empty() {
                return Err(DirectorError::InvalidManifest(
                    "network name must not be empty".into(),
                ));
            }
            if !seen.insert(network.name.clone()) {
                return Err(DirectorError::InvalidManifest(format!(
                    "duplicate network name: {}",
                    network.name
                )));
            }
            if network.kind == RawNetworkKind::Manual && network.pool.is_empty() {
                return Err(DirectorError::InvalidManifest(format!(
                    "manual network {} declares no pool",
                    network.name
                )));
            }
        }

        let mut seen_vm_types = HashSet::new();
        for vm_type in &raw.vm_types {
            if !seen_vm_types.insert(vm_type.name.clone()) {
                return Err(DirectorError::InvalidManifest(format!(
                    "duplicate vm type: {}",
                    vm_type.name
                )));
            }
        }

        let pools: Vec<NetworkPool> = raw
            .networks
            .iter()
            .map(|n| NetworkPool {
                name: NetworkName::new(&n.name),
                pool: n.pool.clone(),
                statically_reserved: n.statically_reserved.clone(),
            })
            .collect();

        // Exercise each manual pool through the allocator in dry-run mode:
        // an unallocatable pool (e.g. fully statically reserved) is a
        // structural error. Nothing is recorded anywhere.
        let repo = Arc::new(AddressRepository::new(self.scope));
        for pool in &pools {
            repo.register_network(pool.clone());
        }
        let probe_allocator = AddressAllocator::dry_run(repo);
        let probe = Instance::new(DeploymentName::new("cloud-config-validation"), "probe", 0);

        for network in &raw.networks {
            if network.kind == RawNetworkKind::Manual {
                probe_allocator
                    .reserve_dynamic(&NetworkName::new(&network.name), &probe)
                    .await
                    .map_err(|e| {
                        DirectorError::InvalidManifest(format!("network {}: {}", network.name, e))
                    })?;
            }
        }

        Ok(CloudManifest {
            pools,
            vm_types: raw.vm_types.into_iter().map(|v| v.name).collect(),
        })
    }
}

/// Validate-then-append manager for cloud config versions
pub struct CloudConfigManager {
    parser: CloudManifestParser,
    configs: Arc<dyn CloudConfigRegistry>,
}

impl CloudConfigManager {
    pub fn new(scope: NetworkScope, configs: Arc<dyn CloudConfigRegistry>) -> Self {
        Self {
            parser: CloudManifestParser::new(scope),
            configs,
        }
    }

    /// Validate the manifest and persist it as the newest version
    #[instrument(skip(self, manifest))]
    pub async fn update(&self, manifest: &str) -> Result<CloudConfig> {
        self.parser.parse(manifest).await?;
        let config = self.configs.append(manifest.to_string()).await?;
        info!(seq = config.seq, "Cloud config updated");
        Ok(config)
    }

    /// Up to `limit` versions, newest first
    pub async fn list(&self, limit: usize) -> Result<Vec<CloudConfig>> {
        Ok(self.configs.list(limit).await?)
    }

    /// The newest version, if any
    pub async fn latest(&self) -> Result<Option<CloudConfig>> {
        Ok(self.configs.latest().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flotilla_network::{InMemoryNameResolutionStore, NameResolutionStore};
    use flotilla_registry::InMemoryCloudConfigRegistry;

    const VALID_MANIFEST: &str = "\
networks:
- name: default
  type: manual
  pool:
  - 10.0.0.2
  - 10.0.0.3
  static:
  - 10.0.0.2
- name: vips
  type: vip
vm_types:
- name: small
- name: large
";

    fn manager() -> CloudConfigManager {
        CloudConfigManager::new(
            NetworkScope::Global,
            Arc::new(InMemoryCloudConfigRegistry::new()),
        )
    }

    #[tokio::test]
    async fn test_valid_manifest_is_appended() {
        let manager = manager();

        let first = manager.update(VALID_MANIFEST).await.unwrap();
        assert_eq!(first.seq, 1);
        let second = manager.update(VALID_MANIFEST).await.unwrap();
        assert_eq!(second.seq, 2);

        // Newest first
        let listed = manager.list(10).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].seq, 2);
        assert_eq!(manager.latest().await.unwrap().unwrap().seq, 2);
    }

    #[tokio::test]
    async fn test_unparseable_yaml_is_rejected_with_diagnostic() {
        let manager = manager();

        let result = manager.update("networks: [=").await;
        match result {
            Err(DirectorError::InvalidManifest(diag)) => assert!(!diag.is_empty()),
            other => panic!("expected InvalidManifest, got {:?}", other.map(|c| c.seq)),
        }

        // Nothing was appended
        assert!(manager.latest().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_network_names_are_rejected() {
        let manifest = "\
networks:
- name: default
  type: manual
  pool: [10.0.0.2]
- name: default
  type: vip
";
        let result = manager().update(manifest).await;
        assert!(matches!(result, Err(DirectorError::InvalidManifest(_))));
    }

    #[tokio::test]
    async fn test_fully_static_manual_pool_is_rejected() {
        // Every pool address is set aside for static use, so no dynamic
        // reservation could ever succeed
        let manifest = "\
networks:
- name: default
  type: manual
  pool: [10.0.0.2]
  static: [10.0.0.2]
";
        let result = manager().update(manifest).await;
        assert!(matches!(result, Err(DirectorError::InvalidManifest(_))));
    }

    #[tokio::test]
    async fn test_validation_has_no_reservation_or_record_side_effects() {
        let records = Arc::new(InMemoryNameResolutionStore::new());
        let shared_repo = Arc::new(AddressRepository::new(NetworkScope::Global));
        shared_repo.register_network(NetworkPool::new(
            NetworkName::new("default"),
            vec!["10.0.0.2".parse().unwrap()],
        ));

        manager().update(VALID_MANIFEST).await.unwrap();

        // The live allocator state and record store are untouched
        let allocator = AddressAllocator::new(shared_repo);
        let reservations = allocator
            .reservations(&NetworkName::new("default"), &DeploymentName::new("any"))
            .await
            .unwrap();
        assert!(reservations.is_empty());
        assert!(records.is_empty());
        assert_eq!(records.lookup("0.probe.any").await.unwrap(), None);
    }
}
