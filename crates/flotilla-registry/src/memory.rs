//! In-memory implementations of the registry traits
//!
//! These are suitable for development and testing. Production deployments
//! should use persistent backends behind the same traits.

use crate::cloud_config::CloudConfigRegistry;
use crate::deployment::DeploymentRegistry;
use crate::error::{RegistryError, Result};
use crate::instance::InstanceRegistry;
use crate::variables::VariableSetRegistry;
use async_trait::async_trait;
use dashmap::DashMap;
use flotilla_types::{
    CloudConfig, Deployment, DeploymentLifecycle, DeploymentName, Instance, InstanceId, Variable,
    VariableSet, VmHandle,
};
use tokio::sync::RwLock;

/// In-memory deployment registry
pub struct InMemoryDeploymentRegistry {
    deployments: DashMap<DeploymentName, Deployment>,
}

impl InMemoryDeploymentRegistry {
    pub fn new() -> Self {
        Self {
            deployments: DashMap::new(),
        }
    }
}

impl Default for InMemoryDeploymentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeploymentRegistry for InMemoryDeploymentRegistry {
    async fn create(&self, deployment: Deployment) -> Result<()> {
        let name = deployment.name.clone();

        if self.deployments.contains_key(&name) {
            return Err(RegistryError::DeploymentAlreadyExists(name));
        }

        self.deployments.insert(name, deployment);
        Ok(())
    }

    async fn find_by_name(&self, name: &DeploymentName) -> Result<Option<Deployment>> {
        Ok(self.deployments.get(name).map(|d| d.clone()))
    }

    async fn update_lifecycle(
        &self,
        name: &DeploymentName,
        lifecycle: DeploymentLifecycle,
    ) -> Result<()> {
        if let Some(mut deployment) = self.deployments.get_mut(name) {
            deployment.lifecycle = lifecycle;
            deployment.updated_at = chrono::Utc::now();
            Ok(())
        } else {
            Err(RegistryError::DeploymentNotFound(name.clone()))
        }
    }

    async fn delete(&self, name: &DeploymentName) -> Result<()> {
        self.deployments.remove(name);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Deployment>> {
        Ok(self.deployments.iter().map(|d| d.value().clone()).collect())
    }
}

/// In-memory instance registry
pub struct InMemoryInstanceRegistry {
    instances: DashMap<InstanceId, Instance>,
    by_deployment: DashMap<DeploymentName, Vec<InstanceId>>,
}

impl InMemoryInstanceRegistry {
    pub fn new() -> Self {
        Self {
            instances: DashMap::new(),
            by_deployment: DashMap::new(),
        }
    }
}

impl Default for InMemoryInstanceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InstanceRegistry for InMemoryInstanceRegistry {
    async fn register(&self, instance: Instance) -> Result<()> {
        let id = instance.id.clone();
        let deployment = instance.deployment.clone();

        self.instances.insert(id.clone(), instance);

        // Index by deployment
        self.by_deployment.entry(deployment).or_default().push(id);

        Ok(())
    }

    async fn get(&self, id: &InstanceId) -> Result<Option<Instance>> {
        Ok(self.instances.get(id).map(|i| i.clone()))
    }

    async fn list_for_deployment(&self, deployment: &DeploymentName) -> Result<Vec<Instance>> {
        let mut result = Vec::new();
        if let Some(ids) = self.by_deployment.get(deployment) {
            for id in ids.iter() {
                if let Some(instance) = self.instances.get(id) {
                    result.push(instance.clone());
                }
            }
        }
        Ok(result)
    }

    async fn clear_vm(&self, id: &InstanceId) -> Result<()> {
        if let Some(mut instance) = self.instances.get_mut(id) {
            instance.vm = None;
            Ok(())
        } else {
            Err(RegistryError::InstanceNotFound(id.clone()))
        }
    }

    async fn set_vm(&self, id: &InstanceId, vm: VmHandle) -> Result<()> {
        if let Some(mut instance) = self.instances.get_mut(id) {
            instance.vm = Some(vm);
            Ok(())
        } else {
            Err(RegistryError::InstanceNotFound(id.clone()))
        }
    }

    async fn remove(&self, id: &InstanceId) -> Result<()> {
        if let Some((_, instance)) = self.instances.remove(id) {
            // Remove from deployment index
            if let Some(mut ids) = self.by_deployment.get_mut(&instance.deployment) {
                ids.retain(|i| i != id);
            }
        }
        Ok(())
    }
}

/// In-memory variable set registry
///
/// Sets are kept per deployment in ascending sequence order.
pub struct InMemoryVariableSetRegistry {
    sets: DashMap<DeploymentName, Vec<VariableSet>>,
}

impl InMemoryVariableSetRegistry {
    pub fn new() -> Self {
        Self {
            sets: DashMap::new(),
        }
    }
}

impl Default for InMemoryVariableSetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VariableSetRegistry for InMemoryVariableSetRegistry {
    async fn append_set(
        &self,
        deployment: &DeploymentName,
        variables: Vec<Variable>,
        deployed_successfully: bool,
    ) -> Result<VariableSet> {
        let mut sets = self.sets.entry(deployment.clone()).or_default();
        let seq = sets.last().map(|s| s.seq + 1).unwrap_or(1);

        let set = VariableSet {
            deployment: deployment.clone(),
            seq,
            deployed_successfully,
            created_at: chrono::Utc::now(),
            variables,
        };

        sets.push(set.clone());
        Ok(set)
    }

    async fn mark_deployed(&self, deployment: &DeploymentName, seq: u64) -> Result<()> {
        if let Some(mut sets) = self.sets.get_mut(deployment) {
            if let Some(set) = sets.iter_mut().find(|s| s.seq == seq) {
                set.deployed_successfully = true;
                return Ok(());
            }
        }
        Err(RegistryError::VariableSetNotFound {
            deployment: deployment.clone(),
            seq,
        })
    }

    async fn latest_successful(&self, deployment: &DeploymentName) -> Result<Option<VariableSet>> {
        Ok(self.sets.get(deployment).and_then(|sets| {
            sets.iter()
                .rev()
                .find(|s| s.deployed_successfully)
                .cloned()
        }))
    }

    async fn variables_by_name(&self, name: &str) -> Result<Vec<(DeploymentName, String)>> {
        let mut result = Vec::new();

        for entry in self.sets.iter() {
            // Only the latest successful set of each deployment counts
            let latest = entry.value().iter().rev().find(|s| s.deployed_successfully);
            if let Some(set) = latest {
                if let Some(variable) = set.find(name) {
                    result.push((entry.key().clone(), variable.variable_id.clone()));
                }
            }
        }

        Ok(result)
    }

    async fn prune_for_deleted_deployment(&self, deployment: &DeploymentName) -> Result<()> {
        self.sets.remove(deployment);
        Ok(())
    }
}

/// In-memory cloud config registry
///
/// A single append-only list under a lock: versions carry a global,
/// monotonically increasing sequence.
pub struct InMemoryCloudConfigRegistry {
    configs: RwLock<Vec<CloudConfig>>,
}

impl InMemoryCloudConfigRegistry {
    pub fn new() -> Self {
        Self {
            configs: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryCloudConfigRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CloudConfigRegistry for InMemoryCloudConfigRegistry {
    async fn append(&self, manifest: String) -> Result<CloudConfig> {
        let mut configs = self.configs.write().await;
        let seq = configs.last().map(|c| c.seq + 1).unwrap_or(1);

        let config = CloudConfig {
            seq,
            manifest,
            created_at: chrono::Utc::now(),
        };

        configs.push(config.clone());
        Ok(config)
    }

    async fn list(&self, limit: usize) -> Result<Vec<CloudConfig>> {
        let configs = self.configs.read().await;
        Ok(configs.iter().rev().take(limit).cloned().collect())
    }

    async fn latest(&self) -> Result<Option<CloudConfig>> {
        let configs = self.configs.read().await;
        Ok(configs.last().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> DeploymentName {
        DeploymentName::new(s)
    }

    #[tokio::test]
    async fn test_variables_by_name_resolves_across_deployments() {
        let registry = InMemoryVariableSetRegistry::new();

        // Mirrors the two-deployment credential tracking scenario: the same
        // variable name resolves per deployment through its latest
        // successful set.
        registry
            .append_set(
                &name("test_deployment_1"),
                vec![
                    Variable::new("/Test Director/test_deployment/var_name_1", "var_id_1"),
                    Variable::new("/Test Director/test_deployment/var_name_2", "var_id_2"),
                ],
                true,
            )
            .await
            .unwrap();
        registry
            .append_set(
                &name("test_deployment_2"),
                vec![
                    Variable::new("/Test Director/test_deployment/var_name_1", "var_id_1"),
                    Variable::new("/Test Director/test_deployment/var_name_3", "var_id_3"),
                ],
                true,
            )
            .await
            .unwrap();

        let mut users = registry
            .variables_by_name("/Test Director/test_deployment/var_name_1")
            .await
            .unwrap();
        users.sort();
        assert_eq!(
            users,
            vec![
                (name("test_deployment_1"), "var_id_1".to_string()),
                (name("test_deployment_2"), "var_id_1".to_string()),
            ]
        );

        let users = registry
            .variables_by_name("/Test Director/test_deployment/var_name_2")
            .await
            .unwrap();
        assert_eq!(users, vec![(name("test_deployment_1"), "var_id_2".to_string())]);

        let users = registry
            .variables_by_name("/Test Director/test_deployment/nope")
            .await
            .unwrap();
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn test_variables_by_name_ignores_failed_latest_set() {
        let registry = InMemoryVariableSetRegistry::new();
        let deployment = name("shop");

        // Older set deployed fine and referenced the name
        registry
            .append_set(
                &deployment,
                vec![Variable::new("/d/shop/db", "id-old")],
                true,
            )
            .await
            .unwrap();

        // Newer set also references the name but never deployed
        registry
            .append_set(
                &deployment,
                vec![Variable::new("/d/shop/db", "id-new")],
                false,
            )
            .await
            .unwrap();

        // The latest successful set wins, not the latest set
        let users = registry.variables_by_name("/d/shop/db").await.unwrap();
        assert_eq!(users, vec![(deployment.clone(), "id-old".to_string())]);

        let latest = registry.latest_successful(&deployment).await.unwrap().unwrap();
        assert_eq!(latest.seq, 1);
    }

    #[tokio::test]
    async fn test_variables_excluded_when_no_successful_set() {
        let registry = InMemoryVariableSetRegistry::new();

        registry
            .append_set(&name("shop"), vec![Variable::new("/d/shop/db", "id")], false)
            .await
            .unwrap();

        assert!(registry
            .latest_successful(&name("shop"))
            .await
            .unwrap()
            .is_none());
        assert!(registry
            .variables_by_name("/d/shop/db")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_mark_deployed_promotes_set() {
        let registry = InMemoryVariableSetRegistry::new();
        let deployment = name("shop");

        let set = registry
            .append_set(&deployment, vec![Variable::new("/d/shop/db", "id")], false)
            .await
            .unwrap();
        assert_eq!(set.seq, 1);

        registry.mark_deployed(&deployment, set.seq).await.unwrap();

        let latest = registry.latest_successful(&deployment).await.unwrap().unwrap();
        assert_eq!(latest.seq, 1);
        assert!(latest.deployed_successfully);
    }

    #[tokio::test]
    async fn test_prune_removes_all_sets() {
        let registry = InMemoryVariableSetRegistry::new();
        let deployment = name("shop");

        registry
            .append_set(&deployment, vec![Variable::new("/d/shop/db", "id")], true)
            .await
            .unwrap();
        registry.prune_for_deleted_deployment(&deployment).await.unwrap();

        assert!(registry
            .latest_successful(&deployment)
            .await
            .unwrap()
            .is_none());
        assert!(registry
            .variables_by_name("/d/shop/db")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_cloud_configs_list_newest_first() {
        let registry = InMemoryCloudConfigRegistry::new();

        registry.append("one".into()).await.unwrap();
        registry.append("two".into()).await.unwrap();
        registry.append("three".into()).await.unwrap();

        let listed = registry.list(2).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].manifest, "three");
        assert_eq!(listed[0].seq, 3);
        assert_eq!(listed[1].manifest, "two");

        let latest = registry.latest().await.unwrap().unwrap();
        assert_eq!(latest.manifest, "three");
    }

    #[tokio::test]
    async fn test_instance_registry_index_maintenance() {
        let registry = InMemoryInstanceRegistry::new();
        let deployment = name("shop");

        let a = Instance::new(deployment.clone(), "web", 0);
        let b = Instance::new(deployment.clone(), "web", 1);
        let a_id = a.id.clone();

        registry.register(a).await.unwrap();
        registry.register(b).await.unwrap();
        assert_eq!(registry.list_for_deployment(&deployment).await.unwrap().len(), 2);

        registry.remove(&a_id).await.unwrap();
        assert_eq!(registry.list_for_deployment(&deployment).await.unwrap().len(), 1);

        // Removing again is a no-op
        registry.remove(&a_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_deployment_registry_create_and_delete() {
        let registry = InMemoryDeploymentRegistry::new();
        let deployment = Deployment::new(name("shop"), "---");

        registry.create(deployment.clone()).await.unwrap();
        assert!(matches!(
            registry.create(deployment).await,
            Err(RegistryError::DeploymentAlreadyExists(_))
        ));

        registry
            .update_lifecycle(&name("shop"), DeploymentLifecycle::Deleting)
            .await
            .unwrap();
        let found = registry.find_by_name(&name("shop")).await.unwrap().unwrap();
        assert_eq!(found.lifecycle, DeploymentLifecycle::Deleting);

        registry.delete(&name("shop")).await.unwrap();
        assert!(registry.find_by_name(&name("shop")).await.unwrap().is_none());
        // Idempotent
        registry.delete(&name("shop")).await.unwrap();
    }
}
