//! Variable set types
//!
//! A VariableSet records which version of every named credential a
//! deployment consumed at one point in time. The actual secret values live
//! in an external secret store; Flotilla only tracks the opaque variable
//! ids pointing at them.

use crate::DeploymentName;
use serde::{Deserialize, Serialize};

/// One named credential reference inside a variable set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// Path-like, deployment-scoped name,
    /// e.g. `/Test Director/shop/db_password`
    pub name: String,

    /// Opaque identity of the secret value in the secret store
    pub variable_id: String,
}

impl Variable {
    pub fn new(name: impl Into<String>, variable_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variable_id: variable_id.into(),
        }
    }
}

/// A versioned snapshot of the variables a deployment used
///
/// Sets are append-only per deployment and ordered by `seq`. Variable names
/// are unique within one set; the same name recurs across sets and across
/// deployments with possibly different variable ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableSet {
    /// Owning deployment
    pub deployment: DeploymentName,

    /// Monotonic sequence number within the deployment
    pub seq: u64,

    /// Set once the deploy that created this set finished successfully.
    /// Sets without the flag were abandoned and must never be surfaced by
    /// variable resolution.
    pub deployed_successfully: bool,

    /// Created timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,

    /// Variables belonging to this set
    pub variables: Vec<Variable>,
}

impl VariableSet {
    /// Look up a variable by its full name
    pub fn find(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_name() {
        let set = VariableSet {
            deployment: DeploymentName::new("shop"),
            seq: 1,
            deployed_successfully: true,
            created_at: chrono::Utc::now(),
            variables: vec![
                Variable::new("/d/shop/a", "id-a"),
                Variable::new("/d/shop/b", "id-b"),
            ],
        };

        assert_eq!(set.find("/d/shop/b").unwrap().variable_id, "id-b");
        assert!(set.find("/d/shop/c").is_none());
    }
}
