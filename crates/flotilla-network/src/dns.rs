//! Name resolution store
//!
//! Creates and removes name-to-address records for instances. The real
//! system talks to a DNS record store; this crate only fixes the interface
//! and ships an in-memory implementation for development and tests.

use crate::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::net::IpAddr;

/// Name-to-address record store
#[async_trait]
pub trait NameResolutionStore: Send + Sync {
    /// Create or overwrite the record for `name`
    async fn upsert_record(&self, name: &str, address: IpAddr) -> Result<()>;

    /// Remove the record for `name`. Idempotent: removing an absent record
    /// is a no-op so teardown may retry.
    async fn remove_record(&self, name: &str) -> Result<()>;

    /// Current address for `name`, if any
    async fn lookup(&self, name: &str) -> Result<Option<IpAddr>>;
}

/// In-memory name resolution store
pub struct InMemoryNameResolutionStore {
    records: DashMap<String, IpAddr>,
}

impl InMemoryNameResolutionStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Number of records held, for tests
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for InMemoryNameResolutionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NameResolutionStore for InMemoryNameResolutionStore {
    async fn upsert_record(&self, name: &str, address: IpAddr) -> Result<()> {
        self.records.insert(name.to_string(), address);
        Ok(())
    }

    async fn remove_record(&self, name: &str) -> Result<()> {
        self.records.remove(name);
        Ok(())
    }

    async fn lookup(&self, name: &str) -> Result<Option<IpAddr>> {
        Ok(self.records.get(name).map(|r| *r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_and_remove() {
        let store = InMemoryNameResolutionStore::new();
        let address: IpAddr = "10.0.0.2".parse().unwrap();

        store.upsert_record("0.web.shop", address).await.unwrap();
        assert_eq!(store.lookup("0.web.shop").await.unwrap(), Some(address));

        store.remove_record("0.web.shop").await.unwrap();
        assert_eq!(store.lookup("0.web.shop").await.unwrap(), None);

        // Removing again is a no-op
        store.remove_record("0.web.shop").await.unwrap();
    }
}
