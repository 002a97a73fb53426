//! Cloud config repository trait

use crate::error::Result;
use async_trait::async_trait;
use flotilla_types::CloudConfig;

/// Append-only storage for cloud configuration versions
#[async_trait]
pub trait CloudConfigRegistry: Send + Sync {
    /// Persist a new version with the next sequence number
    async fn append(&self, manifest: String) -> Result<CloudConfig>;

    /// Up to `limit` versions, newest first
    async fn list(&self, limit: usize) -> Result<Vec<CloudConfig>>;

    /// The newest version, if any
    async fn latest(&self) -> Result<Option<CloudConfig>>;
}
