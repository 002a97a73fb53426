//! Cloud configuration record
//!
//! Cloud configs are append-only: updating the configuration persists a new
//! version rather than mutating the previous one. Listing is newest-first.

use serde::{Deserialize, Serialize};

/// One persisted cloud configuration version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudConfig {
    /// Monotonic version number; higher is newer
    pub seq: u64,

    /// Raw manifest content (YAML)
    pub manifest: String,

    /// Created timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,
}
