//! Director configuration

use flotilla_network::NetworkScope;
use std::time::Duration;

/// Configuration for the director
///
/// Constructed by the embedder and passed down explicitly; there are no
/// ambient singletons.
#[derive(Debug, Clone)]
pub struct DirectorConfig {
    /// How long a mutating operation waits for the deployment lock before
    /// failing with `LockTimeout`
    pub lock_timeout: Duration,

    /// How many instances of one deployment tear down concurrently.
    /// Step ordering within each instance is always preserved.
    pub max_in_flight: usize,

    /// Whether name resolution records are managed at all
    pub dns_enabled: bool,

    /// Key space mode for address reservation state
    pub scope: NetworkScope,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(30),
            max_in_flight: 4,
            dns_enabled: true,
            scope: NetworkScope::Global,
        }
    }
}
