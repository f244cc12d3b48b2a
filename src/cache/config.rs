/// Cache configuration
///
/// TTL and capacity for one cache instance. The token metadata cache reads its
/// values from the `[metadata]` config section.
use crate::config::MetadataCacheConfig;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Time-to-live for cached entries
    pub ttl: Duration,

    /// Maximum number of entries (LRU eviction when exceeded)
    pub capacity: usize,
}

impl CacheConfig {
    /// Token metadata: symbol, name, decimals and last accepted price
    pub fn token_metadata(section: &MetadataCacheConfig) -> Self {
        Self::custom(section.ttl_secs, section.capacity)
    }

    pub fn custom(ttl_secs: u64, capacity: usize) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_secs),
            capacity: capacity.max(1),
        }
    }
}
