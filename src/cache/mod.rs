//! In-memory caching
//!
//! A generic TTL + LRU `CacheManager` and the token metadata cache built on it.
//! The metadata cache is the only structure shared between the monitor driver
//! and its background tasks; hand it around as `Arc<TokenMetadataCache>`.

pub mod config;
pub mod manager;
pub mod metadata;

pub use config::CacheConfig;
pub use manager::{CacheManager, CacheMetrics};
pub use metadata::{TokenMetadata, TokenMetadataCache};
