/// Token metadata cache
///
/// Shared between the balance refresh task (writes symbol/name/decimals) and the
/// price service (writes the last accepted price). Entries expire after the
/// configured TTL (60 s by default) and are then re-seeded from the next fetch
/// or from the `[[tokens]]` config entries.
use super::config::CacheConfig;
use super::manager::{CacheManager, CacheMetrics};
use crate::config::TokenEntry;
use crate::constants::{UNKNOWN_NAME, UNKNOWN_SYMBOL};
use crate::logger::{self, LogTag};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct TokenMetadata {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    /// Last accepted price, 0.0 when never priced
    pub price: f64,
    pub updated_at: DateTime<Utc>,
}

impl TokenMetadata {
    pub fn new(symbol: &str, name: &str, decimals: u8) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            decimals,
            price: 0.0,
            updated_at: Utc::now(),
        }
    }
}

impl From<&TokenEntry> for TokenMetadata {
    fn from(entry: &TokenEntry) -> Self {
        Self::new(&entry.symbol, &entry.name, entry.decimals)
    }
}

pub struct TokenMetadataCache {
    cache: CacheManager<String, TokenMetadata>,
}

impl TokenMetadataCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            cache: CacheManager::new(config),
        }
    }

    /// Shared-lock lookup; concurrent readers never wait on each other
    pub fn get(&self, mint: &str) -> Option<TokenMetadata> {
        self.cache.peek(&mint.to_string())
    }

    /// Store symbol/name/decimals, keeping a cached price if present
    pub fn upsert_metadata(&self, mint: &str, symbol: &str, name: &str, decimals: u8) {
        self.cache.update(mint.to_string(), |existing| {
            let mut entry = TokenMetadata::new(symbol, name, decimals);
            if let Some(existing) = existing {
                entry.price = existing.price;
            }
            entry
        });
    }

    /// Record an accepted price. Unknown mints get a placeholder entry.
    pub fn update_price(&self, mint: &str, price: f64) {
        self.cache.update(mint.to_string(), |existing| {
            let mut entry = existing
                .cloned()
                .unwrap_or_else(|| TokenMetadata::new(UNKNOWN_SYMBOL, UNKNOWN_NAME, 0));
            entry.price = price;
            entry.updated_at = Utc::now();
            entry
        });
    }

    /// Seed from configured tokens
    pub fn seed(&self, tokens: &[TokenEntry]) {
        for token in tokens {
            self.cache.insert(token.address.clone(), TokenMetadata::from(token));
        }
        if !tokens.is_empty() {
            logger::debug(LogTag::Cache, &format!("Seeded metadata cache with {} configured tokens", tokens.len()));
        }
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.cache.metrics()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
