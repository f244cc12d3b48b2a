/// Generic in-memory cache with TTL and LRU eviction
///
/// Thread-safe behind one `parking_lot::RwLock`: `peek` takes the read lock so
/// readers never block each other; `get` and all writes take the write lock.
/// Tracks metrics for monitoring.
use super::config::CacheConfig;
use parking_lot::RwLock;
#[cfg(test)]
use parking_lot::RwLockReadGuard;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Cache entry with TTL tracking
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() > ttl
    }
}

/// Cache metrics for monitoring
#[derive(Debug, Clone, Default)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub inserts: u64,
}

impl CacheMetrics {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64) / (total as f64)
        }
    }
}

pub(super) struct CacheState<K, V> {
    data: HashMap<K, CacheEntry<V>>,
    // front = least recently used
    access_order: VecDeque<K>,
    metrics: CacheMetrics,
}

impl<K: Clone + Eq + Hash, V> CacheState<K, V> {
    fn touch(&mut self, key: &K) {
        self.access_order.retain(|k| k != key);
        self.access_order.push_back(key.clone());
    }

    fn forget(&mut self, key: &K) {
        self.data.remove(key);
        self.access_order.retain(|k| k != key);
    }

    fn evict_lru(&mut self) {
        if let Some(lru_key) = self.access_order.pop_front() {
            self.data.remove(&lru_key);
            self.metrics.evictions += 1;
        }
    }

    fn store(&mut self, key: K, value: V, capacity: usize) {
        if self.data.len() >= capacity && !self.data.contains_key(&key) {
            self.evict_lru();
        }

        self.data.insert(key.clone(), CacheEntry::new(value));
        self.touch(&key);
        self.metrics.inserts += 1;
    }
}

/// Generic cache manager
pub struct CacheManager<K, V> where K: Clone + Eq + Hash, V: Clone {
    config: CacheConfig,
    state: RwLock<CacheState<K, V>>,
}

impl<K, V> CacheManager<K, V> where K: Clone + Eq + Hash, V: Clone {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            state: RwLock::new(CacheState {
                data: HashMap::new(),
                access_order: VecDeque::new(),
                metrics: CacheMetrics::default(),
            }),
        }
    }

    /// Get value from cache (None if expired or missing)
    pub fn get(&self, key: &K) -> Option<V> {
        let mut state = self.state.write();

        let expired = match state.data.get(key) {
            Some(entry) => entry.is_expired(self.config.ttl),
            None => {
                state.metrics.misses += 1;
                return None;
            }
        };

        if expired {
            state.forget(key);
            state.metrics.misses += 1;
            state.metrics.expirations += 1;
            return None;
        }

        state.touch(key);
        state.metrics.hits += 1;
        state.data.get(key).map(|entry| entry.value.clone())
    }

    /// Read without affecting LRU order or metrics
    pub fn peek(&self, key: &K) -> Option<V> {
        let state = self.state.read();
        state.data
            .get(key)
            .filter(|entry| !entry.is_expired(self.config.ttl))
            .map(|entry| entry.value.clone())
    }

    /// Insert value into cache (evicts LRU if at capacity)
    pub fn insert(&self, key: K, value: V) {
        self.state.write().store(key, value, self.config.capacity);
    }

    /// Read-modify-write under one write lock. `f` sees the live value, or
    /// `None` when missing or expired.
    pub fn update<F>(&self, key: K, f: F) where F: FnOnce(Option<&V>) -> V {
        let mut state = self.state.write();
        let value = f(
            state.data
                .get(&key)
                .filter(|entry| !entry.is_expired(self.config.ttl))
                .map(|entry| &entry.value)
        );
        state.store(key, value, self.config.capacity);
    }

    #[cfg(test)]
    pub(super) fn hold_read_lock(&self) -> RwLockReadGuard<'_, CacheState<K, V>> {
        self.state.read()
    }

    pub fn remove(&self, key: &K) {
        self.state.write().forget(key);
    }

    pub fn clear(&self) {
        let mut state = self.state.write();
        state.data.clear();
        state.access_order.clear();
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.state.read().metrics.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{mpsc, Arc};
    use std::thread;

    #[test]
    fn test_basic_operations() {
        let cache = CacheManager::new(CacheConfig::custom(60, 100));

        cache.insert("key1".to_string(), "value1".to_string());
        assert_eq!(cache.get(&"key1".to_string()), Some("value1".to_string()));
        assert_eq!(cache.get(&"nonexistent".to_string()), None);

        let metrics = cache.metrics();
        assert_eq!(metrics.hits, 1);
        assert_eq!(metrics.misses, 1);
        assert_eq!(metrics.hit_rate(), 0.5);
    }

    #[test]
    fn test_ttl_expiration() {
        let cache = CacheManager::new(CacheConfig {
            ttl: Duration::from_millis(50),
            capacity: 10,
        });

        cache.insert("key".to_string(), "value".to_string());
        assert_eq!(cache.peek(&"key".to_string()), Some("value".to_string()));

        thread::sleep(Duration::from_millis(120));
        assert_eq!(cache.peek(&"key".to_string()), None);
        assert_eq!(cache.get(&"key".to_string()), None);
        assert_eq!(cache.metrics().expirations, 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_lru_eviction() {
        let cache = CacheManager::new(CacheConfig::custom(60, 2));

        cache.insert("key1".to_string(), 1);
        cache.insert("key2".to_string(), 2);
        // key1 becomes most recently used, so key2 is evicted next
        assert_eq!(cache.get(&"key1".to_string()), Some(1));
        cache.insert("key3".to_string(), 3);

        assert_eq!(cache.get(&"key2".to_string()), None);
        assert_eq!(cache.get(&"key1".to_string()), Some(1));
        assert_eq!(cache.get(&"key3".to_string()), Some(3));
        assert_eq!(cache.metrics().evictions, 1);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_update_is_atomic() {
        let cache = Arc::new(CacheManager::new(CacheConfig::custom(60, 10)));

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for _ in 0..500 {
                        cache.update("counter", |current| current.copied().unwrap_or(0) + 1);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(cache.peek(&"counter"), Some(4000));
    }

    #[test]
    fn test_update_treats_expired_as_missing() {
        let cache = CacheManager::new(CacheConfig {
            ttl: Duration::from_millis(30),
            capacity: 10,
        });
        cache.insert("key", 5);
        thread::sleep(Duration::from_millis(80));

        cache.update("key", |current| current.copied().unwrap_or(0) + 1);
        assert_eq!(cache.peek(&"key"), Some(1));
    }

    #[test]
    fn test_peek_proceeds_while_another_reader_holds_lock() {
        let cache = Arc::new(CacheManager::new(CacheConfig::custom(60, 10)));
        cache.insert("key".to_string(), 1);

        let guard = cache.hold_read_lock();
        let (tx, rx) = mpsc::channel();
        let reader = {
            let cache = cache.clone();
            thread::spawn(move || {
                let _ = tx.send(cache.peek(&"key".to_string()));
            })
        };

        let seen = rx.recv_timeout(Duration::from_secs(2));
        drop(guard);
        reader.join().unwrap();
        assert_eq!(seen, Ok(Some(1)));
    }
}
