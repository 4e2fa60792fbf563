use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_CACHE_CAPACITY: usize = 1_000;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
struct CachedName {
    /// `None` records a lookup that found no primary name
    name: Option<String>,
    cached_at: Instant,
}

/// Reverse-lookup memo: address -> primary ENS name.
///
/// Negative results are cached too. Entries expire after `ttl`; when full, the
/// oldest entry is evicted.
#[derive(Debug)]
pub struct NameCache {
    entries: DashMap<String, CachedName>,
    capacity: usize,
    ttl: Duration,
}

impl NameCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
            ttl,
        }
    }

    fn key(address: &str) -> String {
        address.trim().to_lowercase()
    }

    /// Outer `None` is a miss; `Some(None)` is a cached "no name"
    pub fn get(&self, address: &str) -> Option<Option<String>> {
        let key = Self::key(address);

        let expired = match self.entries.get(&key) {
            Some(entry) if entry.cached_at.elapsed() < self.ttl => {
                debug!("Name cache hit for {}", key);
                return Some(entry.name.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            debug!("Name cache entry for {} expired", key);
            self.entries.remove(&key);
        }
        None
    }

    pub fn insert(&self, address: &str, name: Option<String>) {
        let key = Self::key(address);

        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_oldest();
        }

        self.entries.insert(
            key,
            CachedName {
                name,
                cached_at: Instant::now(),
            },
        );
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().cached_at)
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            debug!("Name cache full, evicting {}", key);
            self.entries.remove(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for NameCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL)
    }
}
