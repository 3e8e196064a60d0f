//! In-memory response cache backed by `DashMap`, bounded by TTL and entry count.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

/// Which entry makes room when the cache is full.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EvictionStrategy {
    /// Evict the entry read least recently (insertion counts as a read).
    #[default]
    Lru,
    /// Evict the entry inserted first, regardless of reads.
    Fifo,
}

impl fmt::Display for EvictionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lru => write!(f, "lru"),
            Self::Fifo => write!(f, "fifo"),
        }
    }
}

impl FromStr for EvictionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lru" => Ok(Self::Lru),
            "fifo" => Ok(Self::Fifo),
            other => Err(format!("unknown cache strategy: {}", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    pub ttl: Duration,
    /// Maximum number of live entries. Zero disables storage.
    pub max_size: usize,
    pub strategy: EvictionStrategy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_size: 100,
            strategy: EvictionStrategy::Lru,
        }
    }
}

/// Point-in-time cache counters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    /// `hits / (hits + misses)`, or 0 before the first lookup.
    pub hit_rate: f64,
}

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
    /// Insertion order, used by FIFO eviction.
    inserted: u64,
    /// Last read (or insertion) order, used by LRU eviction.
    touched: u64,
}

/// Thread-safe cache with time-to-live expiration and a size bound.
///
/// Expired entries are lazily dropped on the next lookup for that key.
/// When an insert would exceed `max_size`, exactly one entry is evicted
/// first according to the configured [`EvictionStrategy`]. Inserts are
/// admitted one at a time so the bound holds under concurrent writers.
pub struct ResponseCache<V> {
    store: DashMap<String, CacheEntry<V>>,
    config: CacheConfig,
    admission: Mutex<()>,
    clock: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            store: DashMap::new(),
            config,
            admission: Mutex::new(()),
            clock: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Returns the live value for `key`, counting the lookup as a hit or miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let found = self.peek(key);
        if found.is_some() {
            self.record_hit();
        } else {
            self.record_miss();
        }
        found
    }

    /// Counts a lookup that was answered without reaching the backend.
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Like [`get`](Self::get) but leaves the hit/miss counters alone.
    pub fn peek(&self, key: &str) -> Option<V> {
        let mut entry = self.store.get_mut(key)?;
        if Instant::now() >= entry.expires_at {
            drop(entry);
            self.store.remove(key);
            return None;
        }
        entry.touched = self.tick();
        Some(entry.value.clone())
    }

    /// Inserts or overwrites `key`, evicting one entry first if the cache is full.
    pub fn set(&self, key: String, value: V) {
        if self.config.max_size == 0 {
            return;
        }
        let _admission = self.admission.lock().unwrap_or_else(|e| e.into_inner());
        if !self.store.contains_key(&key) && self.store.len() >= self.config.max_size {
            self.evict_one();
        }
        let seq = self.tick();
        self.store.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + self.config.ttl,
                inserted: seq,
                touched: seq,
            },
        );
    }

    fn evict_one(&self) {
        let victim = self
            .store
            .iter()
            .min_by_key(|entry| match self.config.strategy {
                EvictionStrategy::Fifo => entry.inserted,
                EvictionStrategy::Lru => entry.touched,
            })
            .map(|entry| entry.key().clone());
        if let Some(key) = victim {
            tracing::debug!("Evicting cache entry {} ({})", key, self.config.strategy);
            self.store.remove(&key);
        }
    }

    /// Removes every entry whose key contains `pattern`. Returns how many were removed.
    pub fn invalidate_matching(&self, pattern: &str) -> usize {
        let before = self.store.len();
        self.store.retain(|key, _| !key.contains(pattern));
        before.saturating_sub(self.store.len())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.store.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Removes all entries from the cache.
    pub fn clear(&self) {
        self.store.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        CacheStats {
            size: self.store.len(),
            max_size: self.config.max_size,
            hits,
            misses,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                hits as f64 / lookups as f64
            },
        }
    }
}
