//! Caller-owned embedding cache with TTL and capacity eviction.
//!
//! The source system kept embedding lookups in module-level singletons;
//! here the cache is an explicit value the caller creates, owns, and
//! passes to the pipeline by mutable reference. Nothing outlives the
//! owner, and eviction is explicit: entries expire after a fixed TTL and
//! the oldest entry is dropped when capacity is reached.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

/// Default maximum number of cached vectors.
pub const DEFAULT_CACHE_CAPACITY: usize = 512;

/// Default entry time-to-live.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

struct CacheEntry {
    vector: Vec<f32>,
    inserted_at: Instant,
}

/// Bounded text-to-embedding cache with TTL eviction.
///
/// Keys are the exact input strings handed to the provider. Insertion
/// order drives capacity eviction (oldest first); expired entries are
/// dropped lazily on access.
pub struct EmbeddingCache {
    entries: HashMap<String, CacheEntry>,
    order: Vec<String>,
    capacity: usize,
    ttl: Duration,
    hits: u64,
    misses: u64,
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL)
    }
}

impl EmbeddingCache {
    /// Create a cache with the given capacity and entry TTL.
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
            capacity: capacity.max(1),
            ttl,
            hits: 0,
            misses: 0,
        }
    }

    /// Look up a cached vector, dropping it if its TTL has elapsed.
    pub fn get(&mut self, key: &str) -> Option<Vec<f32>> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.inserted_at.elapsed() > self.ttl,
            None => {
                self.misses += 1;
                return None;
            }
        };

        if expired {
            self.entries.remove(key);
            self.order.retain(|k| k != key);
            self.misses += 1;
            return None;
        }

        self.hits += 1;
        self.entries.get(key).map(|e| e.vector.clone())
    }

    /// Insert a vector, evicting the oldest entries when at capacity.
    pub fn insert(&mut self, key: String, vector: Vec<f32>) {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.vector = vector;
            entry.inserted_at = Instant::now();
            return;
        }

        while self.order.len() >= self.capacity {
            let oldest = self.order.remove(0);
            self.entries.remove(&oldest);
            debug!(key = %oldest, "evicted oldest cache entry");
        }

        self.order.push(key.clone());
        self.entries.insert(
            key,
            CacheEntry {
                vector,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Fraction of lookups served from cache, 0.0 when no lookups yet.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
