//! Memoisation of pipeline stages
//!
//! A cache entry is keyed by a hash of the stage name and every argument the
//! stage depends on, so a cached result is always the one recomputation would
//! produce. Backends are injectable; [`NoCache`] turns memoisation off.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Hash of a stage identity and its arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey(u64);

impl CacheKey {
    /// Start a key for the named stage
    pub fn builder(stage: &str) -> CacheKeyBuilder {
        let mut hasher = DefaultHasher::new();
        stage.hash(&mut hasher);
        CacheKeyBuilder { hasher }
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Incrementally hashes the arguments of a stage
pub struct CacheKeyBuilder {
    hasher: DefaultHasher,
}

impl CacheKeyBuilder {
    pub fn with<T: Hash + ?Sized>(mut self, part: &T) -> Self {
        part.hash(&mut self.hasher);
        self
    }

    pub fn finish(self) -> CacheKey {
        CacheKey(self.hasher.finish())
    }
}

/// Storage for memoised stage results
pub trait CacheBackend<V>: Debug + Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<V>;

    fn insert(&self, key: CacheKey, value: V);

    /// Drop every entry
    fn clear(&self);

    /// Number of stored entries
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Unbounded in-process cache
#[derive(Debug)]
pub struct MemoryCache<V> {
    entries: Mutex<HashMap<CacheKey, V>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V> MemoryCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// `(hits, misses)` since creation
    pub fn stats(&self) -> (u64, u64) {
        (self.hits.load(Ordering::Relaxed), self.misses.load(Ordering::Relaxed))
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, V>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<V> Default for MemoryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Debug + Send> CacheBackend<V> for MemoryCache<V> {
    fn get(&self, key: &CacheKey) -> Option<V> {
        let found = self.entries().get(key).cloned();
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    fn insert(&self, key: CacheKey, value: V) {
        self.entries().insert(key, value);
    }

    fn clear(&self) {
        self.entries().clear();
    }

    fn len(&self) -> usize {
        self.entries().len()
    }
}

/// Backend that stores nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl<V> CacheBackend<V> for NoCache {
    fn get(&self, _key: &CacheKey) -> Option<V> {
        None
    }

    fn insert(&self, _key: CacheKey, _value: V) {}

    fn clear(&self) {}

    fn len(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_depends_on_every_part() {
        let a = CacheKey::builder("stage").with("P1").with(&13usize).finish();
        let b = CacheKey::builder("stage").with("P1").with(&13usize).finish();
        let c = CacheKey::builder("stage").with("P1").with(&14usize).finish();
        let d = CacheKey::builder("other").with("P1").with(&13usize).finish();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_memory_cache_round_trip() {
        let cache: MemoryCache<Vec<f64>> = MemoryCache::new();
        let key = CacheKey::builder("s").finish();
        assert!(cache.get(&key).is_none());
        cache.insert(key, vec![1.0]);
        assert_eq!(cache.get(&key), Some(vec![1.0]));
        assert_eq!(cache.stats(), (1, 1));
        cache.clear();
        assert!(CacheBackend::<Vec<f64>>::is_empty(&cache));
    }

    #[test]
    fn test_no_cache_never_stores() {
        let cache = NoCache;
        let key = CacheKey::builder("s").finish();
        CacheBackend::<u8>::insert(&cache, key, 1);
        assert_eq!(CacheBackend::<u8>::get(&cache, &key), None);
    }
}
