//! LRU cache of prepared page frames

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use super::pipeline::PreparedFrame;

/// Cache key: which load the page belongs to, and which page
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Load generation; a reload never sees frames of the previous container
    pub generation: u64,
    /// Page number
    pub page: usize,
}

impl CacheKey {
    #[must_use]
    pub const fn new(generation: u64, page: usize) -> Self {
        Self { generation, page }
    }
}

/// LRU cache for prepared frames
pub struct PageCache {
    cache: LruCache<CacheKey, Arc<PreparedFrame>>,
}

impl PageCache {
    /// Create a new cache with the given capacity (at least one entry)
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
        }
    }

    /// Get a cached frame, promoting it in the LRU order
    #[must_use]
    pub fn get(&mut self, key: &CacheKey) -> Option<Arc<PreparedFrame>> {
        self.cache.get(key).cloned()
    }

    /// Check if a key is in the cache without promoting it
    #[must_use]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.cache.contains(key)
    }

    /// Insert a frame, returning the shared handle
    pub fn insert(&mut self, key: CacheKey, frame: PreparedFrame) -> Arc<PreparedFrame> {
        let arc = Arc::new(frame);
        self.cache.put(key, arc.clone());
        arc
    }

    /// Drop every frame that does not belong to `generation`
    pub fn retain_generation(&mut self, generation: u64) {
        let stale: Vec<CacheKey> = self
            .cache
            .iter()
            .filter(|(k, _)| k.generation != generation)
            .map(|(k, _)| *k)
            .collect();

        for key in stale {
            self.cache.pop(&key);
        }
    }

    /// Clear all cached frames
    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(page: usize) -> PreparedFrame {
        PreparedFrame {
            page,
            width: 1,
            height: 1,
            rgba: vec![0; 4],
        }
    }

    #[test]
    fn cache_insert_and_get() {
        let mut cache = PageCache::new(4);
        let key = CacheKey::new(1, 0);
        cache.insert(key, frame(0));

        assert!(cache.contains(&key));
        assert_eq!(cache.get(&key).map(|f| f.page), Some(0));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cache_lru_eviction() {
        let mut cache = PageCache::new(2);
        for page in 0..3 {
            cache.insert(CacheKey::new(1, page), frame(page));
        }

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&CacheKey::new(1, 0)));
        assert!(cache.contains(&CacheKey::new(1, 2)));
    }

    #[test]
    fn retain_generation_drops_previous_loads() {
        let mut cache = PageCache::new(8);
        cache.insert(CacheKey::new(1, 0), frame(0));
        cache.insert(CacheKey::new(1, 1), frame(1));
        cache.insert(CacheKey::new(2, 0), frame(0));

        cache.retain_generation(2);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&CacheKey::new(2, 0)));
    }

    #[test]
    fn zero_capacity_still_holds_one() {
        let mut cache = PageCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.insert(CacheKey::new(1, 0), frame(0));
        cache.invalidate_all();
        assert!(cache.is_empty());
    }
}
