//! Shared LRU cache policy

use std::hash::Hash;
use std::num::NonZeroUsize;

use lru::LruCache;

/// Hit/miss/eviction counters for one cache instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Fixed-capacity key→value store with strict least-recently-used
/// eviction.
///
/// Both `get` (on a hit) and `put` mark the key most-recently-used; a
/// `put` that would exceed capacity evicts exactly the least-recently-used
/// entry first. Capacity is fixed at construction — `NonZeroUsize` makes a
/// zero-capacity cache unrepresentable.
///
/// A capacity smaller than the working set thrashes (every access becomes
/// a miss) but never corrupts: entries that survive are always the ones
/// most recently touched.
#[derive(Debug)]
pub struct GeometryCache<K: Hash + Eq, V> {
    inner: LruCache<K, V>,
    stats: CacheStats,
}

impl<K: Hash + Eq, V> GeometryCache<K, V> {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: LruCache::new(capacity),
            stats: CacheStats::default(),
        }
    }

    /// Look up `key`, refreshing its recency on a hit. A miss is not an
    /// error; it means the caller must (re)compute the artifact and `put`
    /// it.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let value = self.inner.get(key);
        if value.is_some() {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        value
    }

    /// Insert `key`, marking it most-recently-used. Evicts the LRU entry
    /// if the cache is at capacity and `key` is new.
    pub fn put(&mut self, key: K, value: V) {
        if let Some((old, _)) = self.inner.push(key, value) {
            // push returns the displaced entry: the previous value when the
            // key was already present, or the evicted LRU pair otherwise.
            if !self.inner.contains(&old) {
                self.stats.evictions += 1;
                tracing::trace!(evictions = self.stats.evictions, "lru entry evicted");
            }
        }
    }

    /// Fetch or compute-and-insert in one step, with miss accounting.
    pub fn get_or_insert_with<F: FnOnce() -> V>(&mut self, key: K, compute: F) -> &V {
        self.account(self.inner.contains(&key));
        self.inner.get_or_insert(key, compute)
    }

    /// Fallible variant of [`get_or_insert_with`](Self::get_or_insert_with).
    /// A failed compute inserts nothing and leaves the stats untouched.
    pub fn try_get_or_insert_with<F, E>(&mut self, key: K, compute: F) -> Result<&V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if self.inner.contains(&key) {
            self.account(true);
            return self.inner.try_get_or_insert(key, compute);
        }
        // Compute before accounting, so a failure changes nothing.
        let value = compute()?;
        self.account(false);
        Ok(self.inner.get_or_insert(key, move || value))
    }

    /// Presence check without touching recency or stats.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.cap().get()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn account(&mut self, hit: bool) {
        if hit {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
            if self.inner.len() == self.capacity() {
                self.stats.evictions += 1;
                tracing::trace!(evictions = self.stats.evictions, "lru entry evicted");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAP: usize = 16;

    fn cache() -> GeometryCache<u64, usize> {
        GeometryCache::new(NonZeroUsize::new(CAP).unwrap())
    }

    #[test]
    fn fill_then_read_back_hits_every_key() {
        let mut c = cache();
        for i in 0..CAP as u64 {
            c.put(i, i as usize);
        }
        for i in 0..CAP as u64 {
            assert!(c.get(&i).is_some(), "key {i} was evicted");
        }
        assert_eq!(c.stats().hits, CAP as u64);
        assert_eq!(c.stats().evictions, 0);
    }

    #[test]
    fn overflow_evicts_exactly_the_lru_entry() {
        let mut c = cache();
        for i in 0..CAP as u64 {
            c.put(i, i as usize);
        }
        // Insertion order alone decides recency here; key 0 is LRU.
        c.put(CAP as u64, 0);
        assert!(c.get(&0).is_none(), "key 0 was not evicted");
        for i in 1..=CAP as u64 {
            assert!(c.get(&i).is_some(), "key {i} was evicted");
        }
        assert_eq!(c.stats().evictions, 1);
    }

    #[test]
    fn get_refreshes_recency() {
        let mut c = cache();
        for i in 0..CAP as u64 {
            c.put(i, 0);
        }
        // Touch key 0 so key 1 becomes LRU.
        c.get(&0);
        c.put(CAP as u64, 0);
        assert!(c.get(&0).is_some());
        assert!(c.get(&1).is_none());
    }

    #[test]
    fn put_refreshes_recency_of_existing_key() {
        let mut c = cache();
        for i in 0..CAP as u64 {
            c.put(i, 0);
        }
        // Re-put key 0; key 1 becomes LRU.
        c.put(0, 99);
        c.put(CAP as u64, 0);
        assert_eq!(c.get(&0), Some(&99));
        assert!(c.get(&1).is_none());
    }

    #[test]
    fn get_or_insert_computes_once() {
        let mut c = cache();
        let mut computed = 0;
        c.get_or_insert_with(7, || {
            computed += 1;
            42
        });
        c.get_or_insert_with(7, || {
            computed += 1;
            42
        });
        assert_eq!(computed, 1);
        assert_eq!(c.stats().hits, 1);
        assert_eq!(c.stats().misses, 1);
    }

    #[test]
    fn failed_compute_inserts_nothing_and_counts_nothing() {
        let mut c = cache();
        for i in 0..CAP as u64 {
            c.put(i, 0);
        }
        let before = c.stats();
        let r: Result<&usize, &str> = c.try_get_or_insert_with(99, || Err("shape too complex"));
        assert!(r.is_err());
        assert_eq!(c.stats(), before);
        assert_eq!(c.len(), CAP);
        // Nothing was evicted to make room for the failed entry.
        assert!(c.contains(&0));
    }

    #[test]
    fn capacity_one_thrashes_without_corruption() {
        let mut c: GeometryCache<u64, u64> = GeometryCache::new(NonZeroUsize::new(1).unwrap());
        for i in 0..100u64 {
            c.put(i, i * 2);
            assert_eq!(c.get(&i), Some(&(i * 2)));
            assert_eq!(c.len(), 1);
        }
    }
}
