//! # Cache registry
//!
//! Name-based access to memoized functions' caches.
//!
//! Every `#[memoize]` expansion registers two callbacks under the cache
//! name (the function name unless overridden): one that clears the whole
//! cache and one that removes a single key. Callers can then invalidate
//! from anywhere in the program without a handle to the function itself.
//!
//! # Examples
//!
//! ```rust
//! use memocache_core::{memo_key, MemoRegistry};
//!
//! let registry = MemoRegistry::global();
//! registry.register(
//!     "fetch_user",
//!     || { /* clear the backing map */ },
//!     |_key| { /* remove one entry */ false },
//! );
//!
//! registry.clear_cache("fetch_user").unwrap();
//! assert_eq!(registry.dirty("fetch_user", &memo_key!(42u64)), Ok(false));
//! ```

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{CacheError, CacheKey};

type ClearFn = Arc<dyn Fn() + Send + Sync>;
type RemoveFn = Arc<dyn Fn(&CacheKey) -> bool + Send + Sync>;

/// Registry mapping cache names to their invalidation callbacks.
pub struct MemoRegistry {
    clearers: RwLock<HashMap<String, ClearFn>>,
    removers: RwLock<HashMap<String, RemoveFn>>,
}

impl MemoRegistry {
    fn new() -> Self {
        Self {
            clearers: RwLock::new(HashMap::new()),
            removers: RwLock::new(HashMap::new()),
        }
    }

    /// The process-wide registry used by `#[memoize]` expansions.
    pub fn global() -> &'static MemoRegistry {
        static INSTANCE: std::sync::OnceLock<MemoRegistry> = std::sync::OnceLock::new();
        INSTANCE.get_or_init(MemoRegistry::new)
    }

    /// Registers the callbacks for one named cache.
    ///
    /// Re-registering under the same name replaces the previous callbacks.
    pub fn register<C, R>(&self, cache_name: &str, clear: C, remove: R)
    where
        C: Fn() + Send + Sync + 'static,
        R: Fn(&CacheKey) -> bool + Send + Sync + 'static,
    {
        self.clearers
            .write()
            .insert(cache_name.to_string(), Arc::new(clear));
        self.removers
            .write()
            .insert(cache_name.to_string(), Arc::new(remove));
        tracing::debug!(cache = cache_name, "cache registered");
    }

    /// Clears one named cache.
    ///
    /// Fails with [`CacheError::NotFound`] when no cache was registered
    /// under `cache_name`.
    pub fn clear_cache(&self, cache_name: &str) -> Result<(), CacheError> {
        let clearer = self
            .clearers
            .read()
            .get(cache_name)
            .cloned()
            .ok_or(CacheError::NotFound)?;
        clearer();
        tracing::debug!(cache = cache_name, "cache cleared");
        Ok(())
    }

    /// Removes one key from one named cache, forcing recomputation on the
    /// next call with those arguments.
    ///
    /// Returns whether an entry was actually removed. Fails with
    /// [`CacheError::NotFound`] when the cache name is unknown; an absent
    /// key in a known cache is `Ok(false)`.
    pub fn dirty(&self, cache_name: &str, key: &CacheKey) -> Result<bool, CacheError> {
        let remover = self
            .removers
            .read()
            .get(cache_name)
            .cloned()
            .ok_or(CacheError::NotFound)?;
        Ok(remover(key))
    }

    /// Clears every registered cache.
    ///
    /// Returns the number of caches cleared.
    pub fn clear_all(&self) -> usize {
        let clearers = self.clearers.read();
        for clearer in clearers.values() {
            clearer();
        }
        tracing::debug!(count = clearers.len(), "all caches cleared");
        clearers.len()
    }

    /// Names of all registered caches, sorted for stable output.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.clearers.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn contains(&self, cache_name: &str) -> bool {
        self.clearers.read().contains_key(cache_name)
    }

    /// Drops all registrations. Intended for tests.
    pub fn reset(&self) {
        self.clearers.write().clear();
        self.removers.write().clear();
    }
}

impl Default for MemoRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears one named cache through the global registry.
///
/// # Example
///
/// ```ignore
/// use memocache_core::clear_cache;
///
/// clear_cache("fetch_user_profile")?;
/// ```
pub fn clear_cache(cache_name: &str) -> Result<(), CacheError> {
    MemoRegistry::global().clear_cache(cache_name)
}

/// Removes one key from one named cache through the global registry.
///
/// # Example
///
/// ```ignore
/// use memocache_core::{dirty, memo_key};
///
/// dirty("fetch_user_profile", &memo_key!(42u64))?;
/// ```
pub fn dirty(cache_name: &str, key: &CacheKey) -> Result<bool, CacheError> {
    MemoRegistry::global().dirty(cache_name, key)
}

/// Clears every cache registered in the global registry.
pub fn clear_all_caches() -> usize {
    MemoRegistry::global().clear_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memo_key;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn test_clear_named_cache() {
        let registry = MemoRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();

        registry.register(
            "cache1",
            move || {
                c.fetch_add(1, Ordering::SeqCst);
            },
            |_| false,
        );

        registry.clear_cache("cache1").unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_cache_name() {
        let registry = MemoRegistry::new();
        assert_eq!(registry.clear_cache("nope"), Err(CacheError::NotFound));
        assert_eq!(
            registry.dirty("nope", &memo_key!(1)),
            Err(CacheError::NotFound)
        );
    }

    #[test]
    fn test_dirty_routes_key_to_remover() {
        let registry = MemoRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        registry.register(
            "cache1",
            || {},
            move |key: &CacheKey| {
                seen_clone.lock().unwrap().push(key.clone());
                true
            },
        );

        assert_eq!(registry.dirty("cache1", &memo_key!(7, "a")), Ok(true));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[memo_key!(7, "a")]);
    }

    #[test]
    fn test_dirty_reports_absent_key() {
        let registry = MemoRegistry::new();
        registry.register("cache1", || {}, |_| false);
        assert_eq!(registry.dirty("cache1", &memo_key!(1)), Ok(false));
    }

    #[test]
    fn test_clear_all() {
        let registry = MemoRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        for name in ["a", "b", "c"] {
            let c = counter.clone();
            registry.register(
                name,
                move || {
                    c.fetch_add(1, Ordering::SeqCst);
                },
                |_| false,
            );
        }

        assert_eq!(registry.clear_all(), 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_reregister_replaces_callbacks() {
        let registry = MemoRegistry::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let f = first.clone();
        registry.register(
            "cache1",
            move || {
                f.fetch_add(1, Ordering::SeqCst);
            },
            |_| false,
        );
        let s = second.clone();
        registry.register(
            "cache1",
            move || {
                s.fetch_add(1, Ordering::SeqCst);
            },
            |_| false,
        );

        registry.clear_cache("cache1").unwrap();
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_names_sorted() {
        let registry = MemoRegistry::new();
        registry.register("zeta", || {}, |_| false);
        registry.register("alpha", || {}, |_| false);
        assert_eq!(registry.names(), vec!["alpha", "zeta"]);
        assert!(registry.contains("alpha"));
        assert!(!registry.contains("beta"));
    }
}
