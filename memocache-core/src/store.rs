use crate::{CacheEntry, CacheKey};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::Debug;
use std::time::Duration;

#[cfg(feature = "stats")]
use crate::CacheStats;

/// A thread-safe memoization store shared across all threads.
///
/// The backing map lives in `'static` storage (a `Lazy<RwLock<HashMap>>`
/// declared at the wrap site, typically by the `#[memoize]` macro) so that
/// every call site and every thread reaches the same entries. `MemoStore`
/// itself is a cheap handle over those statics and is rebuilt per call.
///
/// Entries carry an insertion timestamp. When a TTL is configured, a stale
/// entry found by [`get`](MemoStore::get) is removed on the spot and
/// reported as a miss, so expiration needs no background task.
///
/// # Locking
///
/// Lookups take the read lock, so concurrent hits never block each other.
/// Inserts and removals take the write lock briefly. The store never holds
/// a lock while user code runs, which keeps recursive memoized functions
/// deadlock-free at the cost of an occasional duplicate computation when
/// two threads miss the same key at once.
///
/// # Examples
///
/// ```
/// use memocache_core::{memo_key, CacheEntry, CacheKey, MemoStore};
/// use once_cell::sync::Lazy;
/// use parking_lot::RwLock;
/// use std::collections::HashMap;
///
/// static FIB_MAP: Lazy<RwLock<HashMap<CacheKey, CacheEntry<u64>>>> =
///     Lazy::new(|| RwLock::new(HashMap::new()));
/// #[cfg(feature = "stats")]
/// static FIB_STATS: Lazy<memocache_core::CacheStats> =
///     Lazy::new(memocache_core::CacheStats::new);
///
/// let store = MemoStore::new(
///     &FIB_MAP,
///     None,
///     #[cfg(feature = "stats")]
///     &FIB_STATS,
/// );
/// store.insert(memo_key!(10), 55);
/// assert_eq!(store.get(&memo_key!(10)), Some(55));
/// ```
pub struct MemoStore<R: 'static> {
    pub map: &'static Lazy<RwLock<HashMap<CacheKey, CacheEntry<R>>>>,
    pub ttl: Option<Duration>,
    #[cfg(feature = "stats")]
    pub stats: &'static Lazy<CacheStats>,
}

impl<R: Clone + 'static> MemoStore<R> {
    #[cfg(feature = "stats")]
    pub fn new(
        map: &'static Lazy<RwLock<HashMap<CacheKey, CacheEntry<R>>>>,
        ttl: Option<Duration>,
        stats: &'static Lazy<CacheStats>,
    ) -> Self {
        Self { map, ttl, stats }
    }

    #[cfg(not(feature = "stats"))]
    pub fn new(
        map: &'static Lazy<RwLock<HashMap<CacheKey, CacheEntry<R>>>>,
        ttl: Option<Duration>,
    ) -> Self {
        Self { map, ttl }
    }

    /// Retrieves a cached value, treating a stale entry as a miss.
    ///
    /// A stale entry is removed before returning `None`, so the caller's
    /// follow-up [`insert`](MemoStore::insert) starts a fresh TTL window.
    pub fn get(&self, key: &CacheKey) -> Option<R> {
        let mut expired = false;
        {
            let m = self.map.read();
            if let Some(entry) = m.get(key) {
                match self.ttl {
                    Some(ttl) if entry.is_stale(ttl) => expired = true,
                    _ => {
                        #[cfg(feature = "stats")]
                        self.stats.record_hit();
                        return Some(entry.value.clone());
                    }
                }
            }
        } // read lock released

        if expired {
            self.map.write().remove(key);
            tracing::trace!(?key, "memoized entry expired");
        }
        #[cfg(feature = "stats")]
        self.stats.record_miss();
        None
    }

    /// Inserts or refreshes a value, resetting its timestamp.
    pub fn insert(&self, key: CacheKey, value: R) {
        self.map.write().insert(key, CacheEntry::new(value));
    }

    /// Removes one entry. Returns whether a value was present, regardless
    /// of staleness.
    pub fn remove(&self, key: &CacheKey) -> bool {
        self.map.write().remove(key).is_some()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.map.write().clear();
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }

    #[cfg(feature = "stats")]
    pub fn stats(&self) -> &CacheStats {
        self.stats
    }
}

/// Specialization for fallible functions: only `Ok` results are cached,
/// so transient failures are retried instead of replayed.
impl<T: Clone + Debug + 'static, E: Clone + Debug + 'static> MemoStore<Result<T, E>> {
    pub fn insert_ok(&self, key: CacheKey, value: &Result<T, E>) {
        if let Ok(v) = value {
            self.insert(key, Ok(v.clone()));
        }
    }
}
