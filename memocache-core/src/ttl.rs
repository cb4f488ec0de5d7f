use std::collections::HashMap;
use std::time::Duration;

use crate::{CacheEntry, CacheError, CacheKey, CallArgs, ParamSchema};

#[cfg(feature = "stats")]
use crate::CacheStats;

/// A [`Memoizer`](crate::Memoizer) variant whose entries expire after a
/// fixed time-to-live.
///
/// Each entry carries the timestamp of its creation or last refresh. A call
/// whose entry is older than the TTL recomputes the value and resets the
/// timestamp; a fresh entry is returned unchanged. Expiration is a fixed
/// window - reads do not extend it - and the TTL bounds only how long a
/// stored value is trusted, never how long a recomputation may run.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use memocache_core::{CallArgs, ParamSchema, TtlMemoizer};
///
/// let mut lookups = TtlMemoizer::new(
///     Duration::from_secs(300),
///     ParamSchema::new().required("id"),
///     |args| format!("row-{:?}", args.positional()[0].as_int()),
/// )
/// .unwrap();
///
/// let first = lookups.call(&CallArgs::new().arg(7)).unwrap();
/// let second = lookups.call(&CallArgs::new().arg(7)).unwrap(); // cached
/// assert_eq!(first, second);
/// ```
pub struct TtlMemoizer<V> {
    schema: ParamSchema,
    func: Box<dyn FnMut(&CallArgs) -> V>,
    ttl: Duration,
    cache: HashMap<CacheKey, CacheEntry<V>>,
    #[cfg(feature = "stats")]
    stats: CacheStats,
}

impl<V: Clone> TtlMemoizer<V> {
    /// Wraps `func` with a cache whose entries go stale after `ttl`.
    ///
    /// Fails with [`CacheError::InvalidTtl`] when `ttl` is zero.
    pub fn new(
        ttl: Duration,
        schema: ParamSchema,
        func: impl FnMut(&CallArgs) -> V + 'static,
    ) -> Result<Self, CacheError> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl);
        }
        Ok(Self {
            schema,
            func: Box::new(func),
            ttl,
            cache: HashMap::new(),
            #[cfg(feature = "stats")]
            stats: CacheStats::new(),
        })
    }

    /// The configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Calls the wrapped function through the cache.
    ///
    /// When the key is absent or its entry is stale, the function runs and
    /// the entry is stored with a fresh timestamp; otherwise the cached
    /// value is returned unchanged.
    pub fn call(&mut self, args: &CallArgs) -> Result<V, CacheError> {
        let key = self.schema.build_key(args)?;
        if let Some(entry) = self.cache.get(&key) {
            if !entry.is_stale(self.ttl) {
                #[cfg(feature = "stats")]
                self.stats.record_hit();
                return Ok(entry.value.clone());
            }
        }
        #[cfg(feature = "stats")]
        self.stats.record_miss();
        let value = (self.func)(args);
        self.cache.insert(key, CacheEntry::new(value.clone()));
        Ok(value)
    }

    /// Removes the entry for one set of arguments, forcing recomputation on
    /// the next call regardless of remaining TTL. Absent keys are a no-op.
    pub fn dirty(&mut self, args: &CallArgs) -> Result<(), CacheError> {
        let key = self.schema.build_key(args)?;
        self.cache.remove(&key);
        Ok(())
    }

    /// Drops all entries and their timestamps.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    #[cfg(feature = "stats")]
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

/// Specialization for fallible functions: only successful results are
/// stored. A failed recomputation of a stale key leaves the old entry in
/// place (still stale), so the next call tries again.
impl<T: Clone, E: Clone> TtlMemoizer<Result<T, E>> {
    pub fn call_result(&mut self, args: &CallArgs) -> Result<Result<T, E>, CacheError> {
        let key = self.schema.build_key(args)?;
        if let Some(entry) = self.cache.get(&key) {
            if !entry.is_stale(self.ttl) {
                #[cfg(feature = "stats")]
                self.stats.record_hit();
                return Ok(entry.value.clone());
            }
        }
        #[cfg(feature = "stats")]
        self.stats.record_miss();
        let value = (self.func)(args);
        if value.is_ok() {
            self.cache.insert(key, CacheEntry::new(value.clone()));
        }
        Ok(value)
    }
}
