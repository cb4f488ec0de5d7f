use std::collections::HashMap;

use crate::{CacheError, CacheKey, CallArgs, ParamSchema};

#[cfg(feature = "stats")]
use crate::CacheStats;

/// Wraps a function with an unbounded cache of its results, keyed by the
/// canonical key of each call.
///
/// The cache lives as long as the memoizer, which the caller owns
/// explicitly; there is no eviction and no capacity bound. This trades
/// unbounded memory for O(1) average-case lookups and suits functions with
/// a small, finite domain of inputs. For process-lifetime memoization of a
/// statically known function, prefer the `#[memoize]` attribute.
///
/// A `Memoizer` does no internal locking, and two racing calls with the
/// same key under external locking released between operations may both
/// execute the wrapped function - there is no single-flight guarantee.
///
/// # Examples
///
/// ```
/// use memocache_core::{CallArgs, Memoizer, ParamSchema};
///
/// let mut calls = 0;
/// let mut doubled = Memoizer::new(ParamSchema::new().required("n"), move |args| {
///     calls += 1;
///     args.positional()[0].as_int().unwrap_or(0) * 2
/// });
///
/// assert_eq!(doubled.call(&CallArgs::new().arg(21)).unwrap(), 42);
/// assert_eq!(doubled.call(&CallArgs::new().arg(21)).unwrap(), 42); // cached
/// assert_eq!(doubled.len(), 1);
/// ```
pub struct Memoizer<V> {
    schema: ParamSchema,
    func: Box<dyn FnMut(&CallArgs) -> V>,
    cache: HashMap<CacheKey, V>,
    #[cfg(feature = "stats")]
    stats: CacheStats,
}

impl<V: Clone> Memoizer<V> {
    /// Wraps `func`, whose calls are keyed through `schema`.
    pub fn new(schema: ParamSchema, func: impl FnMut(&CallArgs) -> V + 'static) -> Self {
        Self {
            schema,
            func: Box::new(func),
            cache: HashMap::new(),
            #[cfg(feature = "stats")]
            stats: CacheStats::new(),
        }
    }

    /// Calls the wrapped function through the cache.
    ///
    /// On a hit the stored value is returned without invoking the function;
    /// on a miss the function runs and its result is stored. Fails only
    /// when the arguments cannot be bound against the schema.
    pub fn call(&mut self, args: &CallArgs) -> Result<V, CacheError> {
        let key = self.schema.build_key(args)?;
        if let Some(value) = self.cache.get(&key) {
            #[cfg(feature = "stats")]
            self.stats.record_hit();
            return Ok(value.clone());
        }
        #[cfg(feature = "stats")]
        self.stats.record_miss();
        let value = (self.func)(args);
        self.cache.insert(key, value.clone());
        Ok(value)
    }

    /// Removes all cached values.
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
/// cached.
///
/// [`Memoizer::call`] would store whatever the function returns, errors
/// included; `call_result` stores `Ok` values only, so a failed call
/// propagates its error unchanged and the next identical call re-invokes
/// the function.
impl<T: Clone, E: Clone> Memoizer<Result<T, E>> {
    pub fn call_result(&mut self, args: &CallArgs) -> Result<Result<T, E>, CacheError> {
        let key = self.schema.build_key(args)?;
        if let Some(value) = self.cache.get(&key) {
            #[cfg(feature = "stats")]
            self.stats.record_hit();
            return Ok(value.clone());
        }
        #[cfg(feature = "stats")]
        self.stats.record_miss();
        let value = (self.func)(args);
        if value.is_ok() {
            self.cache.insert(key, value.clone());
        }
        Ok(value)
    }
}
