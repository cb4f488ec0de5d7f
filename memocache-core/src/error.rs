use thiserror::Error;

/// Errors produced by the caching primitives.
///
/// Configuration problems (`InvalidCapacity`, `InvalidTtl`) are reported at
/// construction time; `MissingArgument` is a call-time binding failure from
/// [`ParamSchema::build_key`](crate::ParamSchema::build_key); `NotFound` is
/// surfaced by operations that address something by name or key, such as
/// [`LruCache::remove`](crate::LruCache::remove) and the registry lookups in
/// [`registry`](crate::registry). The memoizers never expose `NotFound` - a
/// miss is resolved transparently by invoking the wrapped function.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The cache capacity must be a positive number of entries.
    #[error("capacity must be positive, not {0}")]
    InvalidCapacity(usize),

    /// The time-to-live must be a positive duration.
    #[error("ttl must be a positive duration")]
    InvalidTtl,

    /// The addressed key is not present in the cache.
    #[error("key not found")]
    NotFound,

    /// A declared parameter could not be resolved from positional arguments,
    /// keyword arguments, or a declared default.
    #[error("missing argument `{0}`")]
    MissingArgument(String),
}
