//! # Memocache Core
//!
//! Core building blocks for the Memocache memoization library.
//!
//! This crate provides the runtime pieces the `#[memoize]` attribute macro
//! expands to, and they are equally usable on their own:
//!
//! - **Structural cache keys**: [`CacheKey`] built from typed argument
//!   values, so `1` and `"1"` never collide
//! - **Argument binding**: [`ParamSchema`] and [`CallArgs`] normalize
//!   positional and keyword-style arguments to one canonical key
//! - **Bounded caching**: [`LruCache`] with O(1) operations and eviction
//!   callbacks
//! - **Memoization**: unbounded [`Memoizer`], expiring [`TtlMemoizer`],
//!   and [`PerInstanceCache`] keyed by instance identity
//! - **Shared stores**: [`MemoStore`] over `'static` locked maps, shared
//!   across threads
//! - **Invalidation by name**: [`MemoRegistry`] reaches any registered
//!   cache from anywhere in the program
//! - **Statistics**: per-cache hit/miss counters behind the `stats`
//!   feature
//!
//! ## Module Organization
//!
//! - `key` - structural key values and the [`memo_key!`] macro
//! - `schema` - parameter schemas and call-argument binding
//! - `lru` - the bounded cache
//! - `entry` - timestamped entry wrapper for TTL support
//! - `store` - thread-safe shared memoization store
//! - [`registry`] - name-based cache invalidation

mod entry;
mod error;
mod key;
mod lazy;
mod lru;
mod memo;
mod per_instance;
mod schema;
mod store;
mod ttl;

pub mod registry;

#[cfg(feature = "stats")]
mod stats;

#[cfg(feature = "stats")]
pub mod stats_registry;

pub use entry::CacheEntry;
pub use error::CacheError;
pub use key::{CacheKey, KeyValue, ToKeyValue};
pub use lazy::LazyConstant;
pub use lru::{EvictionCallback, LruCache};
pub use memo::Memoizer;
pub use per_instance::{InstanceId, PerInstanceCache};
pub use registry::{clear_all_caches, clear_cache, dirty, MemoRegistry};
pub use schema::{CallArgs, ParamSchema};
pub use store::MemoStore;
pub use ttl::TtlMemoizer;

#[cfg(feature = "stats")]
pub use stats::CacheStats;
