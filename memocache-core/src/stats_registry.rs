//! Name-indexed access to per-function cache statistics.
//!
//! Each `#[memoize]` expansion registers its `CacheStats` here (when the
//! `stats` feature is on), so hit rates can be inspected by function name
//! without a handle to the cache itself.
//!
//! ```
//! use memocache_core::stats_registry;
//!
//! if let Some(stats) = stats_registry::get("fetch_user") {
//!     println!("hit rate: {:.2}%", stats.hit_rate() * 100.0);
//! }
//! ```

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::CacheStats;

static STATS_REGISTRY: Lazy<RwLock<HashMap<String, &'static Lazy<CacheStats>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Registers a cache's statistics under `name`, typically the function
/// name. Called by the `#[memoize]` expansion.
pub fn register(name: &str, stats: &'static Lazy<CacheStats>) {
    STATS_REGISTRY.write().insert(name.to_string(), stats);
}

/// Snapshot of the statistics for one cache, `None` when the name is not
/// registered.
pub fn get(name: &str) -> Option<CacheStats> {
    STATS_REGISTRY.read().get(name).map(|stats| (**stats).clone())
}

/// Live reference to the statistics for one cache.
pub fn get_ref(name: &str) -> Option<&'static CacheStats> {
    STATS_REGISTRY.read().get(name).map(|stats| &***stats)
}

/// All registered cache names.
pub fn list() -> Vec<String> {
    STATS_REGISTRY.read().keys().cloned().collect()
}

/// Drops every registration without touching the counters themselves.
pub fn clear() {
    STATS_REGISTRY.write().clear();
}

/// Zeroes the counters of one cache. Returns whether the name was known.
pub fn reset(name: &str) -> bool {
    if let Some(stats) = STATS_REGISTRY.read().get(name) {
        stats.reset();
        true
    } else {
        false
    }
}
