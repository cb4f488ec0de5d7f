use std::time::{Duration, Instant};

/// Internal wrapper that tracks when a value was stored.
///
/// Each TTL-governed cached value is wrapped in a `CacheEntry` recording its
/// creation (or last refresh) timestamp. Expiration is a fixed window: the
/// window is measured from `inserted_at` and is not extended by reads.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use memocache_core::CacheEntry;
///
/// let entry = CacheEntry::new(42);
/// assert_eq!(entry.value, 42);
/// assert!(!entry.is_stale(Duration::from_secs(60)));
/// ```
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub inserted_at: Instant,
}

impl<V> CacheEntry<V> {
    /// Creates an entry timestamped now.
    pub fn new(value: V) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
        }
    }

    /// Returns true if strictly more than `ttl` has elapsed since the entry
    /// was stored or last refreshed.
    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() > ttl
    }

    /// Replaces the value and resets the timestamp to now.
    pub fn refresh(&mut self, value: V) {
        self.value = value;
        self.inserted_at = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_fresh_entry_is_not_stale() {
        let entry = CacheEntry::new("data");
        assert!(!entry.is_stale(Duration::from_secs(10)));
    }

    #[test]
    fn test_entry_goes_stale() {
        let entry = CacheEntry::new(1);
        thread::sleep(Duration::from_millis(30));
        assert!(entry.is_stale(Duration::from_millis(10)));
        assert!(!entry.is_stale(Duration::from_secs(5)));
    }

    #[test]
    fn test_refresh_resets_timestamp() {
        let mut entry = CacheEntry::new(1);
        thread::sleep(Duration::from_millis(30));
        entry.refresh(2);
        assert_eq!(entry.value, 2);
        assert!(!entry.is_stale(Duration::from_millis(20)));
    }
}
