use std::collections::HashMap;
use std::hash::Hash;

use tracing::{debug, trace};

use crate::CacheError;

#[cfg(feature = "stats")]
use crate::CacheStats;

/// Index into the node slot vector.
type NodeIndex = usize;

/// Sentinel for absent links.
const NIL: NodeIndex = usize::MAX;

/// A node in the intrusive doubly linked recency list. The list runs from
/// least recently used (head) to most recently used (tail).
struct Node<K, V> {
    key: K,
    value: V,
    prev: NodeIndex,
    next: NodeIndex,
}

/// Callback invoked with `(key, value)` for every entry that leaves the
/// cache - by capacity eviction, by [`LruCache::remove`], or by a
/// non-suppressed [`LruCache::clear`]. `Send` so a cache can live behind
/// a shared lock.
pub type EvictionCallback<K, V> = Box<dyn FnMut(&K, &V) + Send>;

/// A capacity-bounded map that discards its least recently used entry when
/// full.
///
/// Every read or overwrite promotes the touched entry to most recently
/// used; among entries that are never touched again, eviction order is
/// strictly insertion order. Lookup, insertion, and removal are O(1):
/// entries live in a slot vector threaded by an intrusive doubly linked
/// list, indexed by a `HashMap`, with freed slots recycled through a free
/// list. Recency promotion on read is the hot path, so there is no
/// linear reordering anywhere.
///
/// The cache performs no internal synchronization; it assumes a single
/// owner or external locking around each operation.
///
/// # Examples
///
/// ```
/// use memocache_core::LruCache;
///
/// let mut cache = LruCache::new(3).unwrap();
/// cache.insert("a", 0);
/// cache.insert("b", 1);
/// cache.insert("c", 2);
/// assert_eq!(cache.len(), 3);
///
/// // "a" is now the most recently used entry.
/// assert_eq!(cache.get(&"a"), Some(&0));
///
/// // Inserting past capacity drops the least recently used entry ("b").
/// cache.insert("d", 3);
/// assert_eq!(cache.len(), 3);
/// assert!(!cache.contains_key(&"b"));
/// ```
///
/// With an eviction callback:
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use memocache_core::LruCache;
///
/// let evicted = Arc::new(Mutex::new(Vec::new()));
/// let log = Arc::clone(&evicted);
/// let mut cache = LruCache::with_eviction_callback(1, move |key: &i32, value: &i32| {
///     log.lock().unwrap().push((*key, *value));
/// })
/// .unwrap();
///
/// cache.insert(1, 10);
/// cache.insert(2, 20); // evicts (1, 10)
/// assert_eq!(*evicted.lock().unwrap(), vec![(1, 10)]);
/// ```
pub struct LruCache<K, V> {
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<NodeIndex>,
    map: HashMap<K, NodeIndex>,
    head: NodeIndex,
    tail: NodeIndex,
    capacity: usize,
    on_evict: Option<EvictionCallback<K, V>>,
    #[cfg(feature = "stats")]
    stats: CacheStats,
}

impl<K, V> std::fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruCache")
            .field("capacity", &self.capacity)
            .field("len", &self.map.len())
            .finish_non_exhaustive()
    }
}

impl<K: Hash + Eq + Clone, V> LruCache<K, V> {
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// Fails with [`CacheError::InvalidCapacity`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        Self::build(capacity, None)
    }

    /// Creates a cache that invokes `on_evict` with `(key, value)` for
    /// every entry that leaves it.
    ///
    /// The callback runs synchronously inside the operation that removed
    /// the entry; a panic in the callback is not caught and unwinds to that
    /// operation's caller.
    pub fn with_eviction_callback(
        capacity: usize,
        on_evict: impl FnMut(&K, &V) + Send + 'static,
    ) -> Result<Self, CacheError> {
        Self::build(capacity, Some(Box::new(on_evict)))
    }

    fn build(capacity: usize, on_evict: Option<EvictionCallback<K, V>>) -> Result<Self, CacheError> {
        if capacity == 0 {
            return Err(CacheError::InvalidCapacity(capacity));
        }
        Ok(Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            map: HashMap::with_capacity(capacity),
            head: NIL,
            tail: NIL,
            capacity,
            on_evict,
            #[cfg(feature = "stats")]
            stats: CacheStats::new(),
        })
    }

    /// The configured maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The current number of entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns true without touching recency order.
    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Looks up `key`, promoting it to most recently used on a hit.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let index = match self.map.get(key) {
            Some(&index) => index,
            None => {
                #[cfg(feature = "stats")]
                self.stats.record_miss();
                return None;
            }
        };
        self.detach(index);
        self.attach_tail(index);
        #[cfg(feature = "stats")]
        self.stats.record_hit();
        self.slots[index].as_ref().map(|node| &node.value)
    }

    /// Inserts or overwrites `key`.
    ///
    /// An existing entry is overwritten in place and promoted to most
    /// recently used. A new entry inserted at capacity first evicts the
    /// least recently used entry (invoking the eviction callback), then
    /// lands as most recently used.
    pub fn insert(&mut self, key: K, value: V) {
        if let Some(&index) = self.map.get(&key) {
            if let Some(node) = &mut self.slots[index] {
                node.value = value;
            }
            self.detach(index);
            self.attach_tail(index);
            return;
        }

        if self.map.len() == self.capacity {
            self.evict_lru();
        }

        let index = self.alloc(Node {
            key: key.clone(),
            value,
            prev: NIL,
            next: NIL,
        });
        self.map.insert(key, index);
        self.attach_tail(index);
    }

    /// Removes `key` and returns its value, invoking the eviction callback.
    ///
    /// Fails with [`CacheError::NotFound`] when the key is absent.
    pub fn remove(&mut self, key: &K) -> Result<V, CacheError> {
        let index = self.map.remove(key).ok_or(CacheError::NotFound)?;
        self.detach(index);
        let node = self.take_node(index).ok_or(CacheError::NotFound)?;
        self.notify_evicted(&node.key, &node.value);
        Ok(node.value)
    }

    /// Removes all entries, invoking the eviction callback for each in
    /// least-recently-used order.
    pub fn clear(&mut self) {
        self.clear_inner(false);
    }

    /// Removes all entries without invoking the eviction callback.
    pub fn clear_silent(&mut self) {
        self.clear_inner(true);
    }

    fn clear_inner(&mut self, suppress_callback: bool) {
        debug!(entries = self.map.len(), suppress_callback, "clearing lru cache");
        let mut index = self.head;
        while index != NIL {
            let node = match self.slots[index].take() {
                Some(node) => node,
                None => break,
            };
            index = node.next;
            if !suppress_callback {
                self.notify_evicted(&node.key, &node.value);
            }
        }
        self.map.clear();
        self.slots.clear();
        self.free.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    /// Iterates over `(key, value)` pairs from least to most recently used.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: &self.slots,
            index: self.head,
        }
    }

    /// Hit/miss counters for this cache.
    #[cfg(feature = "stats")]
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn evict_lru(&mut self) {
        let index = self.head;
        if index == NIL {
            return;
        }
        self.detach(index);
        if let Some(node) = self.take_node(index) {
            self.map.remove(&node.key);
            trace!("evicting least-recently-used entry");
            self.notify_evicted(&node.key, &node.value);
        }
    }

    fn notify_evicted(&mut self, key: &K, value: &V) {
        if let Some(callback) = self.on_evict.as_mut() {
            callback(key, value);
        }
    }

    fn alloc(&mut self, node: Node<K, V>) -> NodeIndex {
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(node);
                index
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    fn take_node(&mut self, index: NodeIndex) -> Option<Node<K, V>> {
        let node = self.slots[index].take()?;
        self.free.push(index);
        Some(node)
    }

    /// Unlinks `index` from the recency list, leaving its slot allocated.
    fn detach(&mut self, index: NodeIndex) {
        let (prev, next) = match &self.slots[index] {
            Some(node) => (node.prev, node.next),
            None => return,
        };
        if prev == NIL {
            self.head = next;
        } else if let Some(Some(node)) = self.slots.get_mut(prev) {
            node.next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else if let Some(Some(node)) = self.slots.get_mut(next) {
            node.prev = prev;
        }
        if let Some(node) = &mut self.slots[index] {
            node.prev = NIL;
            node.next = NIL;
        }
    }

    /// Links `index` in as the most recently used node.
    fn attach_tail(&mut self, index: NodeIndex) {
        let old_tail = self.tail;
        if let Some(node) = &mut self.slots[index] {
            node.prev = old_tail;
            node.next = NIL;
        }
        if old_tail == NIL {
            self.head = index;
        } else if let Some(Some(node)) = self.slots.get_mut(old_tail) {
            node.next = index;
        }
        self.tail = index;
    }
}

/// Iterator over `(key, value)` pairs, least recently used first.
pub struct Iter<'a, K, V> {
    slots: &'a [Option<Node<K, V>>],
    index: NodeIndex,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.slots.get(self.index)?.as_ref()?;
        self.index = node.next;
        Some((&node.key, &node.value))
    }
}
