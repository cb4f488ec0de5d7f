use std::collections::HashMap;
use std::sync::{Arc, Weak};

use crate::{CacheError, CacheKey, CallArgs, ParamSchema};

/// Identity of a cached-for instance, taken from its allocation address.
///
/// Stable for the lifetime of the allocation; reusable afterwards, which is
/// why each id is paired with a [`Weak`] observer and swept once the
/// instance is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(usize);

impl InstanceId {
    pub fn of<T>(owner: &Arc<T>) -> Self {
        InstanceId(Arc::as_ptr(owner) as usize)
    }
}

struct InstanceSlot<T, V> {
    observer: Weak<T>,
    cache: HashMap<CacheKey, V>,
}

/// A memoization cache keyed first by instance identity, then by call
/// arguments.
///
/// Each instance gets its own inner argument map, so entries for one
/// instance never collide with another's and dropping an instance releases
/// all of its entries. The cache holds only a [`Weak`] observer per
/// instance and sweeps dead slots on every operation, so it never keeps
/// an instance alive and never serves a recycled allocation address stale
/// values.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use memocache_core::{CallArgs, ParamSchema, PerInstanceCache};
///
/// struct Circle {
///     radius: f64,
/// }
///
/// let mut areas = PerInstanceCache::new(ParamSchema::new());
/// let circle = Arc::new(Circle { radius: 2.0 });
///
/// let area = areas.call(&circle, &CallArgs::new(), |c, _| {
///     std::f64::consts::PI * c.radius * c.radius
/// });
/// assert_eq!(area, Ok(std::f64::consts::PI * 4.0));
/// ```
pub struct PerInstanceCache<T, V> {
    schema: ParamSchema,
    slots: HashMap<InstanceId, InstanceSlot<T, V>>,
}

impl<T, V: Clone> PerInstanceCache<T, V> {
    pub fn new(schema: ParamSchema) -> Self {
        Self {
            schema,
            slots: HashMap::new(),
        }
    }

    /// Computes `func(owner, args)` through the per-instance cache.
    ///
    /// The first call for a given `(owner, args)` pair invokes `func`;
    /// repeats return the stored value without touching `func` again.
    pub fn call(
        &mut self,
        owner: &Arc<T>,
        args: &CallArgs,
        func: impl FnOnce(&T, &CallArgs) -> V,
    ) -> Result<V, CacheError> {
        self.sweep();
        let key = self.schema.build_key(args)?;
        let id = InstanceId::of(owner);
        let slot = self.slots.entry(id).or_insert_with(|| InstanceSlot {
            observer: Arc::downgrade(owner),
            cache: HashMap::new(),
        });
        if let Some(value) = slot.cache.get(&key) {
            return Ok(value.clone());
        }
        let value = func(owner, args);
        slot.cache.insert(key, value.clone());
        Ok(value)
    }

    /// Drops every entry belonging to one instance. Unknown ids are a
    /// no-op.
    pub fn forget(&mut self, id: InstanceId) {
        self.slots.remove(&id);
        self.sweep();
    }

    /// Ids of the instances that still hold entries. Sweeps first, so a
    /// dropped instance never shows up.
    pub fn live_instances(&mut self) -> Vec<InstanceId> {
        self.sweep();
        self.slots.keys().copied().collect()
    }

    /// Number of instances with live entries.
    pub fn len(&mut self) -> usize {
        self.sweep();
        self.slots.len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    /// Drops all entries for all instances.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    fn sweep(&mut self) {
        self.slots
            .retain(|_, slot| slot.observer.strong_count() > 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Widget {
        factor: i128,
    }

    fn schema() -> ParamSchema {
        ParamSchema::new().required("n")
    }

    #[test]
    fn test_repeat_call_cached_per_instance() {
        let calls = Rc::new(Cell::new(0));
        let mut cache: PerInstanceCache<Widget, i128> = PerInstanceCache::new(schema());
        let widget = Arc::new(Widget { factor: 3 });

        for _ in 0..3 {
            let counter = Rc::clone(&calls);
            let value = cache
                .call(&widget, &CallArgs::new().arg(5), move |w, args| {
                    counter.set(counter.get() + 1);
                    w.factor * args.positional()[0].as_int().unwrap_or(0)
                })
                .unwrap();
            assert_eq!(value, 15);
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_instances_do_not_share_entries() {
        let mut cache: PerInstanceCache<Widget, i128> = PerInstanceCache::new(schema());
        let a = Arc::new(Widget { factor: 2 });
        let b = Arc::new(Widget { factor: 10 });
        let args = CallArgs::new().arg(4);

        let compute = |w: &Widget, args: &CallArgs| {
            w.factor * args.positional()[0].as_int().unwrap_or(0)
        };
        assert_eq!(cache.call(&a, &args, compute).unwrap(), 8);
        assert_eq!(cache.call(&b, &args, compute).unwrap(), 40);
        assert_eq!(cache.len(), 2);
        assert!(cache.live_instances().contains(&InstanceId::of(&a)));
        assert!(cache.live_instances().contains(&InstanceId::of(&b)));
    }

    #[test]
    fn test_dropped_instance_swept() {
        let mut cache: PerInstanceCache<Widget, i128> = PerInstanceCache::new(schema());
        let a = Arc::new(Widget { factor: 2 });
        let b = Arc::new(Widget { factor: 3 });
        cache.call(&a, &CallArgs::new().arg(1), |w, _| w.factor).unwrap();
        cache.call(&b, &CallArgs::new().arg(1), |w, _| w.factor).unwrap();

        let id_a = InstanceId::of(&a);
        drop(a);
        assert_eq!(cache.len(), 1);
        assert!(!cache.live_instances().contains(&id_a));
        assert_eq!(cache.live_instances(), vec![InstanceId::of(&b)]);
    }

    #[test]
    fn test_recycled_address_recomputes() {
        // Force the scenario a sweep protects against: a dead slot must not
        // answer for whichever instance later occupies its address.
        let calls = Rc::new(Cell::new(0));
        let mut cache: PerInstanceCache<Widget, i128> = PerInstanceCache::new(schema());

        let first = Arc::new(Widget { factor: 7 });
        let counter = Rc::clone(&calls);
        cache
            .call(&first, &CallArgs::new().arg(1), move |w, _| {
                counter.set(counter.get() + 1);
                w.factor
            })
            .unwrap();
        drop(first);

        let second = Arc::new(Widget { factor: 9 });
        let counter = Rc::clone(&calls);
        let value = cache
            .call(&second, &CallArgs::new().arg(1), move |w, _| {
                counter.set(counter.get() + 1);
                w.factor
            })
            .unwrap();
        assert_eq!(value, 9);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_forget_drops_one_instance() {
        let calls = Rc::new(Cell::new(0));
        let mut cache: PerInstanceCache<Widget, i128> = PerInstanceCache::new(schema());
        let widget = Arc::new(Widget { factor: 5 });

        let counter = Rc::clone(&calls);
        cache
            .call(&widget, &CallArgs::new().arg(2), move |w, _| {
                counter.set(counter.get() + 1);
                w.factor
            })
            .unwrap();
        cache.forget(InstanceId::of(&widget));

        let counter = Rc::clone(&calls);
        cache
            .call(&widget, &CallArgs::new().arg(2), move |w, _| {
                counter.set(counter.get() + 1);
                w.factor
            })
            .unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_cache_does_not_keep_instance_alive() {
        let mut cache: PerInstanceCache<Widget, i128> = PerInstanceCache::new(schema());
        let widget = Arc::new(Widget { factor: 1 });
        cache.call(&widget, &CallArgs::new().arg(1), |w, _| w.factor).unwrap();
        assert_eq!(Arc::strong_count(&widget), 1);
    }
}
