/// A value computed on first access and cached until cleared.
///
/// Unlike [`once_cell::sync::Lazy`], the stored value can be dropped with
/// [`clear`](LazyConstant::clear) to force the next access to recompute,
/// which suits constants derived from mutable external state.
///
/// # Examples
///
/// ```
/// use memocache_core::LazyConstant;
///
/// let mut port = LazyConstant::new(|| 8080_u16);
/// assert_eq!(port.get_value(), 8080);
/// port.clear();
/// assert_eq!(port.get_value(), 8080); // recomputed
/// ```
pub struct LazyConstant<T> {
    provider: Box<dyn FnMut() -> T>,
    value: Option<T>,
}

impl<T: Clone> LazyConstant<T> {
    pub fn new(provider: impl FnMut() -> T + 'static) -> Self {
        Self {
            provider: Box::new(provider),
            value: None,
        }
    }

    /// Returns the cached value, computing it first if absent.
    pub fn get_value(&mut self) -> T {
        if let Some(value) = &self.value {
            return value.clone();
        }
        self.compute()
    }

    /// Recomputes unconditionally, replacing any cached value.
    pub fn compute(&mut self) -> T {
        let value = (self.provider)();
        self.value = Some(value.clone());
        value
    }

    /// Drops the cached value so the next access recomputes.
    pub fn clear(&mut self) {
        self.value = None;
    }

    pub fn is_computed(&self) -> bool {
        self.value.is_some()
    }
}
