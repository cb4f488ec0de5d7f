use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};

/// A single component of a cache key.
///
/// `KeyValue` is a closed variant type covering the argument shapes a cached
/// call can carry: null, booleans, integers, floats, strings, sequences, and
/// string-keyed mappings. Keys built from it are structural - two values are
/// the same key component iff they have the same shape and payload - so no
/// two distinct argument sets can collide the way textual key renderings can.
///
/// Floats are compared and hashed by bit pattern. That makes `NaN` equal to
/// itself (a cached call with a `NaN` argument hits its own entry) and keeps
/// `0.0` and `-0.0` distinct.
///
/// # Examples
///
/// ```
/// use memocache_core::{KeyValue, ToKeyValue};
///
/// assert_eq!(42i32.to_key_value(), KeyValue::Int(42));
/// assert_eq!("a".to_key_value(), KeyValue::Str("a".to_string()));
/// assert_eq!(
///     vec![1, 2].to_key_value(),
///     KeyValue::Seq(vec![KeyValue::Int(1), KeyValue::Int(2)])
/// );
/// ```
#[derive(Debug, Clone)]
pub enum KeyValue {
    Null,
    Bool(bool),
    Int(i128),
    Float(f64),
    Str(String),
    Seq(Vec<KeyValue>),
    /// Pairs sorted by name; built sorted by the conversions in this module.
    Map(Vec<(String, KeyValue)>),
}

impl KeyValue {
    /// Returns the integer payload, if this is an `Int`.
    pub fn as_int(&self) -> Option<i128> {
        match self {
            KeyValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the float payload, if this is a `Float`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            KeyValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the boolean payload, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            KeyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string payload, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            KeyValue::Str(v) => Some(v.as_str()),
            _ => None,
        }
    }
}

impl PartialEq for KeyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (KeyValue::Null, KeyValue::Null) => true,
            (KeyValue::Bool(a), KeyValue::Bool(b)) => a == b,
            (KeyValue::Int(a), KeyValue::Int(b)) => a == b,
            (KeyValue::Float(a), KeyValue::Float(b)) => a.to_bits() == b.to_bits(),
            (KeyValue::Str(a), KeyValue::Str(b)) => a == b,
            (KeyValue::Seq(a), KeyValue::Seq(b)) => a == b,
            (KeyValue::Map(a), KeyValue::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for KeyValue {}

impl Hash for KeyValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            KeyValue::Null => {}
            KeyValue::Bool(v) => v.hash(state),
            KeyValue::Int(v) => v.hash(state),
            KeyValue::Float(v) => v.to_bits().hash(state),
            KeyValue::Str(v) => v.hash(state),
            KeyValue::Seq(v) => v.hash(state),
            KeyValue::Map(v) => v.hash(state),
        }
    }
}

/// The canonical key of a cached call: an ordered sequence of [`KeyValue`]
/// parts.
///
/// For memoized functions the parts are the effective argument values after
/// default resolution, in declared-parameter order, followed by any extra
/// keyword arguments as a trailing sorted mapping (see
/// [`ParamSchema::build_key`](crate::ParamSchema::build_key)). For the
/// `#[memoize]` macro the parts are simply the call's arguments in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(Vec<KeyValue>);

impl CacheKey {
    pub fn new(parts: Vec<KeyValue>) -> Self {
        CacheKey(parts)
    }

    pub fn parts(&self) -> &[KeyValue] {
        &self.0
    }
}

/// Builds a [`CacheKey`] from a list of expressions implementing
/// [`ToKeyValue`].
///
/// This mirrors the key expression the `#[memoize]` attribute generates, so
/// a key built here addresses the same entry:
///
/// ```
/// use memocache_core::memo_key;
///
/// let key = memo_key![7, "units"];
/// assert_eq!(key.parts().len(), 2);
/// ```
#[macro_export]
macro_rules! memo_key {
    ($($arg:expr),* $(,)?) => {
        $crate::CacheKey::new(vec![$($crate::ToKeyValue::to_key_value(&$arg)),*])
    };
}

/// Conversion of an argument value into its structural [`KeyValue`] form.
///
/// Implemented for the primitive types, strings, `Option`, sequences, small
/// tuples, and string-keyed maps. Implement it for your own argument types
/// to make them usable with `#[memoize]`:
///
/// ```
/// use memocache_core::{KeyValue, ToKeyValue};
///
/// struct UserId(u64);
///
/// impl ToKeyValue for UserId {
///     fn to_key_value(&self) -> KeyValue {
///         KeyValue::Int(self.0 as i128)
///     }
/// }
/// ```
pub trait ToKeyValue {
    fn to_key_value(&self) -> KeyValue;
}

impl<T: ToKeyValue + ?Sized> ToKeyValue for &T {
    fn to_key_value(&self) -> KeyValue {
        (**self).to_key_value()
    }
}

impl ToKeyValue for () {
    fn to_key_value(&self) -> KeyValue {
        KeyValue::Null
    }
}

impl ToKeyValue for bool {
    fn to_key_value(&self) -> KeyValue {
        KeyValue::Bool(*self)
    }
}

macro_rules! impl_to_key_value_int {
    ($($ty:ty),*) => {
        $(
            impl ToKeyValue for $ty {
                fn to_key_value(&self) -> KeyValue {
                    KeyValue::Int(*self as i128)
                }
            }
        )*
    };
}

impl_to_key_value_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl ToKeyValue for f32 {
    fn to_key_value(&self) -> KeyValue {
        KeyValue::Float(*self as f64)
    }
}

impl ToKeyValue for f64 {
    fn to_key_value(&self) -> KeyValue {
        KeyValue::Float(*self)
    }
}

impl ToKeyValue for char {
    fn to_key_value(&self) -> KeyValue {
        KeyValue::Str(self.to_string())
    }
}

impl ToKeyValue for str {
    fn to_key_value(&self) -> KeyValue {
        KeyValue::Str(self.to_string())
    }
}

impl ToKeyValue for String {
    fn to_key_value(&self) -> KeyValue {
        KeyValue::Str(self.clone())
    }
}

impl<T: ToKeyValue> ToKeyValue for Option<T> {
    fn to_key_value(&self) -> KeyValue {
        match self {
            Some(v) => v.to_key_value(),
            None => KeyValue::Null,
        }
    }
}

impl<T: ToKeyValue> ToKeyValue for [T] {
    fn to_key_value(&self) -> KeyValue {
        KeyValue::Seq(self.iter().map(ToKeyValue::to_key_value).collect())
    }
}

impl<T: ToKeyValue> ToKeyValue for Vec<T> {
    fn to_key_value(&self) -> KeyValue {
        self.as_slice().to_key_value()
    }
}

impl<T: ToKeyValue, const N: usize> ToKeyValue for [T; N] {
    fn to_key_value(&self) -> KeyValue {
        self.as_slice().to_key_value()
    }
}

macro_rules! impl_to_key_value_tuple {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: ToKeyValue),+> ToKeyValue for ($($name,)+) {
            fn to_key_value(&self) -> KeyValue {
                KeyValue::Seq(vec![$(self.$idx.to_key_value()),+])
            }
        }
    };
}

impl_to_key_value_tuple!(A: 0);
impl_to_key_value_tuple!(A: 0, B: 1);
impl_to_key_value_tuple!(A: 0, B: 1, C: 2);
impl_to_key_value_tuple!(A: 0, B: 1, C: 2, D: 3);

impl<T: ToKeyValue> ToKeyValue for BTreeMap<String, T> {
    fn to_key_value(&self) -> KeyValue {
        KeyValue::Map(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_key_value()))
                .collect(),
        )
    }
}

impl<T: ToKeyValue> ToKeyValue for HashMap<String, T> {
    fn to_key_value(&self) -> KeyValue {
        let mut pairs: Vec<(String, KeyValue)> = self
            .iter()
            .map(|(k, v)| (k.clone(), v.to_key_value()))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        KeyValue::Map(pairs)
    }
}
