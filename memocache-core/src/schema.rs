use crate::{CacheError, CacheKey, KeyValue, ToKeyValue};

/// Declared parameters of a wrapped function: an ordered list of names, each
/// with an optional default value.
///
/// The schema is built once, when a function is wrapped, and every call is
/// bound against it - there is no per-call reflection. Binding a call
/// produces a [`CacheKey`] that is independent of how arguments were spelled:
/// a value passed positionally and the same value passed by keyword yield
/// the same key, and parameters left to their defaults are filled in.
///
/// # Examples
///
/// ```
/// use memocache_core::{CallArgs, ParamSchema};
///
/// // fn f(y, z = 4)
/// let schema = ParamSchema::new().required("y").with_default("z", 4);
///
/// let a = schema.build_key(&CallArgs::new().arg(2)).unwrap();
/// let b = schema.build_key(&CallArgs::new().arg(2).arg(4)).unwrap();
/// let c = schema.build_key(&CallArgs::new().arg(2).kwarg("z", 4)).unwrap();
/// let d = schema
///     .build_key(&CallArgs::new().kwarg("y", 2).kwarg("z", 4))
///     .unwrap();
///
/// assert_eq!(a, b);
/// assert_eq!(b, c);
/// assert_eq!(c, d);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParamSchema {
    params: Vec<Param>,
}

#[derive(Debug, Clone)]
struct Param {
    name: String,
    default: Option<KeyValue>,
}

impl ParamSchema {
    pub fn new() -> Self {
        ParamSchema { params: Vec::new() }
    }

    /// Appends a parameter without a default value.
    pub fn required(mut self, name: &str) -> Self {
        self.params.push(Param {
            name: name.to_string(),
            default: None,
        });
        self
    }

    /// Appends a parameter with a declared default.
    pub fn with_default(mut self, name: &str, default: impl ToKeyValue) -> Self {
        self.params.push(Param {
            name: name.to_string(),
            default: Some(default.to_key_value()),
        });
        self
    }

    /// Number of declared parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    fn is_declared(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name == name)
    }

    /// Binds a call's arguments against the schema and returns the canonical
    /// cache key.
    ///
    /// The key starts with the supplied positional values. Each remaining
    /// declared parameter is resolved from the keyword arguments by name,
    /// falling back to its declared default; if neither is available the
    /// binding fails with [`CacheError::MissingArgument`]. Keyword arguments
    /// that do not correspond to a declared parameter are sorted by name and
    /// appended as a trailing mapping, so their spelling order never affects
    /// the key. Positional values beyond the declared parameter list are
    /// retained as supplied.
    ///
    /// This is a pure function of the schema and the arguments; it is raised
    /// at call time, mirroring ordinary call-binding failure.
    pub fn build_key(&self, args: &CallArgs) -> Result<CacheKey, CacheError> {
        let mut parts: Vec<KeyValue> = args.positional.clone();

        for param in self.params.iter().skip(args.positional.len()) {
            let value = match args.keyword(&param.name) {
                Some(v) => v.clone(),
                None => match &param.default {
                    Some(default) => default.clone(),
                    None => return Err(CacheError::MissingArgument(param.name.clone())),
                },
            };
            parts.push(value);
        }

        let mut extras: Vec<(String, KeyValue)> = args
            .keyword
            .iter()
            .filter(|(name, _)| !self.is_declared(name))
            .cloned()
            .collect();
        if !extras.is_empty() {
            extras.sort_by(|a, b| a.0.cmp(&b.0));
            parts.push(KeyValue::Map(extras));
        }

        Ok(CacheKey::new(parts))
    }
}

/// The positional and keyword arguments of one call to a wrapped function.
///
/// Built fluently, consumed by [`ParamSchema::build_key`] and passed through
/// to the wrapped function, which can read the values back with
/// [`positional`](CallArgs::positional) and [`keyword`](CallArgs::keyword).
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    positional: Vec<KeyValue>,
    keyword: Vec<(String, KeyValue)>,
}

impl CallArgs {
    pub fn new() -> Self {
        CallArgs::default()
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl ToKeyValue) -> Self {
        self.positional.push(value.to_key_value());
        self
    }

    /// Appends a keyword argument. A later value for the same name replaces
    /// the earlier one.
    pub fn kwarg(mut self, name: &str, value: impl ToKeyValue) -> Self {
        if let Some(slot) = self.keyword.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value.to_key_value();
        } else {
            self.keyword.push((name.to_string(), value.to_key_value()));
        }
        self
    }

    /// The positional values, in call order.
    pub fn positional(&self) -> &[KeyValue] {
        &self.positional
    }

    /// Looks up a keyword argument by name.
    pub fn keyword(&self, name: &str) -> Option<&KeyValue> {
        self.keyword
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema_y_z4() -> ParamSchema {
        ParamSchema::new().required("y").with_default("z", 4)
    }

    #[test]
    fn test_keyword_normalization() {
        // f(2), f(2, 4), f(2, z=4), f(y=2, z=4) all bind identically.
        let schema = schema_y_z4();
        let keys = [
            schema.build_key(&CallArgs::new().arg(2)).unwrap(),
            schema.build_key(&CallArgs::new().arg(2).arg(4)).unwrap(),
            schema
                .build_key(&CallArgs::new().arg(2).kwarg("z", 4))
                .unwrap(),
            schema
                .build_key(&CallArgs::new().kwarg("y", 2).kwarg("z", 4))
                .unwrap(),
        ];
        for key in &keys[1..] {
            assert_eq!(&keys[0], key);
        }
    }

    #[test]
    fn test_distinct_values_distinct_keys() {
        let schema = schema_y_z4();
        let a = schema.build_key(&CallArgs::new().arg(2)).unwrap();
        let b = schema
            .build_key(&CallArgs::new().arg(2).kwarg("z", 5))
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_missing_required_argument() {
        let schema = schema_y_z4();
        let err = schema.build_key(&CallArgs::new()).unwrap_err();
        assert_eq!(err, CacheError::MissingArgument("y".to_string()));

        let err = schema
            .build_key(&CallArgs::new().kwarg("z", 9))
            .unwrap_err();
        assert_eq!(err, CacheError::MissingArgument("y".to_string()));
    }

    #[test]
    fn test_extra_keywords_sorted_by_name() {
        let schema = ParamSchema::new().required("a");
        let forward = schema
            .build_key(&CallArgs::new().arg(1).kwarg("m", 2).kwarg("k", 3))
            .unwrap();
        let reverse = schema
            .build_key(&CallArgs::new().arg(1).kwarg("k", 3).kwarg("m", 2))
            .unwrap();
        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_extra_positionals_are_retained() {
        let schema = ParamSchema::new().required("a");
        let two = schema.build_key(&CallArgs::new().arg(1).arg(2)).unwrap();
        let one = schema.build_key(&CallArgs::new().arg(1)).unwrap();
        assert_ne!(two, one);
        assert_eq!(two.parts().len(), 2);
    }

    #[test]
    fn test_keyword_for_positionally_bound_param_is_ignored() {
        // Matches the original binder: the keyword entry for an
        // already-bound declared parameter does not enter the key.
        let schema = schema_y_z4();
        let plain = schema.build_key(&CallArgs::new().arg(2)).unwrap();
        let dup = schema
            .build_key(&CallArgs::new().arg(2).kwarg("y", 9))
            .unwrap();
        assert_eq!(plain, dup);
    }

    #[test]
    fn test_binding_is_pure() {
        let schema = schema_y_z4();
        let args = CallArgs::new().arg(1).kwarg("extra", "x");
        assert_eq!(
            schema.build_key(&args).unwrap(),
            schema.build_key(&args).unwrap()
        );
    }

    #[test]
    fn test_kwarg_overwrites_same_name() {
        let args = CallArgs::new().kwarg("n", 1).kwarg("n", 2);
        assert_eq!(args.keyword("n"), Some(&KeyValue::Int(2)));
    }
}
