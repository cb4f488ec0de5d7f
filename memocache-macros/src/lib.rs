use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::parse::Parser;
use syn::{
    parse_macro_input, punctuated::Punctuated, Expr, FnArg, ItemFn, MetaNameValue, ReturnType,
    Token,
};

/// Parsed `#[memoize(...)]` attributes.
struct MemoizeAttributes {
    ttl: Option<u64>,
    capacity: Option<usize>,
    custom_name: Option<String>,
}

impl Default for MemoizeAttributes {
    fn default() -> Self {
        Self {
            ttl: None,
            capacity: None,
            custom_name: None,
        }
    }
}

fn int_value<T>(nv: &MetaNameValue, attr: &str) -> syn::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match &nv.value {
        Expr::Lit(expr_lit) => match &expr_lit.lit {
            syn::Lit::Int(lit_int) => lit_int.base10_parse::<T>(),
            other => Err(syn::Error::new_spanned(
                other,
                format!("invalid literal for `{attr}`: expected integer"),
            )),
        },
        other => Err(syn::Error::new_spanned(
            other,
            format!("invalid syntax for `{attr}`: expected `{attr} = <integer>`"),
        )),
    }
}

fn str_value(nv: &MetaNameValue, attr: &str) -> syn::Result<String> {
    match &nv.value {
        Expr::Lit(expr_lit) => match &expr_lit.lit {
            syn::Lit::Str(s) => Ok(s.value()),
            other => Err(syn::Error::new_spanned(
                other,
                format!("invalid literal for `{attr}`: expected string"),
            )),
        },
        other => Err(syn::Error::new_spanned(
            other,
            format!("invalid syntax for `{attr}`: expected `{attr} = \"...\"`"),
        )),
    }
}

fn parse_attributes(attr: TokenStream2) -> syn::Result<MemoizeAttributes> {
    let mut attrs = MemoizeAttributes::default();
    if attr.is_empty() {
        return Ok(attrs);
    }

    let parsed = Punctuated::<MetaNameValue, Token![,]>::parse_terminated.parse2(attr)?;
    for nv in &parsed {
        if nv.path.is_ident("ttl") {
            let secs: u64 = int_value(nv, "ttl")?;
            if secs == 0 {
                return Err(syn::Error::new_spanned(
                    &nv.value,
                    "`ttl` must be a positive number of seconds",
                ));
            }
            attrs.ttl = Some(secs);
        } else if nv.path.is_ident("capacity") {
            let capacity: usize = int_value(nv, "capacity")?;
            if capacity == 0 {
                return Err(syn::Error::new_spanned(
                    &nv.value,
                    "`capacity` must be positive",
                ));
            }
            attrs.capacity = Some(capacity);
        } else if nv.path.is_ident("name") {
            attrs.custom_name = Some(str_value(nv, "name")?);
        } else {
            return Err(syn::Error::new_spanned(
                &nv.path,
                "unknown attribute: expected `ttl`, `capacity`, or `name`",
            ));
        }
    }

    if attrs.ttl.is_some() && attrs.capacity.is_some() {
        return Err(syn::Error::new_spanned(
            &parsed,
            "`ttl` and `capacity` cannot be combined on one function",
        ));
    }

    Ok(attrs)
}

/// Cache key expression from the function's receiver and arguments.
///
/// Every argument (and `self`, for methods) goes through `ToKeyValue`, so
/// keys are structural rather than textual.
fn generate_key_expr(has_self: bool, arg_pats: &[TokenStream2]) -> TokenStream2 {
    let mut parts = Vec::new();
    if has_self {
        parts.push(quote! { ::memocache_core::ToKeyValue::to_key_value(&self) });
    }
    for pat in arg_pats {
        parts.push(quote! { ::memocache_core::ToKeyValue::to_key_value(&#pat) });
    }
    quote! { ::memocache_core::CacheKey::new(vec![#(#parts),*]) }
}

/// Generate the registration block executed once on the first call.
fn generate_registration(
    fn_name_str: &str,
    stats_ident: &syn::Ident,
    clear_expr: TokenStream2,
    remove_expr: TokenStream2,
) -> TokenStream2 {
    quote! {
        {
            use ::std::sync::Once;
            static REGISTER_ONCE: Once = Once::new();
            REGISTER_ONCE.call_once(|| {
                ::memocache_core::MemoRegistry::global().register(
                    #fn_name_str,
                    #clear_expr,
                    #remove_expr,
                );
                #[cfg(feature = "stats")]
                ::memocache_core::stats_registry::register(#fn_name_str, &#stats_ident);
            });
        }
    }
}

/// Generate the unbounded / TTL branch backed by `MemoStore`.
#[allow(clippy::too_many_arguments)]
fn generate_store_body(
    cache_ident: &syn::Ident,
    stats_ident: &syn::Ident,
    ret_type: &TokenStream2,
    ttl_expr: &TokenStream2,
    key_expr: &TokenStream2,
    block: &syn::Block,
    fn_name_str: &str,
    is_result: bool,
) -> TokenStream2 {
    let insert_call = if is_result {
        quote! { __store.insert_ok(__key, &__result); }
    } else {
        quote! { __store.insert(__key, __result.clone()); }
    };
    let registration = generate_registration(
        fn_name_str,
        stats_ident,
        quote! { || { #cache_ident.write().clear(); } },
        quote! { |__key: &::memocache_core::CacheKey| #cache_ident.write().remove(__key).is_some() },
    );

    quote! {
        static #cache_ident: ::once_cell::sync::Lazy<
            ::parking_lot::RwLock<
                ::std::collections::HashMap<
                    ::memocache_core::CacheKey,
                    ::memocache_core::CacheEntry<#ret_type>,
                >,
            >,
        > = ::once_cell::sync::Lazy::new(|| {
            ::parking_lot::RwLock::new(::std::collections::HashMap::new())
        });

        #[cfg(feature = "stats")]
        static #stats_ident: ::once_cell::sync::Lazy<::memocache_core::CacheStats> =
            ::once_cell::sync::Lazy::new(::memocache_core::CacheStats::new);

        #registration

        let __store = ::memocache_core::MemoStore::<#ret_type>::new(
            &#cache_ident,
            #ttl_expr,
            #[cfg(feature = "stats")]
            &#stats_ident,
        );

        let __key = #key_expr;
        if let Some(cached) = __store.get(&__key) {
            return cached;
        }

        let __result = (|| #block)();
        #insert_call
        __result
    }
}

/// Generate the bounded branch backed by `LruCache`.
///
/// The mutex is held only around individual cache operations, never across
/// the function body, so recursive memoized functions do not deadlock.
fn generate_lru_body(
    cache_ident: &syn::Ident,
    stats_ident: &syn::Ident,
    ret_type: &TokenStream2,
    capacity: usize,
    key_expr: &TokenStream2,
    block: &syn::Block,
    fn_name_str: &str,
    is_result: bool,
) -> TokenStream2 {
    let insert_call = if is_result {
        quote! {
            if __result.is_ok() {
                #cache_ident.lock().insert(__key, __result.clone());
            }
        }
    } else {
        quote! { #cache_ident.lock().insert(__key, __result.clone()); }
    };
    let registration = generate_registration(
        fn_name_str,
        stats_ident,
        quote! { || { #cache_ident.lock().clear(); } },
        quote! { |__key: &::memocache_core::CacheKey| #cache_ident.lock().remove(__key).is_ok() },
    );

    quote! {
        static #cache_ident: ::once_cell::sync::Lazy<
            ::parking_lot::Mutex<::memocache_core::LruCache<::memocache_core::CacheKey, #ret_type>>,
        > = ::once_cell::sync::Lazy::new(|| {
            ::parking_lot::Mutex::new(
                ::memocache_core::LruCache::new(#capacity)
                    .expect("capacity is validated at expansion time"),
            )
        });

        #[cfg(feature = "stats")]
        static #stats_ident: ::once_cell::sync::Lazy<::memocache_core::CacheStats> =
            ::once_cell::sync::Lazy::new(::memocache_core::CacheStats::new);

        #registration

        let __key = #key_expr;
        let __cached = {
            let mut __cache = #cache_ident.lock();
            __cache.get(&__key).cloned()
        };
        #[cfg(feature = "stats")]
        {
            if __cached.is_some() {
                #stats_ident.record_hit();
            } else {
                #stats_ident.record_miss();
            }
        }
        if let Some(cached) = __cached {
            return cached;
        }

        let __result = (|| #block)();
        #insert_call
        __result
    }
}

/// Adds automatic memoization to a function or method.
///
/// The expansion declares a `'static` cache keyed by the function's
/// arguments (converted through `ToKeyValue`), looks the key up before
/// running the body, and stores the result afterwards. The cache is shared
/// across threads; no lock is held while the body runs.
///
/// # Requirements
///
/// - Every argument, and `self` for methods, must implement `ToKeyValue`
/// - The return type must implement `Clone`
/// - The function should be pure: same inputs, same output, no side
///   effects the caller relies on
///
/// # Parameters
///
/// - `ttl` (optional): seconds an entry stays valid. A call after
///   expiration recomputes and restarts the window.
/// - `capacity` (optional): bound the cache to this many entries with LRU
///   eviction. Must be positive, and cannot be combined with `ttl`.
/// - `name` (optional): identifier used in the invalidation and statistics
///   registries. Defaults to the function name.
///
/// # Result-returning functions
///
/// When the return type is a `Result`, only `Ok` values are cached.
/// Transient failures are re-attempted on the next call instead of being
/// replayed from the cache.
///
/// # Examples
///
/// ```ignore
/// use memocache::memoize;
///
/// #[memoize]
/// fn fibonacci(n: u32) -> u64 {
///     if n <= 1 {
///         return n as u64;
///     }
///     fibonacci(n - 1) + fibonacci(n - 2)
/// }
/// ```
///
/// Expiring entries after five minutes:
///
/// ```ignore
/// #[memoize(ttl = 300)]
/// fn fetch_rates(currency: &str) -> f64 {
///     query_upstream(currency)
/// }
/// ```
///
/// A bounded cache with LRU eviction:
///
/// ```ignore
/// #[memoize(capacity = 100)]
/// fn render_tile(x: i32, y: i32) -> Tile {
///     expensive_render(x, y)
/// }
/// ```
///
/// Invalidation by name from anywhere in the program:
///
/// ```ignore
/// use memocache::{clear_cache, dirty, memo_key};
///
/// #[memoize(name = "user_profiles")]
/// fn load_profile(id: u64) -> Profile {
///     db_lookup(id)
/// }
///
/// dirty("user_profiles", &memo_key!(42u64))?; // one entry
/// clear_cache("user_profiles")?;              // everything
/// ```
#[proc_macro_attribute]
pub fn memoize(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attrs = match parse_attributes(attr.into()) {
        Ok(attrs) => attrs,
        Err(err) => return err.to_compile_error().into(),
    };

    let input = parse_macro_input!(item as ItemFn);
    let vis = &input.vis;
    let sig = &input.sig;
    let ident = &sig.ident;
    let block = &input.block;

    let ret_type = match &sig.output {
        ReturnType::Type(_, ty) => quote! { #ty },
        ReturnType::Default => quote! { () },
    };

    let mut arg_pats = Vec::new();
    let mut has_self = false;
    for arg in sig.inputs.iter() {
        match arg {
            FnArg::Receiver(_) => has_self = true,
            FnArg::Typed(pat_type) => {
                let pat = &pat_type.pat;
                arg_pats.push(quote! { #pat });
            }
        }
    }

    let cache_ident = format_ident!("MEMO_CACHE_{}", ident.to_string().to_uppercase());
    let stats_ident = format_ident!("MEMO_STATS_{}", ident.to_string().to_uppercase());

    let key_expr = generate_key_expr(has_self, &arg_pats);

    // Textual Result detection, same caveats as any attribute macro: type
    // aliases that hide a Result are treated as plain values.
    let is_result = {
        let s = quote!(#ret_type).to_string().replace(' ', "");
        s.starts_with("Result<") || s.starts_with("std::result::Result<")
    };

    let fn_name_str = attrs.custom_name.unwrap_or_else(|| ident.to_string());

    let body = if let Some(capacity) = attrs.capacity {
        generate_lru_body(
            &cache_ident,
            &stats_ident,
            &ret_type,
            capacity,
            &key_expr,
            block,
            &fn_name_str,
            is_result,
        )
    } else {
        let ttl_expr = match attrs.ttl {
            Some(secs) => quote! { Some(::std::time::Duration::from_secs(#secs)) },
            None => quote! { None },
        };
        generate_store_body(
            &cache_ident,
            &stats_ident,
            &ret_type,
            &ttl_expr,
            &key_expr,
            block,
            &fn_name_str,
            is_result,
        )
    };

    let expanded = quote! {
        #vis #sig {
            #body
        }
    };

    TokenStream::from(expanded)
}
