//! # Memocache
//!
//! A lightweight, thread-safe memoization library for Rust built around a
//! `#[memoize]` procedural macro and a reusable caching core.
//!
//! ## Features
//!
//! - **Easy to use**: add `#[memoize]` to any function or method
//! - **Structural keys**: arguments become typed key values, so `1` and
//!   `"1"` never collide and `1.0` and `-0.0` are told apart
//! - **TTL expiration**: `#[memoize(ttl = 300)]` recomputes entries older
//!   than the window
//! - **Capacity bounds**: `#[memoize(capacity = 100)]` caps the cache with
//!   O(1) LRU eviction
//! - **Name-based invalidation**: clear a whole cache or a single entry
//!   from anywhere via [`clear_cache`] and [`dirty`]
//! - **Result-aware**: only `Ok` values of `Result`-returning functions
//!   are cached
//!
//! ## Quick Start
//!
//! ```rust
//! use memocache::memoize;
//!
//! #[memoize]
//! fn fibonacci(n: u32) -> u64 {
//!     if n <= 1 {
//!         return n as u64;
//!     }
//!     fibonacci(n - 1) + fibonacci(n - 2)
//! }
//!
//! // First call computes the result
//! let result1 = fibonacci(10);
//! // Second call returns the cached result
//! let result2 = fibonacci(10);
//! assert_eq!(result1, result2);
//! ```
//!
//! ## Custom Cache Keys
//!
//! Arguments are converted through [`ToKeyValue`]. Implement it for your
//! own types to control what identifies a call:
//!
//! ```rust
//! use memocache::{memoize, KeyValue, ToKeyValue};
//!
//! #[derive(Clone)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! impl ToKeyValue for User {
//!     fn to_key_value(&self) -> KeyValue {
//!         // Only the id identifies a user; the name is irrelevant here.
//!         KeyValue::Int(self.id as i128)
//!     }
//! }
//!
//! #[memoize]
//! fn permissions(user: &User) -> Vec<String> {
//!     vec![format!("read:{}", user.id)]
//! }
//! ```
//!
//! ## Methods
//!
//! `#[memoize]` works on methods too; `self` participates in the key, so
//! implement [`ToKeyValue`] for the receiver type:
//!
//! ```rust
//! use memocache::{memoize, KeyValue, ToKeyValue};
//!
//! #[derive(Clone)]
//! struct Calculator {
//!     precision: u32,
//! }
//!
//! impl ToKeyValue for Calculator {
//!     fn to_key_value(&self) -> KeyValue {
//!         KeyValue::Int(self.precision as i128)
//!     }
//! }
//!
//! impl Calculator {
//!     #[memoize]
//!     fn add(&self, a: i32, b: i32) -> i32 {
//!         a + b
//!     }
//! }
//! ```
//!
//! ## Error Handling
//!
//! Functions returning `Result<T, E>` cache only successful results:
//!
//! ```rust
//! use memocache::memoize;
//!
//! #[memoize]
//! fn divide(a: i32, b: i32) -> Result<i32, String> {
//!     if b == 0 {
//!         Err("Division by zero".to_string())
//!     } else {
//!         Ok(a / b)
//!     }
//! }
//!
//! // Ok results are cached
//! let _ = divide(10, 2);
//! // Err results are NOT cached and will be retried
//! let _ = divide(10, 0);
//! ```
//!
//! ## Invalidation
//!
//! Every memoized function registers under its name (or the `name`
//! attribute), so its cache can be reached from anywhere:
//!
//! ```rust
//! use memocache::{clear_cache, dirty, memo_key, memoize};
//!
//! #[memoize]
//! fn load_profile(id: u64) -> String {
//!     format!("profile-{id}")
//! }
//!
//! load_profile(42);
//! // Drop one entry, forcing recomputation for id 42 only:
//! dirty("load_profile", &memo_key!(42u64)).unwrap();
//! // Or drop everything:
//! clear_cache("load_profile").unwrap();
//! ```

pub use memocache_core::*;
pub use memocache_macros::memoize;
