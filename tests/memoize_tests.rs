/// Integration tests for the basic `#[memoize]` attribute

#[cfg(test)]
mod tests {
    use memocache::{memoize, KeyValue, ToKeyValue};
    use serial_test::serial;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    static PLAIN_CALLS: AtomicUsize = AtomicUsize::new(0);

    #[memoize]
    fn double(x: i64) -> i64 {
        PLAIN_CALLS.fetch_add(1, Ordering::SeqCst);
        x * 2
    }

    #[test]
    #[serial]
    fn test_repeat_call_uses_cache() {
        let before = PLAIN_CALLS.load(Ordering::SeqCst);
        assert_eq!(double(21), 42);
        assert_eq!(double(21), 42);
        assert_eq!(double(21), 42);
        assert_eq!(PLAIN_CALLS.load(Ordering::SeqCst) - before, 1);
    }

    #[test]
    #[serial]
    fn test_distinct_arguments_get_distinct_entries() {
        let before = PLAIN_CALLS.load(Ordering::SeqCst);
        assert_eq!(double(100), 200);
        assert_eq!(double(101), 202);
        assert_eq!(double(100), 200);
        assert_eq!(PLAIN_CALLS.load(Ordering::SeqCst) - before, 2);
    }

    static MULTI_ARG_CALLS: AtomicUsize = AtomicUsize::new(0);

    #[memoize]
    fn describe(id: u32, label: &str, strict: bool) -> String {
        MULTI_ARG_CALLS.fetch_add(1, Ordering::SeqCst);
        format!("{id}:{label}:{strict}")
    }

    #[test]
    #[serial]
    fn test_multiple_argument_types_in_key() {
        let before = MULTI_ARG_CALLS.load(Ordering::SeqCst);
        assert_eq!(describe(1, "a", true), "1:a:true");
        assert_eq!(describe(1, "a", true), "1:a:true");
        // Any changed argument is a different key.
        assert_eq!(describe(1, "a", false), "1:a:false");
        assert_eq!(describe(1, "b", true), "1:b:true");
        assert_eq!(describe(2, "a", true), "2:a:true");
        assert_eq!(MULTI_ARG_CALLS.load(Ordering::SeqCst) - before, 4);
    }

    static TYPE_CALLS: AtomicUsize = AtomicUsize::new(0);

    #[memoize]
    fn stringify(v: i64) -> String {
        TYPE_CALLS.fetch_add(1, Ordering::SeqCst);
        v.to_string()
    }

    #[memoize]
    fn stringify_text(v: &str) -> String {
        TYPE_CALLS.fetch_add(1, Ordering::SeqCst);
        v.to_string()
    }

    #[test]
    #[serial]
    fn test_numbers_and_strings_never_collide() {
        // Same printable representation, different key type - the caches
        // are per function, and the key values are typed besides.
        let before = TYPE_CALLS.load(Ordering::SeqCst);
        assert_eq!(stringify(7), "7");
        assert_eq!(stringify_text("7"), "7");
        assert_eq!(TYPE_CALLS.load(Ordering::SeqCst) - before, 2);
    }

    static FIB_CALLS: AtomicUsize = AtomicUsize::new(0);

    #[memoize]
    fn fibonacci(n: u32) -> u64 {
        FIB_CALLS.fetch_add(1, Ordering::SeqCst);
        if n <= 1 {
            return n as u64;
        }
        fibonacci(n - 1) + fibonacci(n - 2)
    }

    #[test]
    #[serial]
    fn test_recursive_function_memoized() {
        let before = FIB_CALLS.load(Ordering::SeqCst);
        assert_eq!(fibonacci(20), 6765);
        // Linear in n, not exponential: each value computed once.
        assert!(FIB_CALLS.load(Ordering::SeqCst) - before <= 21);
        let mid = FIB_CALLS.load(Ordering::SeqCst);
        assert_eq!(fibonacci(20), 6765);
        assert_eq!(FIB_CALLS.load(Ordering::SeqCst), mid);
    }

    static SHARED_CALLS: AtomicUsize = AtomicUsize::new(0);

    #[memoize]
    fn shared_lookup(x: u64) -> u64 {
        SHARED_CALLS.fetch_add(1, Ordering::SeqCst);
        thread::sleep(std::time::Duration::from_millis(5));
        x + 1000
    }

    #[test]
    #[serial]
    fn test_cache_shared_across_threads() {
        shared_lookup(5); // populate from the main thread

        let before = SHARED_CALLS.load(Ordering::SeqCst);
        let handles: Vec<_> = (0..4)
            .map(|_| thread::spawn(|| shared_lookup(5)))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1005);
        }
        assert_eq!(SHARED_CALLS.load(Ordering::SeqCst), before);
    }

    #[derive(Clone)]
    struct Scaler {
        factor: i64,
    }

    impl ToKeyValue for Scaler {
        fn to_key_value(&self) -> KeyValue {
            KeyValue::Int(self.factor as i128)
        }
    }

    static METHOD_CALLS: AtomicUsize = AtomicUsize::new(0);

    impl Scaler {
        #[memoize]
        fn scale(&self, x: i64) -> i64 {
            METHOD_CALLS.fetch_add(1, Ordering::SeqCst);
            self.factor * x
        }
    }

    #[test]
    #[serial]
    fn test_method_receiver_participates_in_key() {
        let double = Scaler { factor: 2 };
        let triple = Scaler { factor: 3 };

        let before = METHOD_CALLS.load(Ordering::SeqCst);
        assert_eq!(double.scale(10), 20);
        assert_eq!(double.scale(10), 20);
        assert_eq!(triple.scale(10), 30);
        assert_eq!(METHOD_CALLS.load(Ordering::SeqCst) - before, 2);
    }
}
