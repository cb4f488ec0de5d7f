/// Integration tests for the statistics registry and custom cache names

#[cfg(feature = "stats")]
#[cfg(test)]
mod tests {
    use memocache::memoize;
    use serial_test::serial;

    // Defined outside the tests so every test shares the same statics.
    #[memoize(name = "stats_custom_cache")]
    fn with_custom_name(x: i32) -> i32 {
        x * 2
    }

    #[memoize]
    fn with_default_name(x: i32) -> i32 {
        x * 3
    }

    #[test]
    #[serial]
    fn test_names_registered_after_first_call() {
        with_custom_name(900_100);
        with_default_name(900_100);

        let registered = memocache::stats_registry::list();
        assert!(
            registered.contains(&"stats_custom_cache".to_string()),
            "custom name should be registered"
        );
        assert!(
            registered.contains(&"with_default_name".to_string()),
            "default name should be registered"
        );
    }

    #[test]
    #[serial]
    fn test_hit_and_miss_counts() {
        with_custom_name(0); // ensure registration before reset
        memocache::stats_registry::reset("stats_custom_cache");

        // Values not used by any other test in this file.
        with_custom_name(700_001); // miss
        with_custom_name(700_001); // hit
        with_custom_name(700_002); // miss
        with_custom_name(700_001); // hit

        let stats = memocache::stats_registry::get("stats_custom_cache")
            .expect("stats registered under the custom name");
        assert_eq!(stats.hits(), 2);
        assert_eq!(stats.misses(), 2);
        assert_eq!(stats.total_accesses(), 4);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    #[serial]
    fn test_reset_zeroes_counters() {
        with_default_name(800_001);
        assert!(memocache::stats_registry::reset("with_default_name"));

        let stats = memocache::stats_registry::get("with_default_name").unwrap();
        assert_eq!(stats.total_accesses(), 0);

        assert!(!memocache::stats_registry::reset("stats_unknown_cache"));
    }

    #[memoize(capacity = 8, name = "stats_bounded_cache")]
    fn bounded_with_stats(x: i32) -> i32 {
        x + 1
    }

    #[test]
    #[serial]
    fn test_bounded_cache_reports_stats() {
        bounded_with_stats(0);
        memocache::stats_registry::reset("stats_bounded_cache");

        bounded_with_stats(600_001); // miss
        bounded_with_stats(600_001); // hit

        let stats = memocache::stats_registry::get("stats_bounded_cache").unwrap();
        assert_eq!(stats.hits(), 1);
        assert_eq!(stats.misses(), 1);
    }
}
