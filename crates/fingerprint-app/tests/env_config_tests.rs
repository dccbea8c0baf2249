//! Integration tests for environment-driven defaults.

use fingerprint_app::{DEFAULT_LOG_FILTER, log_filter_from_env, seed_from_env};
use fingerprint_quadtree::DEFAULT_SEED;

#[test]
fn env_config_tests_fall_back_on_missing_or_bad_values() {
    // Safety:
    // - Integration tests mutate process env in a single-threaded test body.
    // - We reset the variables before returning.
    unsafe { std::env::set_var("FINGERPRINT_SEED", "7") };
    assert_eq!(seed_from_env(), 7);

    // Safety: see rationale above.
    unsafe { std::env::set_var("FINGERPRINT_SEED", "not-a-seed") };
    assert_eq!(seed_from_env(), DEFAULT_SEED);

    // Safety: see rationale above.
    unsafe { std::env::remove_var("FINGERPRINT_SEED") };
    assert_eq!(seed_from_env(), DEFAULT_SEED);

    // Safety: see rationale above.
    unsafe { std::env::set_var("FINGERPRINT_LOG", "  ") };
    assert_eq!(log_filter_from_env(), DEFAULT_LOG_FILTER);

    // Safety: see rationale above.
    unsafe { std::env::set_var("FINGERPRINT_LOG", "fingerprint_app=debug") };
    assert_eq!(log_filter_from_env(), "fingerprint_app=debug");

    // Safety: see rationale above.
    unsafe { std::env::remove_var("FINGERPRINT_LOG") };
}
