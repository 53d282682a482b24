use super::*;

// =============================================================================
// env_bool: uses unique env var names to avoid races with parallel tests.
// =============================================================================

#[test]
fn env_bool_true_variants() {
    for (i, val) in ["1", "true", "yes", "on", "TRUE", " On "].iter().enumerate() {
        let key = format!("__TEST_INK_EB_TRUE_{i}__");
        unsafe { std::env::set_var(&key, val) };
        assert_eq!(env_bool(&key), Some(true), "expected true for {val:?}");
        unsafe { std::env::remove_var(&key) };
    }
}

#[test]
fn env_bool_false_variants() {
    for (i, val) in ["0", "false", "no", "off"].iter().enumerate() {
        let key = format!("__TEST_INK_EB_FALSE_{i}__");
        unsafe { std::env::set_var(&key, val) };
        assert_eq!(env_bool(&key), Some(false), "expected false for {val:?}");
        unsafe { std::env::remove_var(&key) };
    }
}

#[test]
fn env_bool_invalid_or_unset_is_none() {
    let key = "__TEST_INK_EB_INVALID__";
    unsafe { std::env::set_var(key, "maybe") };
    assert_eq!(env_bool(key), None);
    unsafe { std::env::remove_var(key) };
    assert_eq!(env_bool("__TEST_INK_EB_SURELY_UNSET__"), None);
}

// =============================================================================
// env_parse
// =============================================================================

#[test]
fn env_parse_reads_value() {
    let key = "__TEST_INK_EP_OK__";
    unsafe { std::env::set_var(key, " 42 ") };
    assert_eq!(env_parse(key, 7_u64), 42);
    unsafe { std::env::remove_var(key) };
}

#[test]
fn env_parse_falls_back_on_garbage() {
    let key = "__TEST_INK_EP_BAD__";
    unsafe { std::env::set_var(key, "forty") };
    assert_eq!(env_parse(key, 7_u64), 7);
    unsafe { std::env::remove_var(key) };
}

// =============================================================================
// AppConfig
// =============================================================================

#[test]
fn default_config_uses_memory_backend() {
    let config = AppConfig::default();
    assert_eq!(config.port, DEFAULT_PORT);
    assert!(config.supabase.is_none());
    assert_eq!(config.hello_token, "my-secret-token");
    assert!(!config.cookie_secure);
}

#[test]
fn from_env_rejects_bad_port() {
    unsafe { std::env::set_var("PORT", "not-a-port") };
    let err = AppConfig::from_env().unwrap_err();
    assert!(err.to_string().contains("PORT"));
    unsafe { std::env::remove_var("PORT") };
}

#[test]
fn sweep_interval_is_never_zero() {
    assert_eq!(sweep_interval(0), Duration::from_secs(MIN_SESSION_SWEEP_INTERVAL_SECS));
    assert_eq!(sweep_interval(300), Duration::from_secs(300));
}

#[test]
fn default_signed_in_ttl_outlasts_idle_ttl() {
    let config = AppConfig::default();
    assert!(config.session_signed_in_ttl > config.session_idle_ttl);
    assert!(config.sweep_interval > Duration::ZERO);
}
