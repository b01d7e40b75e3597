use innboard::config::{AppConfig, Env};
use serial_test::serial;
use std::{env, panic};

// --- Setup/Teardown Utilities ---

/// Runs a test closure with a temporary environment, restoring the original
/// variable values afterward even if the closure panics. Combined with
/// `#[serial]`, this keeps the env-mutating tests from trampling each other.
fn run_with_env<T, R>(vars: Vec<(&'static str, Option<&str>)>, test: T) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    // Save current values of everything we are about to touch.
    let originals: Vec<(String, Option<String>)> = vars
        .iter()
        .map(|(key, _)| (key.to_string(), env::var(key).ok()))
        .collect();

    for (key, value) in &vars {
        unsafe {
            match value {
                Some(value) => env::set_var(key, value),
                None => env::remove_var(key),
            }
        }
    }

    let result = panic::catch_unwind(test);

    // Restore original environment variables.
    for (key, original_value) in originals.into_iter().rev() {
        unsafe {
            if let Some(val) = original_value {
                env::set_var(&key, val);
            } else {
                env::remove_var(&key);
            }
        }
    }

    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

// --- Tests ---

#[test]
#[serial]
fn test_load_defaults_to_local_with_fallback_secret() {
    let config = run_with_env(
        vec![
            ("APP_ENV", None),
            ("DATABASE_URL", Some("postgres://localhost/innboard_test")),
            ("JWT_SECRET", None),
            ("GOOGLE_CLIENT_ID", None),
            ("GOOGLE_CLIENT_SECRET", None),
            ("GOOGLE_REDIRECT_URL", None),
        ],
        AppConfig::load,
    );

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.db_url, "postgres://localhost/innboard_test");
    // Local falls back to the development secret; OAuth stays unconfigured.
    assert!(!config.jwt_secret.is_empty());
    assert!(config.google_client_id.is_empty());
}

#[test]
#[serial]
fn test_load_production_requires_jwt_secret() {
    let panicked = run_with_env(
        vec![
            ("APP_ENV", Some("production")),
            ("DATABASE_URL", Some("postgres://localhost/innboard_test")),
            ("JWT_SECRET", None),
        ],
        || panic::catch_unwind(AppConfig::load).is_err(),
    );

    assert!(panicked, "production startup without JWT_SECRET must fail fast");
}

#[test]
#[serial]
fn test_load_requires_database_url() {
    let panicked = run_with_env(
        vec![("APP_ENV", None), ("DATABASE_URL", None)],
        || panic::catch_unwind(AppConfig::load).is_err(),
    );

    assert!(panicked, "startup without DATABASE_URL must fail fast");
}

#[test]
fn test_default_config_is_test_safe() {
    // The Default impl must never panic and must stay in Local mode so test
    // states can use the x-user-id bypass.
    let config = AppConfig::default();

    assert_eq!(config.env, Env::Local);
    assert!(!config.jwt_secret.is_empty());
    assert!(config.db_url.starts_with("postgres://"));
}
