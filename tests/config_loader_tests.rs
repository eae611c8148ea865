use std::{
    env, fs,
    path::PathBuf,
    sync::{Mutex, MutexGuard, OnceLock},
};

use tempfile::TempDir;
use tourcrm::config::{ConfigError, ConfigLoader};

const SECRET: &str = "config-tests-secret-0123456789abcdef";

const VARS: &[&str] = &[
    "TOURCRM_PROFILE",
    "TOURCRM_API_BIND_ADDR",
    "TOURCRM_LOG_LEVEL",
    "TOURCRM_LOG_FORMAT",
    "TOURCRM_JWT_SECRET",
    "TOURCRM_RUN_MIGRATIONS",
    "TOURCRM_RATE_LOCK_FROM_CURRENCY",
    "TOURCRM_RATE_LOCK_TO_CURRENCY",
    "TOURCRM_RETENTION_TICK_SECONDS",
];

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn env_guard() -> MutexGuard<'static, ()> {
    env_lock()
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
}

fn clear_env() {
    for var in VARS {
        unsafe {
            env::remove_var(var);
        }
    }
}

fn set_env(key: &str, value: &str) {
    unsafe {
        env::set_var(key, value);
    }
}

fn write_env_file(dir: &TempDir, name: &str, contents: &str) {
    fs::write(dir.path().join(name), contents).unwrap();
}

fn loader(dir: &TempDir) -> ConfigLoader {
    ConfigLoader::with_base_dir(PathBuf::from(dir.path()))
}

#[test]
fn loads_defaults_when_no_env_present() {
    let _guard = env_guard();
    clear_env();
    set_env("TOURCRM_JWT_SECRET", SECRET);

    let temp_dir = TempDir::new().unwrap();
    let cfg = loader(&temp_dir).load().expect("config loads with defaults");

    assert_eq!(cfg.profile, "local");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:8080");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.log_format, "json");
    assert!(cfg.run_migrations);
    assert_eq!(cfg.rate_lock.from_currency, "TRY");
    assert_eq!(cfg.rate_lock.to_currency, "EUR");
    assert_eq!(cfg.retention.tick_seconds, 3600);
    cfg.bind_addr().expect("default bind addr parses");
    clear_env();
}

#[test]
fn layered_env_files_apply_in_order() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "TOURCRM_API_BIND_ADDR=127.0.0.1:3000\n");
    write_env_file(
        &temp_dir,
        ".env.test",
        "TOURCRM_API_BIND_ADDR=192.168.0.10:5000\n",
    );
    write_env_file(
        &temp_dir,
        ".env.test.local",
        "TOURCRM_API_BIND_ADDR=10.0.0.5:6000\n",
    );

    // Select profile via .env.local before profile-specific files load.
    write_env_file(
        &temp_dir,
        ".env.local",
        &format!(
            "TOURCRM_PROFILE=test\nTOURCRM_API_BIND_ADDR=127.0.0.1:4000\nTOURCRM_JWT_SECRET={SECRET}\n"
        ),
    );

    let cfg = loader(&temp_dir)
        .load()
        .expect("config loads with layered env files");

    assert_eq!(cfg.profile, "test");
    assert_eq!(cfg.api_bind_addr, "10.0.0.5:6000");
    assert_eq!(cfg.jwt_secret.as_deref(), Some(SECRET));
    clear_env();
}

#[test]
fn os_environment_has_highest_precedence() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        &format!("TOURCRM_API_BIND_ADDR=127.0.0.1:3000\nTOURCRM_JWT_SECRET={SECRET}\n"),
    );
    set_env("TOURCRM_API_BIND_ADDR", "0.0.0.0:9090");
    set_env("TOURCRM_RATE_LOCK_FROM_CURRENCY", "usd");

    let cfg = loader(&temp_dir)
        .load()
        .expect("config loads with env override");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:9090");
    assert_eq!(cfg.rate_lock.from_currency, "USD");

    clear_env();
}

#[test]
fn missing_or_short_jwt_secret_is_rejected() {
    let _guard = env_guard();
    clear_env();
    let temp_dir = TempDir::new().unwrap();

    let err = loader(&temp_dir).load().expect_err("secret is required");
    assert!(matches!(err, ConfigError::MissingJwtSecret));

    set_env("TOURCRM_JWT_SECRET", "short");
    let err = loader(&temp_dir).load().expect_err("secret is too short");
    assert!(matches!(err, ConfigError::JwtSecretTooShort { length: 5 }));

    clear_env();
}

#[test]
fn invalid_bind_addr_returns_error() {
    let _guard = env_guard();
    clear_env();
    set_env("TOURCRM_API_BIND_ADDR", "not-an-addr");
    set_env("TOURCRM_JWT_SECRET", SECRET);

    let temp_dir = TempDir::new().unwrap();
    let err = loader(&temp_dir)
        .load()
        .expect_err("invalid bind addr should fail");
    assert!(format!("{}", err).contains("invalid api bind address"));

    clear_env();
}

#[test]
fn invalid_values_are_rejected() {
    let _guard = env_guard();
    clear_env();
    set_env("TOURCRM_JWT_SECRET", SECRET);
    let temp_dir = TempDir::new().unwrap();

    set_env("TOURCRM_RUN_MIGRATIONS", "maybe");
    let err = loader(&temp_dir).load().expect_err("bool must parse");
    assert!(matches!(err, ConfigError::InvalidBool { .. }));
    clear_env();
    set_env("TOURCRM_JWT_SECRET", SECRET);

    set_env("TOURCRM_RATE_LOCK_TO_CURRENCY", "TRY");
    let err = loader(&temp_dir).load().expect_err("pair must differ");
    assert!(matches!(err, ConfigError::IdenticalRateLockPair { .. }));
    clear_env();
    set_env("TOURCRM_JWT_SECRET", SECRET);

    set_env("TOURCRM_RETENTION_TICK_SECONDS", "5");
    let err = loader(&temp_dir).load().expect_err("tick too short");
    assert!(matches!(
        err,
        ConfigError::InvalidRetentionTickInterval { value: 5 }
    ));
    clear_env();
    set_env("TOURCRM_JWT_SECRET", SECRET);

    set_env("TOURCRM_LOG_FORMAT", "xml");
    let err = loader(&temp_dir).load().expect_err("unknown log format");
    assert!(matches!(err, ConfigError::InvalidLogFormat { .. }));
    clear_env();
}
