use ipaas_dashboard::config::{ConfigError, ConfigLoader};
use std::{
    env, fs,
    path::PathBuf,
    sync::{Mutex, MutexGuard, OnceLock},
};
use tempfile::TempDir;

const KEY_B64: &str = "YWFhYWFhYWFhYWFhYWFhYWFhYWFhYWFhYWFhYWFhYWE=";

const MANAGED_KEYS: &[&str] = &[
    "IPAAS_PROFILE",
    "IPAAS_API_BIND_ADDR",
    "IPAAS_LOG_LEVEL",
    "IPAAS_CRYPTO_KEY",
    "IPAAS_OPERATOR_TOKEN",
    "IPAAS_OPERATOR_TOKENS",
    "IPAAS_HTTP_TIMEOUT_MS",
    "IPAAS_PARAGON_PROJECT_ID",
    "IPAAS_PARAGON_SIGNING_KEY",
    "IPAAS_PARAGON_TOKEN_TTL_SECONDS",
    "IPAAS_INTEGRATION_APP_WORKSPACE_KEY",
    "IPAAS_INTEGRATION_APP_WORKSPACE_SECRET",
    "IPAAS_MERGE_API_KEY",
    "IPAAS_MERGE_UNIFIED_API_KEY",
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
    for key in MANAGED_KEYS {
        unsafe {
            env::remove_var(key);
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
fn loads_defaults_with_minimal_settings() {
    let _guard = env_guard();
    clear_env();
    let dir = TempDir::new().unwrap();

    set_env("IPAAS_CRYPTO_KEY", KEY_B64);
    set_env("IPAAS_OPERATOR_TOKEN", "op-token");

    let cfg = loader(&dir).load().expect("config loads with defaults");

    assert_eq!(cfg.profile, "local");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:8080");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.http_timeout_ms, 30_000);
    assert_eq!(cfg.operator_tokens, vec!["op-token".to_string()]);
    assert_eq!(cfg.crypto_key.as_deref().map(<[u8]>::len), Some(32));
    assert_eq!(cfg.paragon.token_ttl_seconds, 3600);
    assert_eq!(cfg.paragon.subject_suffix, "Meta");
    assert_eq!(cfg.integration_app.token_ttl_seconds, 7200);
    assert_eq!(cfg.merge.origin_company_name, "Meta default");
    assert!(cfg.paragon.signing_key.is_none());
    cfg.bind_addr().expect("default bind addr parses");
    clear_env();
}

#[test]
fn layered_env_files_apply_in_order() {
    let _guard = env_guard();
    clear_env();
    let dir = TempDir::new().unwrap();

    write_env_file(&dir, ".env", "IPAAS_API_BIND_ADDR=127.0.0.1:3000\n");
    write_env_file(&dir, ".env.test", "IPAAS_API_BIND_ADDR=192.168.0.10:5000\n");
    write_env_file(&dir, ".env.test.local", "IPAAS_API_BIND_ADDR=10.0.0.5:6000\n");
    write_env_file(
        &dir,
        ".env.local",
        &format!(
            "IPAAS_PROFILE=test\nIPAAS_API_BIND_ADDR=127.0.0.1:4000\nIPAAS_OPERATOR_TOKEN=layered\nIPAAS_CRYPTO_KEY={}\n",
            KEY_B64
        ),
    );

    let cfg = loader(&dir).load().expect("config loads with layered env files");

    assert_eq!(cfg.profile, "test");
    assert_eq!(cfg.api_bind_addr, "10.0.0.5:6000");
    clear_env();
}

#[test]
fn os_environment_has_highest_precedence() {
    let _guard = env_guard();
    clear_env();
    let dir = TempDir::new().unwrap();

    write_env_file(
        &dir,
        ".env",
        "IPAAS_API_BIND_ADDR=127.0.0.1:3000\nIPAAS_OPERATOR_TOKEN=from-file\n",
    );
    set_env("IPAAS_API_BIND_ADDR", "0.0.0.0:9090");
    set_env("IPAAS_CRYPTO_KEY", KEY_B64);

    let cfg = loader(&dir).load().expect("config loads with env override");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:9090");
    assert_eq!(cfg.operator_tokens, vec!["from-file".to_string()]);
    clear_env();
}

#[test]
fn operator_token_list_is_split_and_trimmed() {
    let _guard = env_guard();
    clear_env();
    let dir = TempDir::new().unwrap();

    set_env("IPAAS_CRYPTO_KEY", KEY_B64);
    set_env("IPAAS_OPERATOR_TOKENS", " first , ,second ");

    let cfg = loader(&dir).load().unwrap();
    assert_eq!(cfg.operator_tokens, vec!["first", "second"]);
    clear_env();
}

#[test]
fn missing_crypto_key_is_rejected() {
    let _guard = env_guard();
    clear_env();
    let dir = TempDir::new().unwrap();

    set_env("IPAAS_OPERATOR_TOKEN", "op-token");

    let err = loader(&dir).load().unwrap_err();
    assert!(matches!(err, ConfigError::MissingCryptoKey));
    clear_env();
}

#[test]
fn short_crypto_key_is_rejected() {
    let _guard = env_guard();
    clear_env();
    let dir = TempDir::new().unwrap();

    set_env("IPAAS_OPERATOR_TOKEN", "op-token");
    set_env("IPAAS_CRYPTO_KEY", "c2hvcnQ=");

    let err = loader(&dir).load().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidCryptoKeyLength { length: 5 }));
    clear_env();
}

#[test]
fn missing_operator_token_is_rejected() {
    let _guard = env_guard();
    clear_env();
    let dir = TempDir::new().unwrap();

    set_env("IPAAS_CRYPTO_KEY", KEY_B64);

    let err = loader(&dir).load().unwrap_err();
    assert!(matches!(err, ConfigError::MissingOperatorTokens));
    clear_env();
}

#[test]
fn production_profile_requires_provider_credentials() {
    let _guard = env_guard();
    clear_env();
    let dir = TempDir::new().unwrap();

    set_env("IPAAS_PROFILE", "prod");
    set_env("IPAAS_CRYPTO_KEY", KEY_B64);
    set_env("IPAAS_OPERATOR_TOKEN", "op-token");

    let err = loader(&dir).load().unwrap_err();
    assert!(matches!(err, ConfigError::MissingProviderSetting { .. }));
    clear_env();
}

#[test]
fn non_numeric_ttl_is_rejected() {
    let _guard = env_guard();
    clear_env();
    let dir = TempDir::new().unwrap();

    set_env("IPAAS_CRYPTO_KEY", KEY_B64);
    set_env("IPAAS_OPERATOR_TOKEN", "op-token");
    set_env("IPAAS_PARAGON_TOKEN_TTL_SECONDS", "an hour");

    let err = loader(&dir).load().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidNumber { .. }));
    clear_env();
}

#[test]
fn invalid_bind_addr_returns_error() {
    let _guard = env_guard();
    clear_env();
    let dir = TempDir::new().unwrap();

    set_env("IPAAS_API_BIND_ADDR", "not-an-addr");
    set_env("IPAAS_CRYPTO_KEY", KEY_B64);
    set_env("IPAAS_OPERATOR_TOKEN", "op-token");

    let err = loader(&dir).load().unwrap_err();
    assert!(format!("{}", err).contains("invalid api bind address"));
    clear_env();
}
