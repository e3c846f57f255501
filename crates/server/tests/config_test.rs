//! # Configuration Tests
//!
//! Covers defaults, `${VAR}` substitution in the YAML file and environment
//! overrides for both top-level and nested keys.

use std::env;
use std::fs;
use std::sync::Mutex;
use syncscript_server::config::{get_config, ConfigError};
use tempfile::tempdir;

// Environment variables are process-global, so these tests run one at a time.
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env_vars() {
    for var in [
        "PORT",
        "DB_URL",
        "JWT_SECRET",
        "JWT_TTL_SECS",
        "TEST_CITATION_KEY",
        "SYNCSCRIPT_UPLOADS__MAX_BYTES",
        "SYNCSCRIPT_UPLOADS__ALLOWED_CONTENT_TYPES",
        "SYNCSCRIPT_CITATION__API_URL",
    ] {
        env::remove_var(var);
    }
}

#[test]
fn test_get_config_defaults() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_env_vars();

    let config = get_config(None).expect("Configuration should load from defaults");

    assert_eq!(config.port, 9090);
    assert_eq!(config.db_url, "db/syncscript.db");
    assert_eq!(config.jwt_secret, None);
    assert_eq!(config.jwt_ttl_secs, 30 * 24 * 60 * 60);
    assert_eq!(config.uploads.max_bytes, 10 * 1024 * 1024);
    assert_eq!(config.uploads.allowed_content_types, vec!["application/pdf"]);
    assert!(config.citation.is_none());
}

#[test]
fn test_top_level_env_overrides() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_env_vars();
    env::set_var("PORT", "9999");
    env::set_var("DB_URL", "/tmp/other.db");
    env::set_var("JWT_SECRET", "from-env");

    let config = get_config(None).unwrap();
    assert_eq!(config.port, 9999);
    assert_eq!(config.db_url, "/tmp/other.db");
    assert_eq!(config.jwt_secret.as_deref(), Some("from-env"));

    clear_env_vars();
}

#[test]
fn test_nested_env_overrides() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_env_vars();
    env::set_var("SYNCSCRIPT_UPLOADS__MAX_BYTES", "2048");
    env::set_var(
        "SYNCSCRIPT_UPLOADS__ALLOWED_CONTENT_TYPES",
        "application/pdf,application/x-pdf",
    );

    let config = get_config(None).unwrap();
    assert_eq!(config.uploads.max_bytes, 2048);
    assert_eq!(
        config.uploads.allowed_content_types,
        vec!["application/pdf", "application/x-pdf"]
    );

    clear_env_vars();
}

#[test]
fn test_config_file_with_substitution() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_env_vars();
    env::set_var("TEST_CITATION_KEY", "sk-from-env");

    let dir = tempdir().unwrap();
    let path = dir.path().join("config.yml");
    fs::write(
        &path,
        r#"
port: 8181
jwt_secret: "file-secret"
citation:
  api_url: "https://models.example.com/v1/chat/completions"
  api_key: "${TEST_CITATION_KEY}"
  model: "tiny-model"
"#,
    )
    .unwrap();

    let config = get_config(Some(path.to_str().unwrap())).unwrap();
    assert_eq!(config.port, 8181);
    assert_eq!(config.jwt_secret.as_deref(), Some("file-secret"));
    let citation = config.citation.expect("citation section should load");
    assert_eq!(citation.api_key.as_deref(), Some("sk-from-env"));
    assert_eq!(citation.model.as_deref(), Some("tiny-model"));
    assert_eq!(citation.referer, None);

    clear_env_vars();
}

#[test]
fn test_unset_secret_substitution_is_none() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_env_vars();

    let dir = tempdir().unwrap();
    let path = dir.path().join("config.yml");
    fs::write(&path, "jwt_secret: \"${JWT_SECRET}\"\n").unwrap();

    let config = get_config(Some(path.to_str().unwrap())).unwrap();
    assert_eq!(config.jwt_secret, None);
}

#[test]
fn test_missing_override_file() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_env_vars();

    let result = get_config(Some("/definitely/not/here/config.yml"));
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}
