use park_config::{AppConfig, ConfigError, StorageMode};
use std::collections::HashMap;

fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    AppConfig::from_lookup(|key| vars.get(key).cloned())
}

const MINIMAL: &[(&str, &str)] = &[
    ("PARK_STORAGE", "memory"),
    ("PARK_JWT_SECRET", "secret"),
    ("PARK_JWT_ACCESS_TTL_SECONDS", "3600"),
    ("PARK_JWT_REFRESH_TTL_SECONDS", "7200"),
];

#[test]
fn defaults_apply_for_minimal_memory_config() {
    let config = load(MINIMAL).expect("config");
    assert_eq!(config.storage, StorageMode::Memory);
    assert_eq!(config.http_addr, "127.0.0.1:8080");
    assert_eq!(config.sensor_presence_ttl_seconds, 120);
    assert_eq!(config.mqtt_port, 1883);
    assert_eq!(config.mqtt_client_id, "park-ingest");
    assert_eq!(config.mqtt_event_topic, "sensor/event");
    assert!(!config.ingest_enabled);
    assert!(config.redis_url.is_none());
    assert!(config.audit_retention_days.is_none());
    assert_eq!(config.jwt_access_ttl_seconds, 3600);
}

#[test]
fn postgres_requires_database_url() {
    let err = load(&[
        ("PARK_JWT_SECRET", "secret"),
        ("PARK_JWT_ACCESS_TTL_SECONDS", "3600"),
        ("PARK_JWT_REFRESH_TTL_SECONDS", "7200"),
    ])
    .expect_err("missing database url");
    assert!(matches!(err, ConfigError::Missing(key) if key == "PARK_DATABASE_URL"));

    let config = load(&[
        ("PARK_DATABASE_URL", "postgres://localhost/park"),
        ("PARK_JWT_SECRET", "secret"),
        ("PARK_JWT_ACCESS_TTL_SECONDS", "3600"),
        ("PARK_JWT_REFRESH_TTL_SECONDS", "7200"),
    ])
    .expect("config");
    assert_eq!(config.storage, StorageMode::Postgres);
}

#[test]
fn missing_jwt_secret_is_reported() {
    let err = load(&[("PARK_STORAGE", "memory")]).expect_err("missing secret");
    assert!(matches!(err, ConfigError::Missing(key) if key == "PARK_JWT_SECRET"));
}

#[test]
fn invalid_values_are_rejected() {
    let mut pairs = MINIMAL.to_vec();
    pairs.push(("PARK_MQTT_PORT", "not-a-port"));
    assert!(matches!(load(&pairs), Err(ConfigError::Invalid(key, _)) if key == "PARK_MQTT_PORT"));

    let mut pairs = MINIMAL.to_vec();
    pairs[0] = ("PARK_STORAGE", "sqlite");
    assert!(matches!(load(&pairs), Err(ConfigError::Invalid(key, _)) if key == "PARK_STORAGE"));
}

#[test]
fn optional_features_are_read() {
    let mut pairs = MINIMAL.to_vec();
    pairs.extend_from_slice(&[
        ("PARK_INGEST", "on"),
        ("PARK_REDIS_URL", "redis://localhost:6379"),
        ("PARK_AUDIT_RETENTION_DAYS", "30"),
        ("PARK_MQTT_USERNAME", "park"),
        ("PARK_MQTT_PASSWORD", ""),
    ]);
    let config = load(&pairs).expect("config");
    assert!(config.ingest_enabled);
    assert_eq!(config.redis_url.as_deref(), Some("redis://localhost:6379"));
    assert_eq!(config.audit_retention_days, Some(30));
    assert_eq!(config.mqtt_username.as_deref(), Some("park"));
    assert!(config.mqtt_password.is_none());
}

#[test]
fn zero_retention_disables_purge() {
    let mut pairs = MINIMAL.to_vec();
    pairs.push(("PARK_AUDIT_RETENTION_DAYS", "0"));
    assert!(load(&pairs).expect("config").audit_retention_days.is_none());
}

#[test]
fn from_env_reads_process_environment() {
    // Rust 2024 中 set_var 需要显式 unsafe；仅本测试修改进程环境。
    unsafe {
        std::env::set_var("PARK_STORAGE", "memory");
        std::env::set_var("PARK_JWT_SECRET", "secret");
        std::env::set_var("PARK_JWT_ACCESS_TTL_SECONDS", "60");
        std::env::set_var("PARK_JWT_REFRESH_TTL_SECONDS", "120");
        std::env::set_var("PARK_HTTP_ADDR", "127.0.0.1:8081");
    }
    let config = AppConfig::from_env().expect("config");
    assert_eq!(config.http_addr, "127.0.0.1:8081");
    assert_eq!(config.jwt_refresh_ttl_seconds, 120);
}
