//! 应用运行配置加载。
//!
//! 所有变量以 `PARK_` 为前缀，进程启动时读取一次，之后以值传递。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 存储后端。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Postgres,
    Memory,
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: String,
    pub storage: StorageMode,
    /// `storage = postgres` 时必填。
    pub database_url: Option<String>,
    /// 未配置时传感器在线状态保存在进程内。
    pub redis_url: Option<String>,
    pub sensor_presence_ttl_seconds: u64,
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_username: Option<String>,
    pub mqtt_password: Option<String>,
    pub mqtt_client_id: String,
    pub mqtt_event_topic: String,
    pub ingest_enabled: bool,
    pub jwt_secret: String,
    pub jwt_access_ttl_seconds: u64,
    pub jwt_refresh_ttl_seconds: u64,
    /// 配置后启用每日审计日志清理。
    pub audit_retention_days: Option<u64>,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意键值来源读取配置。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars { lookup };
        let storage = match vars.optional("PARK_STORAGE") {
            None => StorageMode::Postgres,
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "postgres" => StorageMode::Postgres,
                "memory" => StorageMode::Memory,
                _ => return Err(ConfigError::Invalid("PARK_STORAGE".to_string(), value)),
            },
        };
        let database_url = vars.optional("PARK_DATABASE_URL");
        if storage == StorageMode::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("PARK_DATABASE_URL".to_string()));
        }

        Ok(Self {
            http_addr: vars.with_default("PARK_HTTP_ADDR", "127.0.0.1:8080"),
            storage,
            database_url,
            redis_url: vars.optional("PARK_REDIS_URL"),
            sensor_presence_ttl_seconds: vars
                .parse_with_default("PARK_SENSOR_PRESENCE_TTL_SECONDS", 120)?,
            mqtt_host: vars.with_default("PARK_MQTT_HOST", "127.0.0.1"),
            mqtt_port: vars.parse_with_default("PARK_MQTT_PORT", 1883)?,
            mqtt_username: vars.optional("PARK_MQTT_USERNAME"),
            mqtt_password: vars.optional("PARK_MQTT_PASSWORD"),
            mqtt_client_id: vars.with_default("PARK_MQTT_CLIENT_ID", "park-ingest"),
            mqtt_event_topic: vars.with_default("PARK_MQTT_EVENT_TOPIC", "sensor/event"),
            ingest_enabled: vars.flag("PARK_INGEST", false),
            jwt_secret: vars.required("PARK_JWT_SECRET")?,
            jwt_access_ttl_seconds: vars.parse_required("PARK_JWT_ACCESS_TTL_SECONDS")?,
            jwt_refresh_ttl_seconds: vars.parse_required("PARK_JWT_REFRESH_TTL_SECONDS")?,
            audit_retention_days: vars
                .parse_optional::<u64>("PARK_AUDIT_RETENTION_DAYS")?
                .filter(|days| *days > 0),
        })
    }
}

struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// 空串视为未设置。
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|value| !value.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::Missing(key.to_string()))
    }

    fn with_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parse_optional<T: std::str::FromStr>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.optional(key) {
            None => Ok(None),
            Some(value) => value
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|_| ConfigError::Invalid(key.to_string(), value)),
        }
    }

    fn parse_required<T: std::str::FromStr>(&self, key: &str) -> Result<T, ConfigError> {
        self.parse_optional(key)?
            .ok_or_else(|| ConfigError::Missing(key.to_string()))
    }

    fn parse_with_default<T: std::str::FromStr>(
        &self,
        key: &str,
        default: T,
    ) -> Result<T, ConfigError> {
        Ok(self.parse_optional(key)?.unwrap_or(default))
    }

    fn flag(&self, key: &str, default: bool) -> bool {
        match self.optional(key) {
            Some(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
            None => default,
        }
    }
}
