//! Redis 传感器在线状态实现
//!
//! key 形如 `park:sensor:{hw_id}:last_seen`，值为 JSON `{ "ts_ms": ... }`，
//! 写入时设置 TTL，过期即视为离线。

use crate::error::StorageError;
use crate::presence::SensorPresenceStore;
use redis::AsyncCommands;
use std::collections::HashMap;

#[derive(serde::Serialize, serde::Deserialize)]
struct PresencePayload {
    ts_ms: i64,
}

fn presence_key(hw_id: &str) -> String {
    format!("park:sensor:{}:last_seen", hw_id)
}

/// Redis 传感器在线状态存储。
pub struct RedisSensorPresenceStore {
    client: redis::Client,
    ttl_seconds: u64,
}

impl RedisSensorPresenceStore {
    pub fn connect(redis_url: &str, ttl_seconds: u64) -> Result<Self, StorageError> {
        let client =
            redis::Client::open(redis_url).map_err(|err| StorageError::new(err.to_string()))?;
        Ok(Self {
            client,
            ttl_seconds: ttl_seconds.max(1),
        })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, StorageError> {
        self.client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|err| StorageError::new(err.to_string()))
    }
}

#[async_trait::async_trait]
impl SensorPresenceStore for RedisSensorPresenceStore {
    async fn touch_sensor(&self, hw_id: &str, ts_ms: i64) -> Result<(), StorageError> {
        let mut connection = self.connection().await?;
        let payload = PresencePayload { ts_ms };
        let data =
            serde_json::to_string(&payload).map_err(|err| StorageError::new(err.to_string()))?;
        connection
            .set_ex::<_, _, ()>(presence_key(hw_id), data, self.ttl_seconds)
            .await
            .map_err(|err| StorageError::new(err.to_string()))?;
        Ok(())
    }

    async fn get_last_seen_at_ms(&self, hw_id: &str) -> Result<Option<i64>, StorageError> {
        let mut connection = self.connection().await?;
        let data: Option<String> = connection
            .get(presence_key(hw_id))
            .await
            .map_err(|err| StorageError::new(err.to_string()))?;
        let Some(data) = data else {
            return Ok(None);
        };
        let payload: PresencePayload =
            serde_json::from_str(&data).map_err(|err| StorageError::new(err.to_string()))?;
        Ok(Some(payload.ts_ms))
    }

    async fn list_last_seen_at_ms(
        &self,
        hw_ids: &[String],
    ) -> Result<HashMap<String, i64>, StorageError> {
        if hw_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let keys: Vec<String> = hw_ids.iter().map(|id| presence_key(id)).collect();
        let mut connection = self.connection().await?;
        let values: Vec<Option<String>> = connection
            .mget(keys)
            .await
            .map_err(|err| StorageError::new(err.to_string()))?;
        let mut result = HashMap::new();
        for (id, value) in hw_ids.iter().zip(values.into_iter()) {
            let Some(value) = value else { continue };
            let payload: PresencePayload = match serde_json::from_str(&value) {
                Ok(payload) => payload,
                Err(_) => continue,
            };
            result.insert(id.clone(), payload.ts_ms);
        }
        Ok(result)
    }
}
