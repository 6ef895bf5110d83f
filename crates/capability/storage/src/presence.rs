//! 传感器在线状态存储接口。
//!
//! 记录传感器最近一次上报时间（last_seen）。Redis 实现通过 key TTL 过期；
//! 内存实现不过期，由调用方按 TTL 判定是否在线。

use crate::error::StorageError;
use std::collections::HashMap;

#[async_trait::async_trait]
pub trait SensorPresenceStore: Send + Sync {
    async fn touch_sensor(&self, hw_id: &str, ts_ms: i64) -> Result<(), StorageError>;

    async fn get_last_seen_at_ms(&self, hw_id: &str) -> Result<Option<i64>, StorageError>;

    async fn list_last_seen_at_ms(
        &self,
        hw_ids: &[String],
    ) -> Result<HashMap<String, i64>, StorageError>;
}
