//! 传感器在线状态内存实现（用于演示与测试）。

use crate::error::StorageError;
use crate::presence::SensorPresenceStore;
use std::collections::HashMap;
use std::sync::RwLock;

pub struct InMemorySensorPresenceStore {
    last_seen: RwLock<HashMap<String, i64>>,
}

impl InMemorySensorPresenceStore {
    pub fn new() -> Self {
        Self {
            last_seen: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySensorPresenceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SensorPresenceStore for InMemorySensorPresenceStore {
    async fn touch_sensor(&self, hw_id: &str, ts_ms: i64) -> Result<(), StorageError> {
        let mut map = self
            .last_seen
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let entry = map.entry(hw_id.to_string()).or_insert(ts_ms);
        *entry = (*entry).max(ts_ms);
        Ok(())
    }

    async fn get_last_seen_at_ms(&self, hw_id: &str) -> Result<Option<i64>, StorageError> {
        let map = self
            .last_seen
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(map.get(hw_id).copied())
    }

    async fn list_last_seen_at_ms(
        &self,
        hw_ids: &[String],
    ) -> Result<HashMap<String, i64>, StorageError> {
        let map = self
            .last_seen
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut result = HashMap::new();
        for hw_id in hw_ids {
            if let Some(ts_ms) = map.get(hw_id) {
                result.insert(hw_id.clone(), *ts_ms);
            }
        }
        Ok(result)
    }
}
