//! 传感器内存存储实现
//!
//! 功能：
//! - 传感器 CRUD，停用为逻辑删除
//! - 同一硬件 ID 仅允许一个启用中的传感器

use crate::error::StorageError;
use crate::models::{SensorRecord, SensorUpdate};
use crate::traits::SensorStore;
use crate::validation::ensure_not_blank;
use std::collections::HashMap;
use std::sync::RwLock;

/// 传感器内存存储
pub struct InMemorySensorStore {
    sensors: RwLock<HashMap<String, SensorRecord>>,
}

impl InMemorySensorStore {
    pub fn new() -> Self {
        Self {
            sensors: RwLock::new(HashMap::new()),
        }
    }

    fn active_where(
        &self,
        predicate: impl Fn(&SensorRecord) -> bool,
    ) -> Result<Vec<SensorRecord>, StorageError> {
        let mut items: Vec<SensorRecord> = self
            .sensors
            .read()
            .map(|map| {
                map.values()
                    .filter(|item| item.active && predicate(item))
                    .cloned()
                    .collect()
            })
            .map_err(|_| StorageError::new("lock failed"))?;
        items.sort_by(|a, b| a.hw_id.cmp(&b.hw_id));
        Ok(items)
    }
}

impl Default for InMemorySensorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SensorStore for InMemorySensorStore {
    async fn list_sensors(&self) -> Result<Vec<SensorRecord>, StorageError> {
        self.active_where(|_| true)
    }

    async fn list_sensors_for_space(
        &self,
        space_id: &str,
    ) -> Result<Vec<SensorRecord>, StorageError> {
        self.active_where(|item| item.space_id.as_deref() == Some(space_id))
    }

    async fn find_sensor(&self, sensor_id: &str) -> Result<Option<SensorRecord>, StorageError> {
        Ok(self
            .sensors
            .read()
            .map(|map| map.get(sensor_id).cloned())
            .map_err(|_| StorageError::new("lock failed"))?
            .filter(|item| item.active))
    }

    async fn find_active_by_hw_id(
        &self,
        hw_id: &str,
    ) -> Result<Option<SensorRecord>, StorageError> {
        Ok(self.active_where(|item| item.hw_id == hw_id)?.into_iter().next())
    }

    async fn create_sensor(&self, record: SensorRecord) -> Result<SensorRecord, StorageError> {
        ensure_not_blank("sensor_id", &record.sensor_id)?;
        ensure_not_blank("hw_id", &record.hw_id)?;
        let mut map = self
            .sensors
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if map.contains_key(&record.sensor_id) {
            return Err(StorageError::conflict(format!(
                "sensor already exists: {}",
                record.sensor_id
            )));
        }
        if record.active
            && map
                .values()
                .any(|item| item.active && item.hw_id == record.hw_id)
        {
            return Err(StorageError::conflict(format!(
                "active sensor already registered for hw_id: {}",
                record.hw_id
            )));
        }
        map.insert(record.sensor_id.clone(), record.clone());
        Ok(record)
    }

    async fn update_sensor(
        &self,
        sensor_id: &str,
        update: SensorUpdate,
    ) -> Result<Option<SensorRecord>, StorageError> {
        let mut map = self
            .sensors
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let Some(item) = map.get_mut(sensor_id).filter(|item| item.active) else {
            return Ok(None);
        };
        if let Some(kind) = update.kind {
            item.kind = kind;
        }
        if let Some(location_note) = update.location_note {
            item.location_note = Some(location_note);
        }
        if let Some(space_id) = update.space_id {
            item.space_id = space_id;
        }
        item.updated_at_ms = update.updated_at_ms;
        Ok(Some(item.clone()))
    }

    async fn deactivate_sensor(
        &self,
        sensor_id: &str,
        updated_at_ms: i64,
    ) -> Result<bool, StorageError> {
        let mut map = self
            .sensors
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        match map.get_mut(sensor_id).filter(|item| item.active) {
            Some(item) => {
                item.active = false;
                item.updated_at_ms = updated_at_ms;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn unassign_space(
        &self,
        space_id: &str,
        updated_at_ms: i64,
    ) -> Result<u64, StorageError> {
        let mut map = self
            .sensors
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut affected = 0;
        for item in map.values_mut() {
            if item.space_id.as_deref() == Some(space_id) {
                item.space_id = None;
                item.updated_at_ms = updated_at_ms;
                affected += 1;
            }
        }
        Ok(affected)
    }
}
