//! 车位内存存储实现
//!
//! 编号唯一性在写锁内检查，保证并发创建不会产生重复编号。

use crate::error::StorageError;
use crate::models::{ParkingSpaceRecord, SpaceUpdate};
use crate::traits::SpaceStore;
use crate::validation::{ensure_not_blank, ensure_space_code};
use domain::OccupancyStatus;
use std::collections::HashMap;
use std::sync::RwLock;

/// 车位内存存储
pub struct InMemorySpaceStore {
    spaces: RwLock<HashMap<String, ParkingSpaceRecord>>,
}

impl InMemorySpaceStore {
    pub fn new() -> Self {
        Self {
            spaces: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySpaceStore {
    fn default() -> Self {
        Self::new()
    }
}

fn check_new_space(
    map: &HashMap<String, ParkingSpaceRecord>,
    record: &ParkingSpaceRecord,
) -> Result<(), StorageError> {
    ensure_not_blank("space_id", &record.space_id)?;
    ensure_space_code(&record.space_code)?;
    if map.contains_key(&record.space_id) {
        return Err(StorageError::conflict(format!(
            "space already exists: {}",
            record.space_id
        )));
    }
    if map
        .values()
        .any(|item| item.space_code == record.space_code)
    {
        return Err(StorageError::conflict(format!(
            "space code already exists: {}",
            record.space_code
        )));
    }
    Ok(())
}

#[async_trait::async_trait]
impl SpaceStore for InMemorySpaceStore {
    async fn list_spaces(&self) -> Result<Vec<ParkingSpaceRecord>, StorageError> {
        let mut items: Vec<ParkingSpaceRecord> = self
            .spaces
            .read()
            .map(|map| map.values().cloned().collect())
            .map_err(|_| StorageError::new("lock failed"))?;
        items.sort_by(|a, b| a.space_code.cmp(&b.space_code));
        Ok(items)
    }

    async fn find_space(&self, space_id: &str) -> Result<Option<ParkingSpaceRecord>, StorageError> {
        Ok(self
            .spaces
            .read()
            .map(|map| map.get(space_id).cloned())
            .map_err(|_| StorageError::new("lock failed"))?)
    }

    async fn find_space_by_code(
        &self,
        space_code: &str,
    ) -> Result<Option<ParkingSpaceRecord>, StorageError> {
        Ok(self
            .spaces
            .read()
            .map(|map| {
                map.values()
                    .find(|item| item.space_code == space_code)
                    .cloned()
            })
            .map_err(|_| StorageError::new("lock failed"))?)
    }

    async fn list_space_codes(&self) -> Result<Vec<String>, StorageError> {
        Ok(self
            .spaces
            .read()
            .map(|map| map.values().map(|item| item.space_code.clone()).collect())
            .map_err(|_| StorageError::new("lock failed"))?)
    }

    async fn create_space(
        &self,
        record: ParkingSpaceRecord,
    ) -> Result<ParkingSpaceRecord, StorageError> {
        let mut map = self
            .spaces
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        check_new_space(&map, &record)?;
        map.insert(record.space_id.clone(), record.clone());
        Ok(record)
    }

    async fn create_spaces(
        &self,
        records: Vec<ParkingSpaceRecord>,
    ) -> Result<Vec<ParkingSpaceRecord>, StorageError> {
        let mut map = self
            .spaces
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut staged = map.clone();
        for record in &records {
            check_new_space(&staged, record)?;
            staged.insert(record.space_id.clone(), record.clone());
        }
        *map = staged;
        Ok(records)
    }

    async fn update_space(
        &self,
        space_id: &str,
        update: SpaceUpdate,
    ) -> Result<Option<ParkingSpaceRecord>, StorageError> {
        let mut map = self
            .spaces
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let Some(item) = map.get_mut(space_id) else {
            return Ok(None);
        };
        if let Some(floor) = update.floor {
            item.floor = Some(floor);
        }
        if let Some(region) = update.region {
            item.region = Some(region);
        }
        item.updated_at_ms = update.updated_at_ms;
        Ok(Some(item.clone()))
    }

    async fn set_space_status(
        &self,
        space_id: &str,
        status: OccupancyStatus,
        updated_at_ms: i64,
    ) -> Result<Option<ParkingSpaceRecord>, StorageError> {
        let mut map = self
            .spaces
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let Some(item) = map.get_mut(space_id) else {
            return Ok(None);
        };
        item.status = status;
        item.updated_at_ms = updated_at_ms;
        Ok(Some(item.clone()))
    }

    async fn delete_space(&self, space_id: &str) -> Result<bool, StorageError> {
        let mut map = self
            .spaces
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(map.remove(space_id).is_some())
    }
}
