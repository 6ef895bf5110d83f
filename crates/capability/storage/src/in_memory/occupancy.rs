//! 占用事件内存存储实现
//!
//! 事件按插入顺序保存，`seq` 单调递增；读取时按 `(ts_ms, seq)` 排序，
//! 与 Postgres 实现的 `order by ts_ms, seq` 保持一致。

use crate::error::StorageError;
use crate::models::{EventRange, NewOccupancyEvent, OccupancyEventRecord, TimeOrder};
use crate::traits::OccupancyEventStore;
use crate::validation::ensure_not_blank;
use domain::OccupancyStatus;
use std::sync::RwLock;

#[derive(Default)]
struct EventLog {
    events: Vec<OccupancyEventRecord>,
    next_seq: i64,
}

/// 占用事件内存存储
pub struct InMemoryOccupancyEventStore {
    log: RwLock<EventLog>,
}

impl InMemoryOccupancyEventStore {
    pub fn new() -> Self {
        Self {
            log: RwLock::new(EventLog::default()),
        }
    }
}

impl Default for InMemoryOccupancyEventStore {
    fn default() -> Self {
        Self::new()
    }
}

fn sort_events(items: &mut [OccupancyEventRecord], order: TimeOrder) {
    items.sort_by_key(|item| (item.ts_ms, item.seq));
    if order == TimeOrder::Desc {
        items.reverse();
    }
}

#[async_trait::async_trait]
impl OccupancyEventStore for InMemoryOccupancyEventStore {
    async fn append_event(
        &self,
        event: NewOccupancyEvent,
    ) -> Result<OccupancyEventRecord, StorageError> {
        ensure_not_blank("event_id", &event.event_id)?;
        ensure_not_blank("space_id", &event.space_id)?;
        let mut log = self
            .log
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if log.events.iter().any(|item| item.event_id == event.event_id) {
            return Err(StorageError::conflict(format!(
                "event already exists: {}",
                event.event_id
            )));
        }
        log.next_seq += 1;
        let record = OccupancyEventRecord {
            event_id: event.event_id,
            space_id: event.space_id,
            status: event.status,
            ts_ms: event.ts_ms,
            seq: log.next_seq,
        };
        log.events.push(record.clone());
        Ok(record)
    }

    async fn list_events(
        &self,
        space_id: &str,
        range: EventRange,
    ) -> Result<Vec<OccupancyEventRecord>, StorageError> {
        let log = self
            .log
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut items: Vec<OccupancyEventRecord> = log
            .events
            .iter()
            .filter(|item| item.space_id == space_id && range.contains(item.ts_ms))
            .cloned()
            .collect();
        drop(log);
        sort_events(&mut items, range.order);
        Ok(items)
    }

    async fn latest_event(
        &self,
        space_id: &str,
    ) -> Result<Option<OccupancyEventRecord>, StorageError> {
        let log = self
            .log
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(log
            .events
            .iter()
            .filter(|item| item.space_id == space_id)
            .max_by_key(|item| (item.ts_ms, item.seq))
            .cloned())
    }

    async fn find_event(
        &self,
        event_id: &str,
    ) -> Result<Option<OccupancyEventRecord>, StorageError> {
        let log = self
            .log
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(log
            .events
            .iter()
            .find(|item| item.event_id == event_id)
            .cloned())
    }

    async fn list_recent_events(
        &self,
        limit: usize,
    ) -> Result<Vec<OccupancyEventRecord>, StorageError> {
        let mut items: Vec<OccupancyEventRecord> = self
            .log
            .read()
            .map_err(|_| StorageError::new("lock failed"))?
            .events
            .clone();
        sort_events(&mut items, TimeOrder::Desc);
        items.truncate(limit);
        Ok(items)
    }

    async fn update_event_status(
        &self,
        event_id: &str,
        status: OccupancyStatus,
    ) -> Result<Option<OccupancyEventRecord>, StorageError> {
        let mut log = self
            .log
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let Some(item) = log.events.iter_mut().find(|item| item.event_id == event_id) else {
            return Ok(None);
        };
        item.status = status;
        Ok(Some(item.clone()))
    }

    async fn delete_event(&self, event_id: &str) -> Result<bool, StorageError> {
        let mut log = self
            .log
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let before = log.events.len();
        log.events.retain(|item| item.event_id != event_id);
        Ok(log.events.len() != before)
    }
}
