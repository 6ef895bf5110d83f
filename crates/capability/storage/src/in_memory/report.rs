//! 报表内存存储实现

use crate::error::StorageError;
use crate::models::{ReportRecord, ReportUpdate};
use crate::traits::ReportStore;
use crate::validation::{ensure_not_blank, ensure_time_range};
use std::collections::HashMap;
use std::sync::RwLock;

/// 报表内存存储
pub struct InMemoryReportStore {
    reports: RwLock<HashMap<String, ReportRecord>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self {
            reports: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryReportStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ReportStore for InMemoryReportStore {
    async fn create_report(&self, record: ReportRecord) -> Result<ReportRecord, StorageError> {
        ensure_not_blank("report_id", &record.report_id)?;
        ensure_time_range(record.start_ms, record.end_ms)?;
        let mut map = self
            .reports
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if map.contains_key(&record.report_id) {
            return Err(StorageError::conflict(format!(
                "report already exists: {}",
                record.report_id
            )));
        }
        map.insert(record.report_id.clone(), record.clone());
        Ok(record)
    }

    async fn find_report(&self, report_id: &str) -> Result<Option<ReportRecord>, StorageError> {
        Ok(self
            .reports
            .read()
            .map(|map| map.get(report_id).cloned())
            .map_err(|_| StorageError::new("lock failed"))?
            .filter(|item| !item.deleted))
    }

    async fn list_reports(&self) -> Result<Vec<ReportRecord>, StorageError> {
        let mut items: Vec<ReportRecord> = self
            .reports
            .read()
            .map(|map| map.values().filter(|item| !item.deleted).cloned().collect())
            .map_err(|_| StorageError::new("lock failed"))?;
        items.sort_by(|a, b| {
            b.created_at_ms
                .cmp(&a.created_at_ms)
                .then_with(|| b.report_id.cmp(&a.report_id))
        });
        Ok(items)
    }

    async fn update_report(
        &self,
        report_id: &str,
        update: ReportUpdate,
    ) -> Result<Option<ReportRecord>, StorageError> {
        let mut map = self
            .reports
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let Some(item) = map.get_mut(report_id).filter(|item| !item.deleted) else {
            return Ok(None);
        };
        let start_ms = update.start_ms.unwrap_or(item.start_ms);
        let end_ms = update.end_ms.unwrap_or(item.end_ms);
        ensure_time_range(start_ms, end_ms)?;
        item.start_ms = start_ms;
        item.end_ms = end_ms;
        if let Some(count) = update.state_change_count {
            item.state_change_count = count;
        }
        if let Some(occupied_ms) = update.occupied_ms {
            item.occupied_ms = occupied_ms;
        }
        item.updated_at_ms = Some(update.updated_at_ms);
        Ok(Some(item.clone()))
    }

    async fn soft_delete_report(
        &self,
        report_id: &str,
        updated_at_ms: i64,
    ) -> Result<bool, StorageError> {
        let mut map = self
            .reports
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        match map.get_mut(report_id).filter(|item| !item.deleted) {
            Some(item) => {
                item.deleted = true;
                item.updated_at_ms = Some(updated_at_ms);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
