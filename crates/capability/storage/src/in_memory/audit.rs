//! 审计日志内存实现
//!
//! 仅用于本地演示和测试。

use crate::error::StorageError;
use crate::models::{AuditLogQuery, AuditLogRecord, AuditStatistics};
use crate::traits::AuditLogStore;
use std::sync::RwLock;

/// 审计日志内存存储
pub struct InMemoryAuditLogStore {
    logs: RwLock<Vec<AuditLogRecord>>,
}

impl InMemoryAuditLogStore {
    /// 创建新的审计日志存储
    pub fn new() -> Self {
        Self {
            logs: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryAuditLogStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AuditLogStore for InMemoryAuditLogStore {
    async fn create_audit_log(
        &self,
        record: AuditLogRecord,
    ) -> Result<AuditLogRecord, StorageError> {
        let mut logs = self
            .logs
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        logs.push(record.clone());
        Ok(record)
    }

    async fn list_audit_logs(
        &self,
        query: AuditLogQuery,
    ) -> Result<Vec<AuditLogRecord>, StorageError> {
        let limit = query.limit.max(0) as usize;
        let logs = self
            .logs
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut items: Vec<AuditLogRecord> = logs
            .iter()
            .filter(|item| query.matches(item))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.ts_ms.cmp(&a.ts_ms));
        if limit > 0 && items.len() > limit {
            items.truncate(limit);
        }
        Ok(items)
    }

    async fn audit_statistics(
        &self,
        from_ms: Option<i64>,
        to_ms: Option<i64>,
    ) -> Result<AuditStatistics, StorageError> {
        let query = AuditLogQuery {
            from_ms,
            to_ms,
            ..AuditLogQuery::default()
        };
        let logs = self
            .logs
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut stats = AuditStatistics::default();
        for item in logs.iter().filter(|item| query.matches(item)) {
            stats.add(&item.action, item.resource_kind(), 1);
        }
        Ok(stats)
    }

    async fn purge_audit_logs_before(&self, cutoff_ms: i64) -> Result<u64, StorageError> {
        let mut logs = self
            .logs
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let before = logs.len();
        logs.retain(|item| item.ts_ms >= cutoff_ms);
        Ok((before - logs.len()) as u64)
    }
}
