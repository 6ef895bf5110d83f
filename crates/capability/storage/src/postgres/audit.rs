//! Postgres 审计日志实现

use crate::error::StorageError;
use crate::models::{AuditLogQuery, AuditLogRecord, AuditStatistics};
use crate::traits::AuditLogStore;
use sqlx::{PgPool, Row};

pub struct PgAuditLogStore {
    pub pool: PgPool,
}

impl PgAuditLogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AuditLogStore for PgAuditLogStore {
    async fn create_audit_log(
        &self,
        record: AuditLogRecord,
    ) -> Result<AuditLogRecord, StorageError> {
        sqlx::query(
            "insert into audit_logs \
             (audit_id, actor, action, resource, result, detail, old_values, new_values, ts_ms) \
             values ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&record.audit_id)
        .bind(&record.actor)
        .bind(&record.action)
        .bind(&record.resource)
        .bind(&record.result)
        .bind(&record.detail)
        .bind(&record.old_values)
        .bind(&record.new_values)
        .bind(record.ts_ms)
        .execute(&self.pool)
        .await?;
        Ok(record)
    }

    async fn list_audit_logs(
        &self,
        query: AuditLogQuery,
    ) -> Result<Vec<AuditLogRecord>, StorageError> {
        // limit <= 0 表示不限制
        let limit = if query.limit > 0 { Some(query.limit) } else { None };
        let rows = sqlx::query(
            "select audit_id, actor, action, resource, result, detail, old_values, new_values, ts_ms \
             from audit_logs \
             where ($1::bigint is null or ts_ms >= $1) \
             and ($2::bigint is null or ts_ms <= $2) \
             and ($3::text is null or action = $3) \
             and ($4::text is null or resource = $4) \
             order by ts_ms desc \
             limit $5",
        )
        .bind(query.from_ms)
        .bind(query.to_ms)
        .bind(query.action)
        .bind(query.resource)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(AuditLogRecord {
                audit_id: row.try_get("audit_id")?,
                actor: row.try_get("actor")?,
                action: row.try_get("action")?,
                resource: row.try_get("resource")?,
                result: row.try_get("result")?,
                detail: row.try_get("detail")?,
                old_values: row.try_get("old_values")?,
                new_values: row.try_get("new_values")?,
                ts_ms: row.try_get("ts_ms")?,
            });
        }
        Ok(items)
    }

    async fn audit_statistics(
        &self,
        from_ms: Option<i64>,
        to_ms: Option<i64>,
    ) -> Result<AuditStatistics, StorageError> {
        let rows = sqlx::query(
            "select action, split_part(resource, ':', 1) as resource_kind, count(*) as total \
             from audit_logs \
             where ($1::bigint is null or ts_ms >= $1) \
             and ($2::bigint is null or ts_ms <= $2) \
             group by action, resource_kind",
        )
        .bind(from_ms)
        .bind(to_ms)
        .fetch_all(&self.pool)
        .await?;
        let mut stats = AuditStatistics::default();
        for row in rows {
            let action: String = row.try_get("action")?;
            let resource_kind: String = row.try_get("resource_kind")?;
            let total: i64 = row.try_get("total")?;
            stats.add(&action, &resource_kind, u64::try_from(total).unwrap_or_default());
        }
        Ok(stats)
    }

    async fn purge_audit_logs_before(&self, cutoff_ms: i64) -> Result<u64, StorageError> {
        let result = sqlx::query("delete from audit_logs where ts_ms < $1")
            .bind(cutoff_ms)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
