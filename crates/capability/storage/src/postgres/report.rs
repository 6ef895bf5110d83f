//! Postgres 报表存储实现

use crate::error::StorageError;
use crate::models::{ReportRecord, ReportUpdate};
use crate::traits::ReportStore;
use crate::validation::{ensure_not_blank, ensure_time_range};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

const REPORT_COLUMNS: &str = "report_id, space_id, start_ms, end_ms, state_change_count, \
     occupied_ms, deleted, created_at_ms, updated_at_ms";

pub struct PgReportStore {
    pub pool: PgPool,
}

impl PgReportStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn report_from_row(row: &PgRow) -> Result<ReportRecord, StorageError> {
    Ok(ReportRecord {
        report_id: row.try_get("report_id")?,
        space_id: row.try_get("space_id")?,
        start_ms: row.try_get("start_ms")?,
        end_ms: row.try_get("end_ms")?,
        state_change_count: row.try_get("state_change_count")?,
        occupied_ms: row.try_get("occupied_ms")?,
        deleted: row.try_get("deleted")?,
        created_at_ms: row.try_get("created_at_ms")?,
        updated_at_ms: row.try_get("updated_at_ms")?,
    })
}

#[async_trait::async_trait]
impl ReportStore for PgReportStore {
    async fn create_report(&self, record: ReportRecord) -> Result<ReportRecord, StorageError> {
        ensure_not_blank("report_id", &record.report_id)?;
        ensure_time_range(record.start_ms, record.end_ms)?;
        sqlx::query(
            "insert into reports \
             (report_id, space_id, start_ms, end_ms, state_change_count, occupied_ms, deleted, \
              created_at_ms, updated_at_ms) \
             values ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&record.report_id)
        .bind(&record.space_id)
        .bind(record.start_ms)
        .bind(record.end_ms)
        .bind(record.state_change_count)
        .bind(record.occupied_ms)
        .bind(record.deleted)
        .bind(record.created_at_ms)
        .bind(record.updated_at_ms)
        .execute(&self.pool)
        .await?;
        Ok(record)
    }

    async fn find_report(&self, report_id: &str) -> Result<Option<ReportRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "select {REPORT_COLUMNS} from reports where report_id = $1 and not deleted"
        ))
        .bind(report_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(report_from_row).transpose()
    }

    async fn list_reports(&self) -> Result<Vec<ReportRecord>, StorageError> {
        let rows = sqlx::query(&format!(
            "select {REPORT_COLUMNS} from reports where not deleted \
             order by created_at_ms desc, report_id desc"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(report_from_row).collect()
    }

    async fn update_report(
        &self,
        report_id: &str,
        update: ReportUpdate,
    ) -> Result<Option<ReportRecord>, StorageError> {
        let Some(current) = self.find_report(report_id).await? else {
            return Ok(None);
        };
        let start_ms = update.start_ms.unwrap_or(current.start_ms);
        let end_ms = update.end_ms.unwrap_or(current.end_ms);
        ensure_time_range(start_ms, end_ms)?;
        let row = sqlx::query(&format!(
            "update reports set \
             start_ms = $2, end_ms = $3, \
             state_change_count = coalesce($4, state_change_count), \
             occupied_ms = coalesce($5, occupied_ms), \
             updated_at_ms = $6 \
             where report_id = $1 and not deleted returning {REPORT_COLUMNS}"
        ))
        .bind(report_id)
        .bind(start_ms)
        .bind(end_ms)
        .bind(update.state_change_count)
        .bind(update.occupied_ms)
        .bind(update.updated_at_ms)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(report_from_row).transpose()
    }

    async fn soft_delete_report(
        &self,
        report_id: &str,
        updated_at_ms: i64,
    ) -> Result<bool, StorageError> {
        let result = sqlx::query(
            "update reports set deleted = true, updated_at_ms = $2 \
             where report_id = $1 and not deleted",
        )
        .bind(report_id)
        .bind(updated_at_ms)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
