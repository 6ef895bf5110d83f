//! Postgres 占用事件存储实现
//!
//! `seq` 由 bigserial 分配，同一毫秒内的多条事件按插入顺序排列。

use super::parse_status;
use crate::error::StorageError;
use crate::models::{EventRange, NewOccupancyEvent, OccupancyEventRecord, TimeOrder};
use crate::traits::OccupancyEventStore;
use crate::validation::ensure_not_blank;
use domain::OccupancyStatus;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

const EVENT_COLUMNS: &str = "event_id, space_id, status, ts_ms, seq";

pub struct PgOccupancyEventStore {
    pub pool: PgPool,
}

impl PgOccupancyEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn event_from_row(row: &PgRow) -> Result<OccupancyEventRecord, StorageError> {
    let status: String = row.try_get("status")?;
    Ok(OccupancyEventRecord {
        event_id: row.try_get("event_id")?,
        space_id: row.try_get("space_id")?,
        status: parse_status(&status)?,
        ts_ms: row.try_get("ts_ms")?,
        seq: row.try_get("seq")?,
    })
}

#[async_trait::async_trait]
impl OccupancyEventStore for PgOccupancyEventStore {
    async fn append_event(
        &self,
        event: NewOccupancyEvent,
    ) -> Result<OccupancyEventRecord, StorageError> {
        ensure_not_blank("event_id", &event.event_id)?;
        ensure_not_blank("space_id", &event.space_id)?;
        let row = sqlx::query(&format!(
            "insert into occupancy_events (event_id, space_id, status, ts_ms) \
             values ($1, $2, $3, $4) returning {EVENT_COLUMNS}"
        ))
        .bind(&event.event_id)
        .bind(&event.space_id)
        .bind(event.status.as_str())
        .bind(event.ts_ms)
        .fetch_one(&self.pool)
        .await?;
        event_from_row(&row)
    }

    async fn list_events(
        &self,
        space_id: &str,
        range: EventRange,
    ) -> Result<Vec<OccupancyEventRecord>, StorageError> {
        let order = match range.order {
            TimeOrder::Asc => "ts_ms asc, seq asc",
            TimeOrder::Desc => "ts_ms desc, seq desc",
        };
        let rows = sqlx::query(&format!(
            "select {EVENT_COLUMNS} from occupancy_events \
             where space_id = $1 \
             and ($2::bigint is null or ts_ms >= $2) \
             and ($3::bigint is null or ts_ms <= $3) \
             order by {order}"
        ))
        .bind(space_id)
        .bind(range.from_ms)
        .bind(range.to_ms)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(event_from_row).collect()
    }

    async fn latest_event(
        &self,
        space_id: &str,
    ) -> Result<Option<OccupancyEventRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "select {EVENT_COLUMNS} from occupancy_events where space_id = $1 \
             order by ts_ms desc, seq desc limit 1"
        ))
        .bind(space_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(event_from_row).transpose()
    }

    async fn find_event(
        &self,
        event_id: &str,
    ) -> Result<Option<OccupancyEventRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "select {EVENT_COLUMNS} from occupancy_events where event_id = $1"
        ))
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(event_from_row).transpose()
    }

    async fn list_recent_events(
        &self,
        limit: usize,
    ) -> Result<Vec<OccupancyEventRecord>, StorageError> {
        let rows = sqlx::query(&format!(
            "select {EVENT_COLUMNS} from occupancy_events \
             order by ts_ms desc, seq desc limit $1"
        ))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(event_from_row).collect()
    }

    async fn update_event_status(
        &self,
        event_id: &str,
        status: OccupancyStatus,
    ) -> Result<Option<OccupancyEventRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "update occupancy_events set status = $2 where event_id = $1 returning {EVENT_COLUMNS}"
        ))
        .bind(event_id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(event_from_row).transpose()
    }

    async fn delete_event(&self, event_id: &str) -> Result<bool, StorageError> {
        let result = sqlx::query("delete from occupancy_events where event_id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
