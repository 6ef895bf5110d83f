//! Postgres 传感器存储实现
//!
//! 启用中传感器的硬件 ID 唯一性由部分唯一索引 `idx_sensors_active_hw_id` 保证。

use crate::error::StorageError;
use crate::models::{SensorRecord, SensorUpdate};
use crate::traits::SensorStore;
use crate::validation::ensure_not_blank;
use domain::SensorKind;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

const SENSOR_COLUMNS: &str =
    "sensor_id, hw_id, kind, active, location_note, space_id, created_at_ms, updated_at_ms";

pub struct PgSensorStore {
    pub pool: PgPool,
}

impl PgSensorStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn sensor_from_row(row: &PgRow) -> Result<SensorRecord, StorageError> {
    let kind: String = row.try_get("kind")?;
    Ok(SensorRecord {
        sensor_id: row.try_get("sensor_id")?,
        hw_id: row.try_get("hw_id")?,
        kind: SensorKind::parse(&kind)
            .ok_or_else(|| StorageError::new(format!("invalid sensor kind in store: {kind}")))?,
        active: row.try_get("active")?,
        location_note: row.try_get("location_note")?,
        space_id: row.try_get("space_id")?,
        created_at_ms: row.try_get("created_at_ms")?,
        updated_at_ms: row.try_get("updated_at_ms")?,
    })
}

#[async_trait::async_trait]
impl SensorStore for PgSensorStore {
    async fn list_sensors(&self) -> Result<Vec<SensorRecord>, StorageError> {
        let rows = sqlx::query(&format!(
            "select {SENSOR_COLUMNS} from sensors where active order by hw_id asc"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(sensor_from_row).collect()
    }

    async fn list_sensors_for_space(
        &self,
        space_id: &str,
    ) -> Result<Vec<SensorRecord>, StorageError> {
        let rows = sqlx::query(&format!(
            "select {SENSOR_COLUMNS} from sensors \
             where active and space_id = $1 order by hw_id asc"
        ))
        .bind(space_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(sensor_from_row).collect()
    }

    async fn find_sensor(&self, sensor_id: &str) -> Result<Option<SensorRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "select {SENSOR_COLUMNS} from sensors where active and sensor_id = $1"
        ))
        .bind(sensor_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(sensor_from_row).transpose()
    }

    async fn find_active_by_hw_id(
        &self,
        hw_id: &str,
    ) -> Result<Option<SensorRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "select {SENSOR_COLUMNS} from sensors where active and hw_id = $1"
        ))
        .bind(hw_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(sensor_from_row).transpose()
    }

    async fn create_sensor(&self, record: SensorRecord) -> Result<SensorRecord, StorageError> {
        ensure_not_blank("sensor_id", &record.sensor_id)?;
        ensure_not_blank("hw_id", &record.hw_id)?;
        sqlx::query(
            "insert into sensors \
             (sensor_id, hw_id, kind, active, location_note, space_id, created_at_ms, updated_at_ms) \
             values ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(&record.sensor_id)
        .bind(&record.hw_id)
        .bind(record.kind.as_str())
        .bind(record.active)
        .bind(&record.location_note)
        .bind(&record.space_id)
        .bind(record.created_at_ms)
        .bind(record.updated_at_ms)
        .execute(&self.pool)
        .await?;
        Ok(record)
    }

    async fn update_sensor(
        &self,
        sensor_id: &str,
        update: SensorUpdate,
    ) -> Result<Option<SensorRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "update sensors set \
             kind = coalesce($2, kind), \
             location_note = coalesce($3, location_note), \
             space_id = case when $4 then $5 else space_id end, \
             updated_at_ms = $6 \
             where sensor_id = $1 and active returning {SENSOR_COLUMNS}"
        ))
        .bind(sensor_id)
        .bind(update.kind.map(|kind| kind.as_str()))
        .bind(update.location_note)
        .bind(update.space_id.is_some())
        .bind(update.space_id.flatten())
        .bind(update.updated_at_ms)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(sensor_from_row).transpose()
    }

    async fn deactivate_sensor(
        &self,
        sensor_id: &str,
        updated_at_ms: i64,
    ) -> Result<bool, StorageError> {
        let result = sqlx::query(
            "update sensors set active = false, updated_at_ms = $2 \
             where sensor_id = $1 and active",
        )
        .bind(sensor_id)
        .bind(updated_at_ms)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn unassign_space(
        &self,
        space_id: &str,
        updated_at_ms: i64,
    ) -> Result<u64, StorageError> {
        let result = sqlx::query(
            "update sensors set space_id = null, updated_at_ms = $2 where space_id = $1",
        )
        .bind(space_id)
        .bind(updated_at_ms)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
