//! Postgres 车位存储实现

use super::parse_status;
use crate::error::StorageError;
use crate::models::{ParkingSpaceRecord, SpaceUpdate};
use crate::traits::SpaceStore;
use crate::validation::{ensure_not_blank, ensure_space_code};
use domain::{OccupancyStatus, SpaceRegion};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

const SPACE_COLUMNS: &str = "space_id, space_code, status, floor, \
     region_x1, region_y1, region_x2, region_y2, created_at_ms, updated_at_ms";

pub struct PgSpaceStore {
    pub pool: PgPool,
}

impl PgSpaceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn space_from_row(row: &PgRow) -> Result<ParkingSpaceRecord, StorageError> {
    let status: String = row.try_get("status")?;
    let x1: Option<i32> = row.try_get("region_x1")?;
    let y1: Option<i32> = row.try_get("region_y1")?;
    let x2: Option<i32> = row.try_get("region_x2")?;
    let y2: Option<i32> = row.try_get("region_y2")?;
    let region = match (x1, y1, x2, y2) {
        (Some(x1), Some(y1), Some(x2), Some(y2)) => Some(SpaceRegion { x1, y1, x2, y2 }),
        _ => None,
    };
    Ok(ParkingSpaceRecord {
        space_id: row.try_get("space_id")?,
        space_code: row.try_get("space_code")?,
        status: parse_status(&status)?,
        floor: row.try_get("floor")?,
        region,
        created_at_ms: row.try_get("created_at_ms")?,
        updated_at_ms: row.try_get("updated_at_ms")?,
    })
}

fn insert_space_query(
    record: &ParkingSpaceRecord,
) -> sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments> {
    sqlx::query(
        "insert into parking_spaces \
         (space_id, space_code, status, floor, region_x1, region_y1, region_x2, region_y2, \
          created_at_ms, updated_at_ms) \
         values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(&record.space_id)
    .bind(&record.space_code)
    .bind(record.status.as_str())
    .bind(&record.floor)
    .bind(record.region.map(|r| r.x1))
    .bind(record.region.map(|r| r.y1))
    .bind(record.region.map(|r| r.x2))
    .bind(record.region.map(|r| r.y2))
    .bind(record.created_at_ms)
    .bind(record.updated_at_ms)
}

#[async_trait::async_trait]
impl SpaceStore for PgSpaceStore {
    async fn list_spaces(&self) -> Result<Vec<ParkingSpaceRecord>, StorageError> {
        let rows = sqlx::query(&format!(
            "select {SPACE_COLUMNS} from parking_spaces order by space_code asc"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(space_from_row).collect()
    }

    async fn find_space(&self, space_id: &str) -> Result<Option<ParkingSpaceRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "select {SPACE_COLUMNS} from parking_spaces where space_id = $1"
        ))
        .bind(space_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(space_from_row).transpose()
    }

    async fn find_space_by_code(
        &self,
        space_code: &str,
    ) -> Result<Option<ParkingSpaceRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "select {SPACE_COLUMNS} from parking_spaces where space_code = $1"
        ))
        .bind(space_code)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(space_from_row).transpose()
    }

    async fn list_space_codes(&self) -> Result<Vec<String>, StorageError> {
        let codes: Vec<String> = sqlx::query_scalar("select space_code from parking_spaces")
            .fetch_all(&self.pool)
            .await?;
        Ok(codes)
    }

    async fn create_space(
        &self,
        record: ParkingSpaceRecord,
    ) -> Result<ParkingSpaceRecord, StorageError> {
        ensure_not_blank("space_id", &record.space_id)?;
        ensure_space_code(&record.space_code)?;
        insert_space_query(&record).execute(&self.pool).await?;
        Ok(record)
    }

    async fn create_spaces(
        &self,
        records: Vec<ParkingSpaceRecord>,
    ) -> Result<Vec<ParkingSpaceRecord>, StorageError> {
        for record in &records {
            ensure_not_blank("space_id", &record.space_id)?;
            ensure_space_code(&record.space_code)?;
        }
        let mut tx = self.pool.begin().await?;
        for record in &records {
            insert_space_query(record).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(records)
    }

    async fn update_space(
        &self,
        space_id: &str,
        update: SpaceUpdate,
    ) -> Result<Option<ParkingSpaceRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "update parking_spaces set \
             floor = coalesce($2, floor), \
             region_x1 = coalesce($3, region_x1), \
             region_y1 = coalesce($4, region_y1), \
             region_x2 = coalesce($5, region_x2), \
             region_y2 = coalesce($6, region_y2), \
             updated_at_ms = $7 \
             where space_id = $1 returning {SPACE_COLUMNS}"
        ))
        .bind(space_id)
        .bind(update.floor)
        .bind(update.region.map(|r| r.x1))
        .bind(update.region.map(|r| r.y1))
        .bind(update.region.map(|r| r.x2))
        .bind(update.region.map(|r| r.y2))
        .bind(update.updated_at_ms)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(space_from_row).transpose()
    }

    async fn set_space_status(
        &self,
        space_id: &str,
        status: OccupancyStatus,
        updated_at_ms: i64,
    ) -> Result<Option<ParkingSpaceRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "update parking_spaces set status = $2, updated_at_ms = $3 \
             where space_id = $1 returning {SPACE_COLUMNS}"
        ))
        .bind(space_id)
        .bind(status.as_str())
        .bind(updated_at_ms)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(space_from_row).transpose()
    }

    async fn delete_space(&self, space_id: &str) -> Result<bool, StorageError> {
        let result = sqlx::query("delete from parking_spaces where space_id = $1")
            .bind(space_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
