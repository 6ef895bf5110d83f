//! 报表服务：读取区间事件、聚合并保存快照。

use crate::aggregate::{OccupancySummary, aggregate};
use domain::Clock;
use park_storage::{
    EventRange, OccupancyEventStore, ReportRecord, ReportStore, ReportUpdate, StorageError,
};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("invalid range: start {start_ms} is after end {end_ms}")]
    InvalidRange { start_ms: i64, end_ms: i64 },
    #[error("report not found: {0}")]
    NotFound(String),
    #[error("store error: {0}")]
    Store(#[from] StorageError),
}

/// 报表修正输入（字段均可选）。
#[derive(Debug, Clone, Default)]
pub struct ReportPatch {
    pub start_ms: Option<i64>,
    pub end_ms: Option<i64>,
    pub state_change_count: Option<i64>,
    pub occupied_ms: Option<i64>,
}

#[derive(Clone)]
pub struct ReportService {
    events: Arc<dyn OccupancyEventStore>,
    reports: Arc<dyn ReportStore>,
    clock: Arc<dyn Clock>,
}

impl ReportService {
    pub fn new(
        events: Arc<dyn OccupancyEventStore>,
        reports: Arc<dyn ReportStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            events,
            reports,
            clock,
        }
    }

    /// 聚合闭区间 `[start_ms, end_ms]` 内的事件，不保存。
    ///
    /// 车位不存在时事件集合为空，结果为零。
    pub async fn preview(
        &self,
        space_id: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<OccupancySummary, ReportError> {
        validate_request(space_id, start_ms, end_ms)?;
        let events = self
            .events
            .list_events(space_id, EventRange::between(start_ms, end_ms))
            .await?;
        Ok(aggregate(&events))
    }

    /// 聚合并保存报表快照。
    pub async fn create_report(
        &self,
        space_id: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<ReportRecord, ReportError> {
        let summary = self.preview(space_id, start_ms, end_ms).await?;
        let record = ReportRecord {
            report_id: uuid::Uuid::new_v4().to_string(),
            space_id: space_id.to_string(),
            start_ms,
            end_ms,
            state_change_count: summary.state_change_count,
            occupied_ms: summary.occupied_ms,
            deleted: false,
            created_at_ms: self.clock.now_ms(),
            updated_at_ms: None,
        };
        let created = self.reports.create_report(record).await?;
        park_telemetry::record_report_created();
        tracing::info!(
            target: "park.report",
            report_id = %created.report_id,
            space_id = %created.space_id,
            start_ms = created.start_ms,
            end_ms = created.end_ms,
            state_change_count = created.state_change_count,
            occupied_ms = created.occupied_ms,
            "report_created"
        );
        Ok(created)
    }

    pub async fn list_reports(&self) -> Result<Vec<ReportRecord>, ReportError> {
        Ok(self.reports.list_reports().await?)
    }

    pub async fn find_report(&self, report_id: &str) -> Result<ReportRecord, ReportError> {
        self.reports
            .find_report(report_id)
            .await?
            .ok_or_else(|| ReportError::NotFound(report_id.to_string()))
    }

    /// 管理端修正；不会重新聚合。
    pub async fn update_report(
        &self,
        report_id: &str,
        patch: ReportPatch,
    ) -> Result<ReportRecord, ReportError> {
        let current = self.find_report(report_id).await?;
        let start_ms = patch.start_ms.unwrap_or(current.start_ms);
        let end_ms = patch.end_ms.unwrap_or(current.end_ms);
        if start_ms > end_ms {
            return Err(ReportError::InvalidRange { start_ms, end_ms });
        }
        if patch.state_change_count.is_some_and(|value| value < 0)
            || patch.occupied_ms.is_some_and(|value| value < 0)
        {
            return Err(ReportError::Validation(
                "report values must not be negative".to_string(),
            ));
        }
        let update = ReportUpdate {
            start_ms: patch.start_ms,
            end_ms: patch.end_ms,
            state_change_count: patch.state_change_count,
            occupied_ms: patch.occupied_ms,
            updated_at_ms: self.clock.now_ms(),
        };
        self.reports
            .update_report(report_id, update)
            .await?
            .ok_or_else(|| ReportError::NotFound(report_id.to_string()))
    }

    pub async fn delete_report(&self, report_id: &str) -> Result<(), ReportError> {
        let deleted = self
            .reports
            .soft_delete_report(report_id, self.clock.now_ms())
            .await?;
        if !deleted {
            return Err(ReportError::NotFound(report_id.to_string()));
        }
        Ok(())
    }
}

fn validate_request(space_id: &str, start_ms: i64, end_ms: i64) -> Result<(), ReportError> {
    if space_id.trim().is_empty() {
        return Err(ReportError::Validation("spaceId required".to_string()));
    }
    if start_ms > end_ms {
        return Err(ReportError::InvalidRange { start_ms, end_ms });
    }
    Ok(())
}
