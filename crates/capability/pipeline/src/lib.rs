//! 占用事件流水线
//!
//! HTTP 与 MQTT 两条接入路径共用的唯一入口：
//! 校验 -> 状态规范化 -> 车位解析 -> 状态协调（写状态 + 追加事件）。

pub mod locks;
pub mod reconciler;

pub use domain::{Clock, ManualClock, SystemClock};
pub use locks::{SpaceGuard, SpaceLocks};
pub use reconciler::{Reconciled, Reconciler};

use domain::{EventOrigin, EventTarget, RawStatusEvent};
use park_normalize::{ResolveError, Resolution, SpaceResolver, normalize_status};
use park_storage::{
    OccupancyEventStore, SensorPresenceStore, SensorStore, SpaceStore, StorageError,
};
use std::sync::Arc;
use std::time::Instant;

/// 流水线错误。
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid event: {0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("store error: {0}")]
    Store(#[from] StorageError),
}

impl PipelineError {
    /// 仅存储故障可重试；校验与未找到属于永久失败。
    pub fn is_retryable(&self) -> bool {
        matches!(self, PipelineError::Store(_))
    }
}

impl From<ResolveError> for PipelineError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Store(err) => PipelineError::Store(err),
            other => PipelineError::NotFound(other.to_string()),
        }
    }
}

/// 单条事件的处理结果。
#[derive(Debug, Clone)]
pub enum IngestOutcome {
    Applied(Reconciled),
    /// 传感器未绑定车位，事件被丢弃。
    Discarded { sensor_id: String, hw_id: String },
}

/// 流水线依赖的存储集合。
#[derive(Clone)]
pub struct PipelineStores {
    pub spaces: Arc<dyn SpaceStore>,
    pub sensors: Arc<dyn SensorStore>,
    pub events: Arc<dyn OccupancyEventStore>,
    pub presence: Arc<dyn SensorPresenceStore>,
}

pub struct OccupancyPipeline {
    resolver: SpaceResolver,
    reconciler: Reconciler,
    presence: Arc<dyn SensorPresenceStore>,
}

impl OccupancyPipeline {
    pub fn new(stores: PipelineStores, clock: Arc<dyn Clock>) -> Self {
        Self {
            resolver: SpaceResolver::new(stores.spaces.clone(), stores.sensors),
            reconciler: Reconciler::new(stores.spaces, stores.events, clock),
            presence: stores.presence,
        }
    }

    pub async fn ingest(&self, event: RawStatusEvent) -> Result<IngestOutcome, PipelineError> {
        match event.origin {
            EventOrigin::Http => park_telemetry::record_raw_event_http(),
            EventOrigin::Bus => park_telemetry::record_raw_event_bus(),
        }
        tracing::debug!(
            target: "park.pipeline",
            origin = event.origin.as_str(),
            target_kind = event.target.kind(),
            target_id = event.target.id(),
            "raw_event_received"
        );

        let result = self.process(&event).await;
        match &result {
            Ok(IngestOutcome::Applied(_)) => park_telemetry::record_occupancy_applied(),
            Ok(IngestOutcome::Discarded { .. }) => park_telemetry::record_discarded_unassigned(),
            Err(PipelineError::Validation(reason)) => {
                park_telemetry::record_rejected_validation();
                tracing::info!(
                    target: "park.pipeline",
                    origin = event.origin.as_str(),
                    reason = %reason,
                    "event_rejected"
                );
            }
            Err(PipelineError::NotFound(reason)) => {
                park_telemetry::record_rejected_not_found();
                tracing::info!(
                    target: "park.pipeline",
                    origin = event.origin.as_str(),
                    reason = %reason,
                    "event_rejected"
                );
            }
            Err(PipelineError::Store(err)) => {
                park_telemetry::record_store_failure();
                tracing::warn!(
                    target: "park.pipeline",
                    origin = event.origin.as_str(),
                    target_id = event.target.id(),
                    error = %err,
                    "store_failure"
                );
            }
        }
        result
    }

    async fn process(&self, event: &RawStatusEvent) -> Result<IngestOutcome, PipelineError> {
        validate(event)?;
        let status = normalize_status(&event.status);
        match self.resolver.resolve(&event.target).await? {
            Resolution::Unassigned { sensor_id, hw_id } => {
                self.touch_presence(&hw_id, event.received_at_ms).await;
                tracing::warn!(
                    target: "park.pipeline",
                    sensor_id = %sensor_id,
                    hw_id = %hw_id,
                    "resolution_miss"
                );
                Ok(IngestOutcome::Discarded { sensor_id, hw_id })
            }
            Resolution::Space { space, sensor } => {
                if let Some(sensor) = &sensor {
                    self.touch_presence(&sensor.hw_id, event.received_at_ms)
                        .await;
                }
                let started = Instant::now();
                let reconciled = self.reconciler.apply(&space.space_id, status).await?;
                park_telemetry::record_reconcile_latency_ms(started.elapsed().as_millis() as u64);
                tracing::info!(
                    target: "park.pipeline",
                    space_id = %reconciled.space.space_id,
                    space_code = %reconciled.space.space_code,
                    status = reconciled.event.status.as_str(),
                    event_id = %reconciled.event.event_id,
                    ts_ms = reconciled.event.ts_ms,
                    "occupancy_applied"
                );
                Ok(IngestOutcome::Applied(reconciled))
            }
        }
    }

    /// 在线状态是尽力而为的附加信息，失败不影响事件处理。
    async fn touch_presence(&self, hw_id: &str, ts_ms: i64) {
        if let Err(err) = self.presence.touch_sensor(hw_id, ts_ms).await {
            tracing::warn!(
                target: "park.pipeline",
                hw_id = %hw_id,
                error = %err,
                "presence_touch_failed"
            );
        }
    }
}

fn validate(event: &RawStatusEvent) -> Result<(), PipelineError> {
    if event.target.id().trim().is_empty() {
        let field = match event.target {
            EventTarget::Space(_) => "spaceId",
            EventTarget::Sensor(_) => "hwId",
        };
        return Err(PipelineError::Validation(format!("{field} required")));
    }
    if event.status.trim().is_empty() {
        return Err(PipelineError::Validation("status required".to_string()));
    }
    Ok(())
}
