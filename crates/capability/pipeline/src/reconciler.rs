//! 状态协调器：唯一写入车位当前状态的代码路径。

use crate::PipelineError;
use crate::locks::SpaceLocks;
use domain::{Clock, OccupancyStatus};
use park_storage::{
    NewOccupancyEvent, OccupancyEventRecord, OccupancyEventStore, ParkingSpaceRecord, SpaceStore,
};
use std::sync::Arc;

/// 协调结果：更新后的车位与新追加的事件（两者时间戳一致）。
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub space: ParkingSpaceRecord,
    pub event: OccupancyEventRecord,
}

pub struct Reconciler {
    spaces: Arc<dyn SpaceStore>,
    events: Arc<dyn OccupancyEventStore>,
    clock: Arc<dyn Clock>,
    locks: SpaceLocks,
}

impl Reconciler {
    pub fn new(
        spaces: Arc<dyn SpaceStore>,
        events: Arc<dyn OccupancyEventStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            spaces,
            events,
            clock,
            locks: SpaceLocks::new(),
        }
    }

    /// 覆盖车位状态并追加一条事件。
    ///
    /// 同一车位的调用串行执行，时间戳在锁内读取；不做重复状态抑制。
    /// 状态写入成功而事件追加失败时返回存储错误，重投后会再次覆盖同一状态。
    pub async fn apply(
        &self,
        space_id: &str,
        status: OccupancyStatus,
    ) -> Result<Reconciled, PipelineError> {
        let _guard = self.locks.lock(space_id).await;
        let ts_ms = self.clock.now_ms();
        let space = self
            .spaces
            .set_space_status(space_id, status, ts_ms)
            .await?
            .ok_or_else(|| PipelineError::NotFound(format!("space not found: {space_id}")))?;
        let event = self
            .events
            .append_event(NewOccupancyEvent {
                event_id: uuid::Uuid::new_v4().to_string(),
                space_id: space_id.to_string(),
                status,
                ts_ms,
            })
            .await?;
        Ok(Reconciled { space, event })
    }
}
