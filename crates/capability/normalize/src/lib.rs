use domain::{EventTarget, OccupancyStatus};
use park_storage::{ParkingSpaceRecord, SensorRecord, SensorStore, SpaceStore, StorageError};
use std::sync::Arc;

/// 原始状态标签 -> OccupancyStatus。
///
/// 去除首尾空白后大小写不敏感匹配 `free` / `occupied`，其余一律为 Unknown。
/// 空标签由调用方在此之前以校验错误拒绝。
pub fn normalize_status(raw: &str) -> OccupancyStatus {
    let value = raw.trim();
    if value.eq_ignore_ascii_case("free") {
        OccupancyStatus::Free
    } else if value.eq_ignore_ascii_case("occupied") {
        OccupancyStatus::Occupied
    } else {
        OccupancyStatus::Unknown
    }
}

/// 解析结果。
#[derive(Debug, Clone)]
pub enum Resolution {
    /// 命中车位；经传感器解析时附带传感器记录。
    Space {
        space: ParkingSpaceRecord,
        sensor: Option<SensorRecord>,
    },
    /// 传感器存在但未绑定车位：调用方丢弃事件并告警。
    Unassigned { sensor_id: String, hw_id: String },
}

/// 解析错误。
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("space not found: {0}")]
    SpaceNotFound(String),
    #[error("no active sensor for hw_id: {0}")]
    SensorNotFound(String),
    #[error("store error: {0}")]
    Store(#[from] StorageError),
}

/// EventTarget -> 车位。
#[derive(Clone)]
pub struct SpaceResolver {
    spaces: Arc<dyn SpaceStore>,
    sensors: Arc<dyn SensorStore>,
}

impl SpaceResolver {
    pub fn new(spaces: Arc<dyn SpaceStore>, sensors: Arc<dyn SensorStore>) -> Self {
        Self { spaces, sensors }
    }

    pub async fn resolve(&self, target: &EventTarget) -> Result<Resolution, ResolveError> {
        match target {
            EventTarget::Space(space_id) => {
                let space = self
                    .spaces
                    .find_space(space_id)
                    .await?
                    .ok_or_else(|| ResolveError::SpaceNotFound(space_id.clone()))?;
                Ok(Resolution::Space {
                    space,
                    sensor: None,
                })
            }
            EventTarget::Sensor(hw_id) => {
                let sensor = self
                    .sensors
                    .find_active_by_hw_id(hw_id)
                    .await?
                    .ok_or_else(|| ResolveError::SensorNotFound(hw_id.clone()))?;
                let Some(space_id) = sensor.space_id.clone() else {
                    return Ok(Resolution::Unassigned {
                        sensor_id: sensor.sensor_id,
                        hw_id: sensor.hw_id,
                    });
                };
                // 绑定的车位已被删除时按车位不存在处理
                let space = self
                    .spaces
                    .find_space(&space_id)
                    .await?
                    .ok_or_else(|| ResolveError::SpaceNotFound(space_id.clone()))?;
                Ok(Resolution::Space {
                    space,
                    sensor: Some(sensor),
                })
            }
        }
    }
}
