pub mod clock;
pub mod data;
pub mod permissions;
pub mod space_code;

pub use clock::{Clock, ManualClock, SystemClock};
pub use data::{EventOrigin, EventTarget, OccupancyStatus, RawStatusEvent, SensorKind, SpaceRegion};

/// 调用方上下文：HTTP 层鉴权后传递给各模块的身份信息。
#[derive(Debug, Clone)]
pub struct ActorContext {
    pub user_id: String,
    pub username: String,
    pub roles: Vec<String>,
}

impl ActorContext {
    /// 构造显式身份与角色的上下文。
    pub fn new(user_id: impl Into<String>, username: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            roles,
        }
    }

    /// 系统内部调用（MQTT 采集、定时任务）。
    pub fn system() -> Self {
        Self {
            user_id: "system".to_string(),
            username: "system".to_string(),
            roles: Vec::new(),
        }
    }
}
