//! 数据模型
//!
//! 定义所有存储相关的数据模型和更新结构：
//! - 用户模型：UserRecord
//! - 车位模型：ParkingSpaceRecord, SpaceUpdate
//! - 传感器模型：SensorRecord, SensorUpdate
//! - 占用事件：NewOccupancyEvent, OccupancyEventRecord, EventRange
//! - 报表：ReportRecord, ReportUpdate
//! - 审计日志：AuditLogRecord, AuditLogQuery, AuditStatistics
//!
//! 时间字段统一为毫秒时间戳（`_ms` 后缀）。

use domain::{ActorContext, OccupancyStatus, SensorKind, SpaceRegion};
use std::collections::BTreeMap;

/// 用户记录。
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user_id: String,
    pub username: String,
    /// argon2 哈希；历史数据可能是明文，登录成功后自动升级。
    pub password: String,
    pub roles: Vec<String>,
}

impl UserRecord {
    /// 将用户记录转换为 ActorContext。
    pub fn to_actor_context(&self) -> ActorContext {
        ActorContext::new(
            self.user_id.clone(),
            self.username.clone(),
            self.roles.clone(),
        )
    }
}

/// 车位记录。
#[derive(Debug, Clone)]
pub struct ParkingSpaceRecord {
    pub space_id: String,
    pub space_code: String,
    pub status: OccupancyStatus,
    pub floor: Option<String>,
    pub region: Option<SpaceRegion>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

/// 车位更新输入（管理端编辑，不含状态）。
#[derive(Debug, Clone)]
pub struct SpaceUpdate {
    pub floor: Option<String>,
    pub region: Option<SpaceRegion>,
    pub updated_at_ms: i64,
}

/// 传感器记录。
#[derive(Debug, Clone)]
pub struct SensorRecord {
    pub sensor_id: String,
    pub hw_id: String,
    pub kind: SensorKind,
    pub active: bool,
    pub location_note: Option<String>,
    /// 未分配车位时为 None。
    pub space_id: Option<String>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

/// 传感器更新输入。
#[derive(Debug, Clone)]
pub struct SensorUpdate {
    pub kind: Option<SensorKind>,
    pub location_note: Option<String>,
    /// `None` 保持不变，`Some(None)` 解除车位绑定。
    pub space_id: Option<Option<String>>,
    pub updated_at_ms: i64,
}

/// 待追加的占用事件（`seq` 由存储分配）。
#[derive(Debug, Clone)]
pub struct NewOccupancyEvent {
    pub event_id: String,
    pub space_id: String,
    pub status: OccupancyStatus,
    pub ts_ms: i64,
}

/// 占用事件记录。
///
/// 同一车位的事件按 `(ts_ms, seq)` 全序排列，`seq` 为插入序号。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyEventRecord {
    pub event_id: String,
    pub space_id: String,
    pub status: OccupancyStatus,
    pub ts_ms: i64,
    pub seq: i64,
}

/// 时间排序方向。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeOrder {
    #[default]
    Asc,
    Desc,
}

/// 事件区间查询（闭区间，边界可选）。
#[derive(Debug, Clone, Copy, Default)]
pub struct EventRange {
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
    pub order: TimeOrder,
}

impl EventRange {
    pub fn between(from_ms: i64, to_ms: i64) -> Self {
        Self {
            from_ms: Some(from_ms),
            to_ms: Some(to_ms),
            order: TimeOrder::Asc,
        }
    }

    pub fn descending(mut self) -> Self {
        self.order = TimeOrder::Desc;
        self
    }

    pub fn contains(&self, ts_ms: i64) -> bool {
        self.from_ms.is_none_or(|from| ts_ms >= from) && self.to_ms.is_none_or(|to| ts_ms <= to)
    }
}

/// 报表记录（快照，事件变更后不会自动重算）。
#[derive(Debug, Clone)]
pub struct ReportRecord {
    pub report_id: String,
    pub space_id: String,
    pub start_ms: i64,
    pub end_ms: i64,
    pub state_change_count: i64,
    pub occupied_ms: i64,
    pub deleted: bool,
    pub created_at_ms: i64,
    pub updated_at_ms: Option<i64>,
}

/// 报表更新输入（管理端修正）。
#[derive(Debug, Clone)]
pub struct ReportUpdate {
    pub start_ms: Option<i64>,
    pub end_ms: Option<i64>,
    pub state_change_count: Option<i64>,
    pub occupied_ms: Option<i64>,
    pub updated_at_ms: i64,
}

/// 审计日志记录。
#[derive(Debug, Clone)]
pub struct AuditLogRecord {
    pub audit_id: String,
    pub actor: String,
    pub action: String,
    pub resource: String,
    pub result: String,
    pub detail: Option<String>,
    /// 变更前的值（JSON 字符串），仅更新与删除操作记录。
    pub old_values: Option<String>,
    /// 变更后的值（JSON 字符串）。
    pub new_values: Option<String>,
    pub ts_ms: i64,
}

impl AuditLogRecord {
    /// 资源类型：`space:xxx` 取 `space`。
    pub fn resource_kind(&self) -> &str {
        resource_kind(&self.resource)
    }
}

pub fn resource_kind(resource: &str) -> &str {
    resource.split(':').next().unwrap_or(resource)
}

/// 审计统计：总数及按操作、按资源类型的计数。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditStatistics {
    pub total: u64,
    pub by_action: BTreeMap<String, u64>,
    pub by_resource: BTreeMap<String, u64>,
}

impl AuditStatistics {
    pub fn add(&mut self, action: &str, resource_kind: &str, count: u64) {
        self.total += count;
        *self.by_action.entry(action.to_string()).or_default() += count;
        *self.by_resource.entry(resource_kind.to_string()).or_default() += count;
    }
}

/// 审计日志查询条件。
#[derive(Debug, Clone, Default)]
pub struct AuditLogQuery {
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
    pub action: Option<String>,
    pub resource: Option<String>,
    pub limit: i64,
}

impl AuditLogQuery {
    pub fn matches(&self, record: &AuditLogRecord) -> bool {
        self.from_ms.is_none_or(|from| record.ts_ms >= from)
            && self.to_ms.is_none_or(|to| record.ts_ms <= to)
            && self
                .action
                .as_deref()
                .is_none_or(|action| record.action == action)
            && self
                .resource
                .as_deref()
                .is_none_or(|resource| record.resource == resource)
    }
}
