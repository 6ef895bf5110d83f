//! 存储接口 Trait 定义
//!
//! 定义所有资源存储的异步接口：
//! - UserStore：用户存储
//! - SpaceStore：车位存储
//! - SensorStore：传感器存储
//! - OccupancyEventStore：占用事件存储
//! - ReportStore：报表存储
//! - AuditLogStore：审计日志存储
//!
//! 设计原则：
//! - 所有接口返回 StorageError
//! - 使用 async_trait 支持动态分发
//! - 返回 `Option<T>` / `bool` 表示"可能不存在"

use crate::error::StorageError;
use crate::models::{
    AuditLogQuery, AuditLogRecord, AuditStatistics, EventRange, NewOccupancyEvent, OccupancyEventRecord,
    ParkingSpaceRecord, ReportRecord, ReportUpdate, SensorRecord, SensorUpdate, SpaceUpdate,
    UserRecord,
};
use async_trait::async_trait;
use domain::OccupancyStatus;

/// 用户存储接口
///
/// 提供用户查询功能（禁止在 handler 中直接连 SQL）。
#[async_trait]
pub trait UserStore: Send + Sync {
    /// 根据用户名查找用户
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StorageError>;

    /// 根据用户 ID 查找用户（刷新 token 时使用）
    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserRecord>, StorageError>;

    /// 更新用户口令哈希
    async fn update_password_hash(
        &self,
        user_id: &str,
        password_hash: &str,
    ) -> Result<bool, StorageError>;
}

/// 车位存储接口
#[async_trait]
pub trait SpaceStore: Send + Sync {
    /// 列出全部车位（按编号升序）
    async fn list_spaces(&self) -> Result<Vec<ParkingSpaceRecord>, StorageError>;

    async fn find_space(&self, space_id: &str) -> Result<Option<ParkingSpaceRecord>, StorageError>;

    async fn find_space_by_code(
        &self,
        space_code: &str,
    ) -> Result<Option<ParkingSpaceRecord>, StorageError>;

    /// 已占用的车位编号集合（编号生成器使用）
    async fn list_space_codes(&self) -> Result<Vec<String>, StorageError>;

    /// 创建车位；编号重复返回冲突错误
    async fn create_space(
        &self,
        record: ParkingSpaceRecord,
    ) -> Result<ParkingSpaceRecord, StorageError>;

    /// 批量创建车位；任一编号冲突则整体失败
    async fn create_spaces(
        &self,
        records: Vec<ParkingSpaceRecord>,
    ) -> Result<Vec<ParkingSpaceRecord>, StorageError>;

    async fn update_space(
        &self,
        space_id: &str,
        update: SpaceUpdate,
    ) -> Result<Option<ParkingSpaceRecord>, StorageError>;

    /// 写入当前状态。
    ///
    /// 仅供状态协调器在车位锁内调用。
    async fn set_space_status(
        &self,
        space_id: &str,
        status: OccupancyStatus,
        updated_at_ms: i64,
    ) -> Result<Option<ParkingSpaceRecord>, StorageError>;

    async fn delete_space(&self, space_id: &str) -> Result<bool, StorageError>;
}

/// 传感器存储接口
///
/// 查询接口只返回启用中的传感器；停用是逻辑删除。
#[async_trait]
pub trait SensorStore: Send + Sync {
    async fn list_sensors(&self) -> Result<Vec<SensorRecord>, StorageError>;

    async fn list_sensors_for_space(
        &self,
        space_id: &str,
    ) -> Result<Vec<SensorRecord>, StorageError>;

    async fn find_sensor(&self, sensor_id: &str) -> Result<Option<SensorRecord>, StorageError>;

    /// 按硬件 ID 查找启用中的传感器
    async fn find_active_by_hw_id(&self, hw_id: &str)
    -> Result<Option<SensorRecord>, StorageError>;

    /// 创建传感器；同一硬件 ID 已有启用中的传感器时返回冲突错误
    async fn create_sensor(&self, record: SensorRecord) -> Result<SensorRecord, StorageError>;

    async fn update_sensor(
        &self,
        sensor_id: &str,
        update: SensorUpdate,
    ) -> Result<Option<SensorRecord>, StorageError>;

    async fn deactivate_sensor(
        &self,
        sensor_id: &str,
        updated_at_ms: i64,
    ) -> Result<bool, StorageError>;

    /// 解除某车位下全部传感器的绑定，返回受影响数量
    async fn unassign_space(&self, space_id: &str, updated_at_ms: i64)
    -> Result<u64, StorageError>;
}

/// 占用事件存储接口
///
/// 事件只追加；`list_events` 结果按 `(ts_ms, seq)` 排序。
#[async_trait]
pub trait OccupancyEventStore: Send + Sync {
    async fn append_event(
        &self,
        event: NewOccupancyEvent,
    ) -> Result<OccupancyEventRecord, StorageError>;

    async fn list_events(
        &self,
        space_id: &str,
        range: EventRange,
    ) -> Result<Vec<OccupancyEventRecord>, StorageError>;

    async fn latest_event(
        &self,
        space_id: &str,
    ) -> Result<Option<OccupancyEventRecord>, StorageError>;

    async fn find_event(&self, event_id: &str)
    -> Result<Option<OccupancyEventRecord>, StorageError>;

    /// 最近事件（所有车位，按时间倒序）
    async fn list_recent_events(
        &self,
        limit: usize,
    ) -> Result<Vec<OccupancyEventRecord>, StorageError>;

    /// 管理端修正事件状态（不影响车位当前状态）
    async fn update_event_status(
        &self,
        event_id: &str,
        status: OccupancyStatus,
    ) -> Result<Option<OccupancyEventRecord>, StorageError>;

    async fn delete_event(&self, event_id: &str) -> Result<bool, StorageError>;
}

/// 报表存储接口
///
/// 查询接口不返回已软删除的报表。
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn create_report(&self, record: ReportRecord) -> Result<ReportRecord, StorageError>;

    async fn find_report(&self, report_id: &str) -> Result<Option<ReportRecord>, StorageError>;

    /// 按创建时间倒序
    async fn list_reports(&self) -> Result<Vec<ReportRecord>, StorageError>;

    async fn update_report(
        &self,
        report_id: &str,
        update: ReportUpdate,
    ) -> Result<Option<ReportRecord>, StorageError>;

    async fn soft_delete_report(
        &self,
        report_id: &str,
        updated_at_ms: i64,
    ) -> Result<bool, StorageError>;
}

/// 审计日志存储接口
#[async_trait]
pub trait AuditLogStore: Send + Sync {
    async fn create_audit_log(&self, record: AuditLogRecord)
    -> Result<AuditLogRecord, StorageError>;

    /// 按时间倒序
    async fn list_audit_logs(
        &self,
        query: AuditLogQuery,
    ) -> Result<Vec<AuditLogRecord>, StorageError>;

    /// 统计闭区间内的日志数量，按操作与资源类型分组
    async fn audit_statistics(
        &self,
        from_ms: Option<i64>,
        to_ms: Option<i64>,
    ) -> Result<AuditStatistics, StorageError>;

    /// 删除早于 `cutoff_ms` 的日志，返回删除数量
    async fn purge_audit_logs_before(&self, cutoff_ms: i64) -> Result<u64, StorageError>;
}
