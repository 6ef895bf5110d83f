//! # PostgreSQL 存储实现模块
//!
//! 本模块提供所有存储接口的 PostgreSQL 实现，用于生产环境。
//!
//! ## 设计原则
//!
//! 1. **参数化查询**：所有 SQL 查询使用参数绑定，防止 SQL 注入攻击
//! 2. **约束兜底**：车位编号唯一、启用传感器硬件 ID 唯一由数据库索引保证，
//!    违反时转换为 `StorageError::conflict`
//! 3. **连接池管理**：使用连接池复用数据库连接
//!
//! ## 包含的实现
//!
//! - **UserStore** (`user.rs`)
//! - **SpaceStore** (`space.rs`)
//! - **SensorStore** (`sensor.rs`)
//! - **OccupancyEventStore** (`occupancy.rs`)：`seq` 由 bigserial 分配
//! - **ReportStore** (`report.rs`)
//! - **AuditLogStore** (`audit.rs`)
//!
//! ## 数据库模式要求
//!
//! 见 `migrations/0001_parking.sql`：
//! - `users`、`parking_spaces`、`sensors`、`occupancy_events`、`reports`、`audit_logs`
//!
//! ### 索引
//! - `idx_occupancy_events_space_ts`：(space_id, ts_ms, seq)，区间查询与报表聚合
//! - `idx_sensors_active_hw_id`：部分唯一索引（仅 active = true）
//!
//! ## 事务支持
//!
//! 批量创建车位在单个事务内执行，任一编号冲突整体回滚。

pub mod audit;
pub mod occupancy;
pub mod report;
pub mod sensor;
pub mod space;
pub mod user;

pub use audit::*;
pub use occupancy::*;
pub use report::*;
pub use sensor::*;
pub use space::*;
pub use user::*;

use crate::error::StorageError;
use domain::OccupancyStatus;

pub(crate) fn parse_status(value: &str) -> Result<OccupancyStatus, StorageError> {
    OccupancyStatus::parse(value)
        .ok_or_else(|| StorageError::new(format!("invalid occupancy status in store: {value}")))
}
