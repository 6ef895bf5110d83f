//! 内存存储实现模块
//!
//! 用于本地演示（`PARK_STORAGE=memory`）和测试。
//!
//! 包含以下实现：
//! - UserStore: InMemoryUserStore
//! - SpaceStore: InMemorySpaceStore
//! - SensorStore: InMemorySensorStore
//! - OccupancyEventStore: InMemoryOccupancyEventStore
//! - ReportStore: InMemoryReportStore
//! - AuditLogStore: InMemoryAuditLogStore
//! - SensorPresenceStore: InMemorySensorPresenceStore

pub mod audit;
pub mod occupancy;
pub mod presence;
pub mod report;
pub mod sensor;
pub mod space;
pub mod user;

pub use audit::*;
pub use occupancy::*;
pub use presence::*;
pub use report::*;
pub use sensor::*;
pub use space::*;
pub use user::*;
