//! 占用报表
//!
//! - [`aggregate`]：纯聚合函数（状态变更次数、累计占用时长）
//! - [`ReportService`]：区间读取 + 聚合 + 快照保存，以及管理端修正与软删除

pub mod aggregate;
pub mod service;

pub use aggregate::{OccupancySummary, aggregate};
pub use service::{ReportError, ReportPatch, ReportService};
