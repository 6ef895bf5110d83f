//! 稳定的 DTO 与 API 响应契约。
//!
//! 所有 JSON 字段使用 camelCase；时间字段均为毫秒时间戳。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 标准 API 响应封装。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// 失败响应的错误体。
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// 登录请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// 登录响应体。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// access token 过期时间（毫秒）。
    pub expires: u64,
    pub username: String,
    pub roles: Vec<String>,
}

/// 刷新 token 请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[serde(alias = "refresh_token")]
    pub refresh_token: String,
}

/// 刷新 token 响应体。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires: u64,
}

/// 车位矩形区域（摄像头坐标）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceRegionDto {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

/// 车位创建请求体；未给出编号时自动分配下一个空闲编号。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSpaceRequest {
    #[serde(default)]
    pub space_code: Option<String>,
    #[serde(default)]
    pub floor: Option<String>,
    #[serde(default)]
    pub region: Option<SpaceRegionDto>,
}

/// 批量生成车位请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSpacesRequest {
    pub count: u32,
}

/// 车位编辑请求体（楼层与区域）。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSpaceRequest {
    #[serde(default)]
    pub floor: Option<String>,
    #[serde(default)]
    pub region: Option<SpaceRegionDto>,
}

/// 人工覆盖车位状态请求体。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSpaceStatusRequest {
    #[serde(default)]
    pub status: Option<String>,
}

/// 车位返回结构。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceDto {
    pub space_id: String,
    pub space_code: String,
    pub status: String,
    pub floor: Option<String>,
    pub region: Option<SpaceRegionDto>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

/// 车位详情（含绑定的传感器）。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceDetailDto {
    #[serde(flatten)]
    pub space: SpaceDto,
    pub sensors: Vec<SensorDto>,
}

/// 传感器创建请求体。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSensorRequest {
    #[serde(default)]
    pub hw_id: Option<String>,
    #[serde(default, alias = "type")]
    pub kind: Option<String>,
    #[serde(default, alias = "locationDescription")]
    pub location_note: Option<String>,
    #[serde(default, alias = "parkingSpaceId")]
    pub space_id: Option<String>,
}

/// 传感器更新请求体。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSensorRequest {
    #[serde(default, alias = "type")]
    pub kind: Option<String>,
    #[serde(default, alias = "locationDescription")]
    pub location_note: Option<String>,
    /// 字段缺失为 `None`；显式 `null` 为 `Some(None)`，表示解除绑定。
    #[serde(
        default,
        alias = "parkingSpaceId",
        deserialize_with = "present_or_null"
    )]
    pub space_id: Option<Option<String>>,
}

/// 区分"字段缺失"与"字段为 null"：只要字段出现就包一层 `Some`。
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// 传感器返回结构。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorDto {
    pub sensor_id: String,
    pub hw_id: String,
    pub kind: String,
    pub active: bool,
    pub location_note: Option<String>,
    pub space_id: Option<String>,
    pub online: bool,
    pub last_seen_at_ms: Option<i64>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

/// 传感器上报事件 `{hwId,status}`（HTTP 同步通道）。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorEventRequest {
    #[serde(default, alias = "hw_id")]
    pub hw_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// 直接指定车位的占用事件 `{spaceId,status}`。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyEventRequest {
    #[serde(default, alias = "space_id")]
    pub space_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// 占用事件返回结构。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyEventDto {
    pub event_id: String,
    pub space_id: String,
    pub status: String,
    pub ts_ms: i64,
    pub seq: i64,
}

/// 单条事件的接入结果。
///
/// `outcome` 为 `applied` 时携带更新后的车位与事件；
/// 为 `discarded` 时表示传感器尚未绑定车位。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResultDto {
    pub outcome: String,
    pub space: Option<SpaceDto>,
    pub event: Option<OccupancyEventDto>,
    pub sensor_id: Option<String>,
    pub hw_id: Option<String>,
}

/// 管理端修正事件状态请求体。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOccupancyEventRequest {
    #[serde(default)]
    pub status: Option<String>,
}

/// 历史查询参数（闭区间，边界可选）。
#[derive(Debug, Default, Deserialize)]
pub struct OccupancyHistoryQuery {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

/// 最近事件查询参数。
#[derive(Debug, Default, Deserialize)]
pub struct RecentEventsQuery {
    pub limit: Option<usize>,
}

/// 报表创建/预览请求体。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    #[serde(default, alias = "parkingSpaceId")]
    pub space_id: Option<String>,
    pub start_date: i64,
    pub end_date: i64,
}

/// 报表更新请求体（管理端修正，字段均可选）。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReportRequest {
    #[serde(default)]
    pub start_date: Option<i64>,
    #[serde(default)]
    pub end_date: Option<i64>,
    #[serde(default)]
    pub state_change_count: Option<i64>,
    #[serde(default)]
    pub occupied_millis: Option<i64>,
}

/// 聚合结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDataDto {
    pub state_change_count: i64,
    pub occupied_millis: i64,
}

/// 报表返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDto {
    pub report_id: String,
    pub space_id: String,
    pub start_date: i64,
    pub end_date: i64,
    pub data: ReportDataDto,
    pub deleted: bool,
    pub created_at_ms: i64,
    pub updated_at_ms: Option<i64>,
}

/// 报表预览返回结构（不保存）。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPreviewDto {
    pub space_id: String,
    pub start_date: i64,
    pub end_date: i64,
    pub data: ReportDataDto,
}

/// 审计日志查询参数。
#[derive(Debug, Default, Deserialize)]
pub struct AuditLogQueryParams {
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub action: Option<String>,
    pub resource: Option<String>,
    pub limit: Option<i64>,
}

/// 审计日志清理参数。
#[derive(Debug, Default, Deserialize)]
pub struct PurgeAuditQuery {
    pub days: Option<u64>,
}

/// 审计日志清理结果。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeAuditResponse {
    pub deleted: u64,
    pub cutoff_ms: i64,
}

/// 审计日志返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogDto {
    pub audit_id: String,
    pub actor: String,
    pub action: String,
    pub resource: String,
    pub result: String,
    pub detail: Option<serde_json::Value>,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub ts_ms: i64,
}

/// 审计统计查询参数（闭区间，可选）。
#[derive(Debug, Default, Deserialize)]
pub struct AuditStatisticsQuery {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

/// 审计统计返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStatisticsDto {
    pub total: u64,
    pub by_action: BTreeMap<String, u64>,
    pub by_resource: BTreeMap<String, u64>,
}

/// 指标快照返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshotDto {
    pub raw_events_http: u64,
    pub raw_events_bus: u64,
    pub occupancy_applied: u64,
    pub discarded_unassigned: u64,
    pub rejected_validation: u64,
    pub rejected_not_found: u64,
    pub store_failures: u64,
    pub bus_acks: u64,
    pub bus_nacks: u64,
    pub reports_created: u64,
    pub audit_purged: u64,
    pub reconcile_latency_ms_total: u64,
    pub reconcile_latency_ms_count: u64,
}
