//! HTTP 响应辅助函数和 DTO 转换
//!
//! - 错误响应：auth_error, forbidden_error, bad_request_error, not_found_error,
//!   conflict_error, internal_auth_error, storage_error, pipeline_error, report_error
//! - DTO 转换：space_to_dto, sensor_to_dto, event_to_dto, ingest_outcome_to_dto,
//!   report_to_dto, audit_log_to_dto, audit_statistics_to_dto
//!
//! 错误码与状态码一一对应：
//! `INVALID.REQUEST` 400、`AUTH.UNAUTHORIZED` 401、`AUTH.FORBIDDEN` 403、
//! `RESOURCE.NOT_FOUND` 404、`RESOURCE.CONFLICT` 409、`INTERNAL.ERROR` 500。

use api_contract::{
    ApiResponse, AuditLogDto, AuditStatisticsDto, IngestResultDto, OccupancyEventDto,
    ReportDataDto, ReportDto, SensorDto, SpaceDto, SpaceRegionDto,
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use domain::SpaceRegion;
use park_auth::AuthError;
use park_pipeline::{IngestOutcome, PipelineError};
use park_report::{OccupancySummary, ReportError};
use park_storage::{
    AuditLogRecord, AuditStatistics, OccupancyEventRecord, ParkingSpaceRecord, ReportRecord,
    SensorRecord, StorageError,
};

/// 成功响应
pub fn ok<T: serde::Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}

fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::<()>::error(code, message.into()))).into_response()
}

/// 认证错误响应
pub fn auth_error(status: StatusCode) -> Response {
    error_response(status, "AUTH.UNAUTHORIZED", "unauthorized")
}

/// 禁止访问错误响应
pub fn forbidden_error() -> Response {
    error_response(StatusCode::FORBIDDEN, "AUTH.FORBIDDEN", "forbidden")
}

/// 错误请求响应
pub fn bad_request_error(message: impl Into<String>) -> Response {
    error_response(StatusCode::BAD_REQUEST, "INVALID.REQUEST", message)
}

/// 资源未找到错误响应
pub fn not_found_error(message: impl Into<String>) -> Response {
    error_response(StatusCode::NOT_FOUND, "RESOURCE.NOT_FOUND", message)
}

/// 资源冲突错误响应
pub fn conflict_error(message: impl Into<String>) -> Response {
    error_response(StatusCode::CONFLICT, "RESOURCE.CONFLICT", message)
}

/// 认证内部错误响应
pub fn internal_auth_error(err: AuthError) -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL.ERROR", err.to_string())
}

/// 存储错误响应（唯一约束冲突映射为 409）
pub fn storage_error(err: StorageError) -> Response {
    if err.is_conflict() {
        return conflict_error(err.to_string());
    }
    tracing::error!(target: "park.api", error = %err, "storage_failed");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL.ERROR", err.to_string())
}

/// 流水线错误响应
pub fn pipeline_error(err: PipelineError) -> Response {
    match err {
        PipelineError::Validation(message) => bad_request_error(message),
        PipelineError::NotFound(message) => not_found_error(message),
        PipelineError::Store(err) => storage_error(err),
    }
}

/// 报表错误响应
pub fn report_error(err: ReportError) -> Response {
    match err {
        ReportError::Validation(_) | ReportError::InvalidRange { .. } => {
            bad_request_error(err.to_string())
        }
        ReportError::NotFound(_) => not_found_error(err.to_string()),
        ReportError::Store(err) => storage_error(err),
    }
}

pub fn region_to_dto(region: SpaceRegion) -> SpaceRegionDto {
    SpaceRegionDto {
        x1: region.x1,
        y1: region.y1,
        x2: region.x2,
        y2: region.y2,
    }
}

pub fn region_from_dto(dto: SpaceRegionDto) -> SpaceRegion {
    SpaceRegion {
        x1: dto.x1,
        y1: dto.y1,
        x2: dto.x2,
        y2: dto.y2,
    }
}

/// ParkingSpaceRecord 转 SpaceDto
pub fn space_to_dto(record: ParkingSpaceRecord) -> SpaceDto {
    SpaceDto {
        space_id: record.space_id,
        space_code: record.space_code,
        status: record.status.as_str().to_string(),
        floor: record.floor,
        region: record.region.map(region_to_dto),
        created_at_ms: record.created_at_ms,
        updated_at_ms: record.updated_at_ms,
    }
}

/// SensorRecord 转 SensorDto；`last_seen_at_ms` 距 `now_ms` 不超过 `ttl_ms` 视为在线
pub fn sensor_to_dto(
    record: SensorRecord,
    last_seen_at_ms: Option<i64>,
    now_ms: i64,
    ttl_ms: i64,
) -> SensorDto {
    let online = last_seen_at_ms.is_some_and(|ts| now_ms.saturating_sub(ts) <= ttl_ms);
    SensorDto {
        sensor_id: record.sensor_id,
        hw_id: record.hw_id,
        kind: record.kind.as_str().to_string(),
        active: record.active,
        location_note: record.location_note,
        space_id: record.space_id,
        online,
        last_seen_at_ms,
        created_at_ms: record.created_at_ms,
        updated_at_ms: record.updated_at_ms,
    }
}

/// OccupancyEventRecord 转 OccupancyEventDto
pub fn event_to_dto(record: OccupancyEventRecord) -> OccupancyEventDto {
    OccupancyEventDto {
        event_id: record.event_id,
        space_id: record.space_id,
        status: record.status.as_str().to_string(),
        ts_ms: record.ts_ms,
        seq: record.seq,
    }
}

/// 流水线处理结果转 IngestResultDto
pub fn ingest_outcome_to_dto(outcome: IngestOutcome) -> IngestResultDto {
    match outcome {
        IngestOutcome::Applied(reconciled) => IngestResultDto {
            outcome: "applied".to_string(),
            space: Some(space_to_dto(reconciled.space)),
            event: Some(event_to_dto(reconciled.event)),
            sensor_id: None,
            hw_id: None,
        },
        IngestOutcome::Discarded { sensor_id, hw_id } => IngestResultDto {
            outcome: "discarded".to_string(),
            space: None,
            event: None,
            sensor_id: Some(sensor_id),
            hw_id: Some(hw_id),
        },
    }
}

pub fn summary_to_dto(summary: OccupancySummary) -> ReportDataDto {
    ReportDataDto {
        state_change_count: summary.state_change_count,
        occupied_millis: summary.occupied_ms,
    }
}

/// ReportRecord 转 ReportDto
pub fn report_to_dto(record: ReportRecord) -> ReportDto {
    ReportDto {
        report_id: record.report_id,
        space_id: record.space_id,
        start_date: record.start_ms,
        end_date: record.end_ms,
        data: ReportDataDto {
            state_change_count: record.state_change_count,
            occupied_millis: record.occupied_ms,
        },
        deleted: record.deleted,
        created_at_ms: record.created_at_ms,
        updated_at_ms: record.updated_at_ms,
    }
}

/// AuditLogRecord 转 AuditLogDto（JSON 文本字段按 JSON 解析，失败时保留原文）
pub fn audit_log_to_dto(record: AuditLogRecord) -> AuditLogDto {
    AuditLogDto {
        audit_id: record.audit_id,
        actor: record.actor,
        action: record.action,
        resource: record.resource,
        result: record.result,
        detail: record.detail.map(parse_json_text),
        old_values: record.old_values.map(parse_json_text),
        new_values: record.new_values.map(parse_json_text),
        ts_ms: record.ts_ms,
    }
}

/// 已保存的 JSON 文本还原为值；无法解析时原样作为字符串返回。
fn parse_json_text(raw: String) -> serde_json::Value {
    serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw))
}

pub fn audit_statistics_to_dto(stats: AuditStatistics) -> AuditStatisticsDto {
    AuditStatisticsDto {
        total: stats.total,
        by_action: stats.by_action,
        by_resource: stats.by_resource,
    }
}
