//! 审计日志 handlers
//!
//! - GET /audit：查询审计日志（admin）
//! - GET /audit/statistics：按操作与资源类型统计（admin）
//! - DELETE /audit?days=N：清理 N 天前的日志（admin）

use crate::AppState;
use crate::middleware::require_roles;
use crate::utils::audit::{record_audit, retention_cutoff_ms};
use crate::utils::response::{
    audit_log_to_dto, audit_statistics_to_dto, bad_request_error, ok, storage_error,
};
use api_contract::{
    AuditLogDto, AuditLogQueryParams, AuditStatisticsQuery, PurgeAuditQuery, PurgeAuditResponse,
};
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Response,
};
use domain::permissions::ADMIN_ONLY;
use park_storage::AuditLogQuery;
use serde_json::json;

/// 默认返回条数。
const DEFAULT_AUDIT_LIMIT: i64 = 100;

/// 查询审计日志
///
/// 查询参数：
///   - from / to：可选，时间戳（毫秒）闭区间
///   - action / resource：可选，精确匹配
///   - limit：可选，默认 100
pub async fn list_audit_logs(
    State(state): State<AppState>,
    Query(query): Query<AuditLogQueryParams>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_roles(&state, &headers, ADMIN_ONLY) {
        return response;
    }
    let query = AuditLogQuery {
        from_ms: query.from,
        to_ms: query.to,
        action: query.action,
        resource: query.resource,
        limit: query.limit.unwrap_or(DEFAULT_AUDIT_LIMIT).max(0),
    };
    match state.audit_log_store.list_audit_logs(query).await {
        Ok(items) => {
            let data: Vec<AuditLogDto> = items.into_iter().map(audit_log_to_dto).collect();
            ok(data)
        }
        Err(err) => storage_error(err),
    }
}

/// 审计统计
///
/// 查询参数 from / to 可选；`from > to` 返回 400。
pub async fn audit_statistics(
    State(state): State<AppState>,
    Query(query): Query<AuditStatisticsQuery>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_roles(&state, &headers, ADMIN_ONLY) {
        return response;
    }
    if let (Some(from), Some(to)) = (query.from, query.to) {
        if from > to {
            return bad_request_error("from must not be after to");
        }
    }
    match state
        .audit_log_store
        .audit_statistics(query.from, query.to)
        .await
    {
        Ok(stats) => ok(audit_statistics_to_dto(stats)),
        Err(err) => storage_error(err),
    }
}

/// 清理审计日志
///
/// 清理本身也会写入一条审计记录。
pub async fn purge_audit_logs(
    State(state): State<AppState>,
    Query(query): Query<PurgeAuditQuery>,
    headers: HeaderMap,
) -> Response {
    let ctx = match require_roles(&state, &headers, ADMIN_ONLY) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let Some(days) = query.days else {
        return bad_request_error("days required");
    };
    let cutoff_ms = retention_cutoff_ms(state.clock.now_ms(), days);
    match state.audit_log_store.purge_audit_logs_before(cutoff_ms).await {
        Ok(deleted) => {
            park_telemetry::record_audit_purged(deleted);
            tracing::info!(target: "park.api", deleted, cutoff_ms, "audit_purged");
            record_audit(
                &state,
                &ctx,
                "AUDIT.PURGE",
                "audit:*".to_string(),
                "success",
                Some(json!({ "days": days, "deleted": deleted })),
            )
            .await;
            ok(PurgeAuditResponse { deleted, cutoff_ms })
        }
        Err(err) => storage_error(err),
    }
}
