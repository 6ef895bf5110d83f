//! 报表 handlers
//!
//! - POST /reports：聚合并保存报表（admin/operator）
//! - POST /reports/preview：只聚合不保存（admin/operator）
//! - GET /reports、GET /reports/{id}
//! - PUT /reports/{id}：管理端修正，不重新聚合（admin）
//! - DELETE /reports/{id}：软删除（admin）

use crate::AppState;
use crate::middleware::require_roles;
use crate::utils::audit::{ChangeSet, record_audit, record_change};
use crate::utils::response::{ok, report_error, report_to_dto, summary_to_dto};
use api_contract::{CreateReportRequest, ReportDto, ReportPreviewDto, UpdateReportRequest};
use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
    response::Response,
};
use domain::permissions::{ADMIN_ONLY, ANY_ROLE, OPERATORS};
use park_report::ReportPatch;
use serde_json::json;

#[derive(serde::Deserialize)]
pub struct ReportPath {
    report_id: String,
}

/// 创建报表
///
/// # 错误处理
///
/// - `400 BAD REQUEST`: spaceId 缺失或 `startDate > endDate`
pub async fn create_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateReportRequest>,
) -> Response {
    let ctx = match require_roles(&state, &headers, OPERATORS) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let space_id = req.space_id.unwrap_or_default();
    match state
        .reports
        .create_report(space_id.trim(), req.start_date, req.end_date)
        .await
    {
        Ok(created) => {
            record_audit(
                &state,
                &ctx,
                "REPORT.CREATE",
                format!("report:{}", created.report_id),
                "success",
                Some(json!({
                    "spaceId": created.space_id,
                    "startDate": created.start_ms,
                    "endDate": created.end_ms,
                })),
            )
            .await;
            ok(report_to_dto(created))
        }
        Err(err) => report_error(err),
    }
}

pub async fn preview_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateReportRequest>,
) -> Response {
    if let Err(response) = require_roles(&state, &headers, OPERATORS) {
        return response;
    }
    let space_id = req.space_id.unwrap_or_default().trim().to_string();
    match state
        .reports
        .preview(&space_id, req.start_date, req.end_date)
        .await
    {
        Ok(summary) => ok(ReportPreviewDto {
            space_id,
            start_date: req.start_date,
            end_date: req.end_date,
            data: summary_to_dto(summary),
        }),
        Err(err) => report_error(err),
    }
}

pub async fn list_reports(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_roles(&state, &headers, ANY_ROLE) {
        return response;
    }
    match state.reports.list_reports().await {
        Ok(items) => {
            let data: Vec<ReportDto> = items.into_iter().map(report_to_dto).collect();
            ok(data)
        }
        Err(err) => report_error(err),
    }
}

pub async fn get_report(
    State(state): State<AppState>,
    Path(path): Path<ReportPath>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_roles(&state, &headers, ANY_ROLE) {
        return response;
    }
    match state.reports.find_report(&path.report_id).await {
        Ok(record) => ok(report_to_dto(record)),
        Err(err) => report_error(err),
    }
}

pub async fn update_report(
    State(state): State<AppState>,
    Path(path): Path<ReportPath>,
    headers: HeaderMap,
    Json(req): Json<UpdateReportRequest>,
) -> Response {
    let ctx = match require_roles(&state, &headers, ADMIN_ONLY) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let before = match state.reports.find_report(&path.report_id).await {
        Ok(record) => record,
        Err(err) => return report_error(err),
    };
    let patch = ReportPatch {
        start_ms: req.start_date,
        end_ms: req.end_date,
        state_change_count: req.state_change_count,
        occupied_ms: req.occupied_millis,
    };
    match state.reports.update_report(&path.report_id, patch).await {
        Ok(updated) => {
            record_change(
                &state,
                &ctx,
                "REPORT.UPDATE",
                format!("report:{}", updated.report_id),
                None,
                ChangeSet::new(report_to_dto(before), report_to_dto(updated.clone())),
            )
            .await;
            ok(report_to_dto(updated))
        }
        Err(err) => report_error(err),
    }
}

pub async fn delete_report(
    State(state): State<AppState>,
    Path(path): Path<ReportPath>,
    headers: HeaderMap,
) -> Response {
    let ctx = match require_roles(&state, &headers, ADMIN_ONLY) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let before = match state.reports.find_report(&path.report_id).await {
        Ok(record) => record,
        Err(err) => return report_error(err),
    };
    match state.reports.delete_report(&path.report_id).await {
        Ok(()) => {
            record_change(
                &state,
                &ctx,
                "REPORT.DELETE",
                format!("report:{}", path.report_id),
                None,
                ChangeSet::removed(report_to_dto(before)),
            )
            .await;
            ok(json!({ "deleted": true }))
        }
        Err(err) => report_error(err),
    }
}
