//! 路由定义
//!
//! 集中管理所有 API 路由，将路径映射到对应的 handlers：
//! - 探针：/health, /readyz
//! - 认证：/login, /refresh-token
//! - 车位：/parking/spaces/*
//! - 传感器：/sensors/*（含设备上报 /sensors/event）
//! - 占用事件：/occupancy/*
//! - 报表：/reports/*
//! - 运维：/audit, /audit/statistics, /metrics

use super::AppState;
use super::handlers::{audit, auth, metrics, occupancy, reports, sensors, spaces};
use axum::{
    Router,
    routing::{get, patch, post},
};

/// 创建 API 路由
///
/// 返回包含所有 API 端点的 Router，由调用方同时挂在 `/` 与 `/api` 下。
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(auth::health))
        .route("/readyz", get(auth::readyz))
        .route("/login", post(auth::login))
        .route("/refresh-token", post(auth::refresh_token))
        .route(
            "/parking/spaces",
            get(spaces::list_spaces).post(spaces::create_space),
        )
        .route("/parking/spaces/multiple", post(spaces::create_spaces))
        .route(
            "/parking/spaces/:space_id",
            get(spaces::get_space)
                .put(spaces::update_space)
                .delete(spaces::delete_space),
        )
        .route(
            "/parking/spaces/:space_id/status",
            patch(spaces::update_space_status),
        )
        .route(
            "/sensors",
            get(sensors::list_sensors).post(sensors::create_sensor),
        )
        .route("/sensors/event", post(sensors::sensor_event))
        .route(
            "/sensors/:sensor_id",
            get(sensors::get_sensor)
                .patch(sensors::update_sensor)
                .delete(sensors::delete_sensor),
        )
        .route(
            "/occupancy",
            get(occupancy::list_recent).post(occupancy::submit_occupancy),
        )
        .route(
            "/occupancy/history/:space_id",
            get(occupancy::list_history),
        )
        .route(
            "/occupancy/latest/:space_id",
            get(occupancy::latest_for_space),
        )
        .route(
            "/occupancy/event/:event_id",
            get(occupancy::get_event)
                .patch(occupancy::update_event)
                .delete(occupancy::delete_event),
        )
        .route(
            "/reports",
            get(reports::list_reports).post(reports::create_report),
        )
        .route("/reports/preview", post(reports::preview_report))
        .route(
            "/reports/:report_id",
            get(reports::get_report)
                .put(reports::update_report)
                .delete(reports::delete_report),
        )
        .route(
            "/audit",
            get(audit::list_audit_logs).delete(audit::purge_audit_logs),
        )
        .route("/audit/statistics", get(audit::audit_statistics))
        .route("/metrics", get(metrics::get_metrics))
}
