//! 传感器 handlers
//!
//! - GET /sensors：列出启用中的传感器，附带在线状态
//! - POST /sensors：创建传感器（admin）
//! - GET /sensors/{id}：传感器详情
//! - PATCH /sensors/{id}：更新类型、位置说明、绑定车位；`spaceId: null` 解除绑定（admin）
//! - DELETE /sensors/{id}：停用（逻辑删除，admin）
//! - POST /sensors/event：设备同步上报 `{hwId,status}`（无需认证）
//!
//! 同一硬件 ID 同时只能有一个启用中的传感器。

use crate::AppState;
use crate::middleware::require_roles;
use crate::utils::audit::{ChangeSet, record_audit, record_change};
use crate::utils::response::{
    bad_request_error, conflict_error, ingest_outcome_to_dto, not_found_error, ok,
    pipeline_error, sensor_to_dto, storage_error,
};
use crate::utils::{normalize_optional, normalize_required, parse_sensor_kind};
use api_contract::{CreateSensorRequest, SensorDto, SensorEventRequest, UpdateSensorRequest};
use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
    response::Response,
};
use domain::permissions::{ADMIN_ONLY, ANY_ROLE};
use domain::{EventOrigin, EventTarget, RawStatusEvent};
use park_storage::{SensorRecord, SensorUpdate};
use serde_json::json;
use uuid::Uuid;

#[derive(serde::Deserialize)]
pub struct SensorPath {
    sensor_id: String,
}

/// 为传感器列表补充在线状态；在线状态存储不可用时按离线返回
pub async fn sensors_with_presence(state: &AppState, items: Vec<SensorRecord>) -> Vec<SensorDto> {
    let hw_ids: Vec<String> = items.iter().map(|item| item.hw_id.clone()).collect();
    let last_seen = match state.presence_store.list_last_seen_at_ms(&hw_ids).await {
        Ok(map) => map,
        Err(err) => {
            tracing::warn!(target: "park.api", error = %err, "presence_lookup_failed");
            Default::default()
        }
    };
    let now_ms = state.clock.now_ms();
    items
        .into_iter()
        .map(|record| {
            let seen = last_seen.get(&record.hw_id).copied();
            sensor_to_dto(record, seen, now_ms, state.presence_ttl_ms)
        })
        .collect()
}

/// 审计用的传感器快照
fn sensor_snapshot(record: &SensorRecord) -> serde_json::Value {
    json!({
        "hwId": record.hw_id,
        "kind": record.kind.as_str(),
        "locationNote": record.location_note,
        "spaceId": record.space_id,
        "active": record.active,
    })
}

async fn ensure_space_exists(state: &AppState, space_id: &str) -> Result<(), Response> {
    match state.space_store.find_space(space_id).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(bad_request_error(format!("space not found: {space_id}"))),
        Err(err) => Err(storage_error(err)),
    }
}

pub async fn list_sensors(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_roles(&state, &headers, ANY_ROLE) {
        return response;
    }
    match state.sensor_store.list_sensors().await {
        Ok(items) => ok(sensors_with_presence(&state, items).await),
        Err(err) => storage_error(err),
    }
}

/// 创建传感器
///
/// # 错误处理
///
/// - `400 BAD REQUEST`: hwId 缺失、类型非法或绑定的车位不存在
/// - `409 CONFLICT`: 已有同一硬件 ID 的启用中传感器
pub async fn create_sensor(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateSensorRequest>,
) -> Response {
    let ctx = match require_roles(&state, &headers, ADMIN_ONLY) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let hw_id = match normalize_required(req.hw_id, "hwId") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let kind = match parse_sensor_kind(req.kind) {
        Ok(value) => value.unwrap_or_default(),
        Err(response) => return response,
    };
    let location_note = match normalize_optional(req.location_note, "locationNote") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let space_id = match normalize_optional(req.space_id, "spaceId") {
        Ok(value) => value,
        Err(response) => return response,
    };
    if let Some(space_id) = space_id.as_deref() {
        if let Err(response) = ensure_space_exists(&state, space_id).await {
            return response;
        }
    }
    match state.sensor_store.find_active_by_hw_id(&hw_id).await {
        Ok(Some(_)) => return conflict_error(format!("active sensor already exists: {hw_id}")),
        Ok(None) => {}
        Err(err) => return storage_error(err),
    }

    let now_ms = state.clock.now_ms();
    let record = SensorRecord {
        sensor_id: Uuid::new_v4().to_string(),
        hw_id,
        kind,
        active: true,
        location_note,
        space_id,
        created_at_ms: now_ms,
        updated_at_ms: now_ms,
    };
    match state.sensor_store.create_sensor(record).await {
        Ok(created) => {
            record_audit(
                &state,
                &ctx,
                "SENSOR.CREATE",
                format!("sensor:{}", created.sensor_id),
                "success",
                Some(json!({ "hwId": created.hw_id, "spaceId": created.space_id })),
            )
            .await;
            ok(sensors_with_presence(&state, vec![created]).await.pop())
        }
        Err(err) => storage_error(err),
    }
}

pub async fn get_sensor(
    State(state): State<AppState>,
    Path(path): Path<SensorPath>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_roles(&state, &headers, ANY_ROLE) {
        return response;
    }
    match state.sensor_store.find_sensor(&path.sensor_id).await {
        Ok(Some(record)) => ok(sensors_with_presence(&state, vec![record]).await.pop()),
        Ok(None) => not_found_error(format!("sensor not found: {}", path.sensor_id)),
        Err(err) => storage_error(err),
    }
}

/// 更新传感器；未提供的字段保持不变
pub async fn update_sensor(
    State(state): State<AppState>,
    Path(path): Path<SensorPath>,
    headers: HeaderMap,
    Json(req): Json<UpdateSensorRequest>,
) -> Response {
    let ctx = match require_roles(&state, &headers, ADMIN_ONLY) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let kind = match parse_sensor_kind(req.kind) {
        Ok(value) => value,
        Err(response) => return response,
    };
    let location_note = match normalize_optional(req.location_note, "locationNote") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let space_id = match req.space_id {
        Some(value) => match normalize_optional(value, "spaceId") {
            Ok(value) => Some(value),
            Err(response) => return response,
        },
        None => None,
    };
    if let Some(Some(space_id)) = space_id.as_ref() {
        if let Err(response) = ensure_space_exists(&state, space_id).await {
            return response;
        }
    }
    let before = match state.sensor_store.find_sensor(&path.sensor_id).await {
        Ok(Some(record)) => record,
        Ok(None) => return not_found_error(format!("sensor not found: {}", path.sensor_id)),
        Err(err) => return storage_error(err),
    };
    let update = SensorUpdate {
        kind,
        location_note,
        space_id,
        updated_at_ms: state.clock.now_ms(),
    };
    match state.sensor_store.update_sensor(&path.sensor_id, update).await {
        Ok(Some(updated)) => {
            record_change(
                &state,
                &ctx,
                "SENSOR.UPDATE",
                format!("sensor:{}", updated.sensor_id),
                None,
                ChangeSet::new(sensor_snapshot(&before), sensor_snapshot(&updated)),
            )
            .await;
            ok(sensors_with_presence(&state, vec![updated]).await.pop())
        }
        Ok(None) => not_found_error(format!("sensor not found: {}", path.sensor_id)),
        Err(err) => storage_error(err),
    }
}

/// 停用传感器；硬件 ID 随后可重新登记
pub async fn delete_sensor(
    State(state): State<AppState>,
    Path(path): Path<SensorPath>,
    headers: HeaderMap,
) -> Response {
    let ctx = match require_roles(&state, &headers, ADMIN_ONLY) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let before = match state.sensor_store.find_sensor(&path.sensor_id).await {
        Ok(Some(record)) => record,
        Ok(None) => return not_found_error(format!("sensor not found: {}", path.sensor_id)),
        Err(err) => return storage_error(err),
    };
    match state
        .sensor_store
        .deactivate_sensor(&path.sensor_id, state.clock.now_ms())
        .await
    {
        Ok(true) => {
            record_change(
                &state,
                &ctx,
                "SENSOR.DEACTIVATE",
                format!("sensor:{}", path.sensor_id),
                None,
                ChangeSet::removed(sensor_snapshot(&before)),
            )
            .await;
            ok(json!({ "deactivated": true }))
        }
        Ok(false) => not_found_error(format!("sensor not found: {}", path.sensor_id)),
        Err(err) => storage_error(err),
    }
}

/// 设备同步上报
///
/// 传感器未绑定车位时返回 `outcome = discarded`，不视为错误。
pub async fn sensor_event(
    State(state): State<AppState>,
    Json(req): Json<SensorEventRequest>,
) -> Response {
    let event = RawStatusEvent {
        target: EventTarget::Sensor(req.hw_id.unwrap_or_default()),
        status: req.status.unwrap_or_default(),
        origin: EventOrigin::Http,
        received_at_ms: state.clock.now_ms(),
    };
    match state.pipeline.ingest(event).await {
        Ok(outcome) => ok(ingest_outcome_to_dto(outcome)),
        Err(err) => pipeline_error(err),
    }
}
