//! 车位 handlers
//!
//! - GET /parking/spaces：列出车位（任意已登录用户）
//! - POST /parking/spaces：创建车位，未给编号时分配下一个空闲编号（admin）
//! - POST /parking/spaces/multiple：批量生成车位（admin）
//! - GET /parking/spaces/{id}：车位详情，含绑定的传感器
//! - PUT /parking/spaces/{id}：编辑楼层与区域（admin）
//! - DELETE /parking/spaces/{id}：物理删除，先解除传感器绑定（admin）
//! - PATCH /parking/spaces/{id}/status：人工覆盖状态，走占用事件流水线（admin）
//!
//! 车位状态只能经由流水线修改，编辑接口不接受 status 字段。

use crate::AppState;
use crate::handlers::sensors::sensors_with_presence;
use crate::middleware::require_roles;
use crate::utils::audit::{ChangeSet, record_audit, record_change};
use crate::utils::response::{
    bad_request_error, conflict_error, ingest_outcome_to_dto, not_found_error, ok,
    pipeline_error, region_from_dto, space_to_dto, storage_error,
};
use crate::utils::{normalize_optional, validate_region};
use api_contract::{
    CreateSpaceRequest, CreateSpacesRequest, SpaceDetailDto, SpaceDto, UpdateSpaceRequest,
    UpdateSpaceStatusRequest,
};
use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
    response::Response,
};
use domain::permissions::{ADMIN_ONLY, ANY_ROLE};
use domain::space_code::{is_valid_space_code, next_space_code, next_space_codes};
use domain::{EventOrigin, EventTarget, OccupancyStatus, RawStatusEvent};
use park_storage::{ParkingSpaceRecord, SpaceUpdate};
use serde_json::json;
use std::collections::HashSet;
use uuid::Uuid;

/// 单次批量生成上限。
pub const MAX_BULK_SPACES: u32 = 500;

#[derive(serde::Deserialize)]
pub struct SpacePath {
    space_id: String,
}

pub async fn list_spaces(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_roles(&state, &headers, ANY_ROLE) {
        return response;
    }
    match state.space_store.list_spaces().await {
        Ok(items) => {
            let data: Vec<SpaceDto> = items.into_iter().map(space_to_dto).collect();
            ok(data)
        }
        Err(err) => storage_error(err),
    }
}

/// 创建车位
///
/// 显式编号需满足 `A-01`..`Z-99` 且不重复；未提供编号时按顺序分配。
/// 新车位状态为 unknown。
///
/// # 错误处理
///
/// - `400 BAD REQUEST`: 编号格式错误或区域坐标非法
/// - `409 CONFLICT`: 编号已存在或编号已用尽
pub async fn create_space(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateSpaceRequest>,
) -> Response {
    let ctx = match require_roles(&state, &headers, ADMIN_ONLY) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let floor = match normalize_optional(req.floor, "floor") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let region = match validate_region(req.region) {
        Ok(value) => value,
        Err(response) => return response,
    };
    let space_code = match normalize_optional(req.space_code, "spaceCode") {
        Ok(Some(code)) => {
            let code = code.to_ascii_uppercase();
            if !is_valid_space_code(&code) {
                return bad_request_error(format!("invalid space code: {code}"));
            }
            code
        }
        Ok(None) => {
            let existing = match existing_codes(&state).await {
                Ok(codes) => codes,
                Err(response) => return response,
            };
            match next_space_code(&existing) {
                Some(code) => code,
                None => return conflict_error("no free space code left"),
            }
        }
        Err(response) => return response,
    };

    let now_ms = state.clock.now_ms();
    let record = ParkingSpaceRecord {
        space_id: Uuid::new_v4().to_string(),
        space_code,
        status: OccupancyStatus::Unknown,
        floor,
        region: region.map(region_from_dto),
        created_at_ms: now_ms,
        updated_at_ms: now_ms,
    };
    match state.space_store.create_space(record).await {
        Ok(created) => {
            record_audit(
                &state,
                &ctx,
                "PARKING.SPACE.CREATE",
                format!("space:{}", created.space_id),
                "success",
                Some(json!({ "spaceCode": created.space_code })),
            )
            .await;
            ok(space_to_dto(created))
        }
        Err(err) => storage_error(err),
    }
}

/// 批量生成车位
///
/// 跳过已占用的编号，依次生成 `count` 个（1..=500）状态为 unknown 的车位；
/// 整批写入，任一失败则全部不生效。
pub async fn create_spaces(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateSpacesRequest>,
) -> Response {
    let ctx = match require_roles(&state, &headers, ADMIN_ONLY) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    if req.count == 0 || req.count > MAX_BULK_SPACES {
        return bad_request_error(format!("count must be between 1 and {MAX_BULK_SPACES}"));
    }
    let existing = match existing_codes(&state).await {
        Ok(codes) => codes,
        Err(response) => return response,
    };
    let count = req.count as usize;
    let codes = next_space_codes(&existing, count);
    if codes.len() < count {
        return conflict_error(format!(
            "only {} free space codes left, requested {count}",
            codes.len()
        ));
    }

    let now_ms = state.clock.now_ms();
    let records: Vec<ParkingSpaceRecord> = codes
        .into_iter()
        .map(|space_code| ParkingSpaceRecord {
            space_id: Uuid::new_v4().to_string(),
            space_code,
            status: OccupancyStatus::Unknown,
            floor: None,
            region: None,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        })
        .collect();
    match state.space_store.create_spaces(records).await {
        Ok(created) => {
            record_audit(
                &state,
                &ctx,
                "PARKING.SPACE.BULK_CREATE",
                "space:*".to_string(),
                "success",
                Some(json!({
                    "count": created.len(),
                    "codes": created.iter().map(|item| item.space_code.clone()).collect::<Vec<_>>(),
                })),
            )
            .await;
            let data: Vec<SpaceDto> = created.into_iter().map(space_to_dto).collect();
            ok(data)
        }
        Err(err) => storage_error(err),
    }
}

pub async fn get_space(
    State(state): State<AppState>,
    Path(path): Path<SpacePath>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_roles(&state, &headers, ANY_ROLE) {
        return response;
    }
    let space = match state.space_store.find_space(&path.space_id).await {
        Ok(Some(space)) => space,
        Ok(None) => return not_found_error(format!("space not found: {}", path.space_id)),
        Err(err) => return storage_error(err),
    };
    let sensors = match state.sensor_store.list_sensors_for_space(&space.space_id).await {
        Ok(items) => items,
        Err(err) => return storage_error(err),
    };
    ok(SpaceDetailDto {
        space: space_to_dto(space),
        sensors: sensors_with_presence(&state, sensors).await,
    })
}

/// 编辑楼层与区域；未提供的字段保持不变
pub async fn update_space(
    State(state): State<AppState>,
    Path(path): Path<SpacePath>,
    headers: HeaderMap,
    Json(req): Json<UpdateSpaceRequest>,
) -> Response {
    let ctx = match require_roles(&state, &headers, ADMIN_ONLY) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let floor = match normalize_optional(req.floor, "floor") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let region = match validate_region(req.region) {
        Ok(value) => value,
        Err(response) => return response,
    };
    let before = match state.space_store.find_space(&path.space_id).await {
        Ok(Some(space)) => space,
        Ok(None) => return not_found_error(format!("space not found: {}", path.space_id)),
        Err(err) => return storage_error(err),
    };
    let update = SpaceUpdate {
        floor,
        region: region.map(region_from_dto),
        updated_at_ms: state.clock.now_ms(),
    };
    match state.space_store.update_space(&path.space_id, update).await {
        Ok(Some(updated)) => {
            record_change(
                &state,
                &ctx,
                "PARKING.SPACE.UPDATE",
                format!("space:{}", updated.space_id),
                None,
                ChangeSet::new(space_to_dto(before), space_to_dto(updated.clone())),
            )
            .await;
            ok(space_to_dto(updated))
        }
        Ok(None) => not_found_error(format!("space not found: {}", path.space_id)),
        Err(err) => storage_error(err),
    }
}

/// 物理删除车位
///
/// 先解除其下传感器的绑定；历史事件与报表保留。
pub async fn delete_space(
    State(state): State<AppState>,
    Path(path): Path<SpacePath>,
    headers: HeaderMap,
) -> Response {
    let ctx = match require_roles(&state, &headers, ADMIN_ONLY) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let before = match state.space_store.find_space(&path.space_id).await {
        Ok(Some(space)) => space,
        Ok(None) => return not_found_error(format!("space not found: {}", path.space_id)),
        Err(err) => return storage_error(err),
    };
    let unassigned = match state
        .sensor_store
        .unassign_space(&path.space_id, state.clock.now_ms())
        .await
    {
        Ok(count) => count,
        Err(err) => return storage_error(err),
    };
    match state.space_store.delete_space(&path.space_id).await {
        Ok(true) => {
            record_change(
                &state,
                &ctx,
                "PARKING.SPACE.DELETE",
                format!("space:{}", path.space_id),
                Some(json!({ "unassignedSensors": unassigned })),
                ChangeSet::removed(space_to_dto(before)),
            )
            .await;
            ok(serde_json::json!({ "deleted": true }))
        }
        Ok(false) => not_found_error(format!("space not found: {}", path.space_id)),
        Err(err) => storage_error(err),
    }
}

/// 人工覆盖车位状态
///
/// 与传感器上报走同一条流水线：状态按同样规则规范化，并追加一条占用事件。
pub async fn update_space_status(
    State(state): State<AppState>,
    Path(path): Path<SpacePath>,
    headers: HeaderMap,
    Json(req): Json<UpdateSpaceStatusRequest>,
) -> Response {
    let ctx = match require_roles(&state, &headers, ADMIN_ONLY) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let event = RawStatusEvent {
        target: EventTarget::Space(path.space_id.clone()),
        status: req.status.unwrap_or_default(),
        origin: EventOrigin::Http,
        received_at_ms: state.clock.now_ms(),
    };
    match state.pipeline.ingest(event).await {
        Ok(outcome) => {
            let dto = ingest_outcome_to_dto(outcome);
            record_audit(
                &state,
                &ctx,
                "PARKING.SPACE.STATUS_OVERRIDE",
                format!("space:{}", path.space_id),
                "success",
                dto.space
                    .as_ref()
                    .map(|space| json!({ "status": space.status })),
            )
            .await;
            ok(dto)
        }
        Err(err) => pipeline_error(err),
    }
}

async fn existing_codes(state: &AppState) -> Result<HashSet<String>, Response> {
    state
        .space_store
        .list_space_codes()
        .await
        .map(|codes| codes.into_iter().collect())
        .map_err(storage_error)
}
