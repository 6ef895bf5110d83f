//! 占用事件 handlers
//!
//! - POST /occupancy：按车位提交状态 `{spaceId,status}`（admin/operator）
//! - GET /occupancy：最近事件（所有车位）
//! - GET /occupancy/history/{spaceId}?start&end：车位历史，按时间倒序
//! - GET /occupancy/latest/{spaceId}：车位最新一条事件
//! - GET/PATCH/DELETE /occupancy/event/{eventId}：单条事件查看与管理端修正
//!
//! 修正或删除事件不会回写车位当前状态，也不会重算已生成的报表。

use crate::AppState;
use crate::middleware::require_roles;
use crate::utils::audit::{ChangeSet, record_change};
use crate::utils::parse_status_strict;
use crate::utils::response::{
    bad_request_error, event_to_dto, ingest_outcome_to_dto, not_found_error, ok,
    pipeline_error, storage_error,
};
use api_contract::{
    OccupancyEventDto, OccupancyEventRequest, OccupancyHistoryQuery, RecentEventsQuery,
    UpdateOccupancyEventRequest,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Response,
};
use domain::permissions::{ADMIN_ONLY, ANY_ROLE, OPERATORS};
use domain::{EventOrigin, EventTarget, RawStatusEvent};
use park_storage::EventRange;
use serde_json::json;

/// 最近事件默认条数。
pub const DEFAULT_RECENT_LIMIT: usize = 50;
/// 最近事件条数上限。
pub const MAX_RECENT_LIMIT: usize = 500;

#[derive(serde::Deserialize)]
pub struct SpacePath {
    space_id: String,
}

#[derive(serde::Deserialize)]
pub struct EventPath {
    event_id: String,
}

/// 提交车位状态
///
/// 状态非法按 unknown 处理；车位不存在返回 404。
pub async fn submit_occupancy(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<OccupancyEventRequest>,
) -> Response {
    if let Err(response) = require_roles(&state, &headers, OPERATORS) {
        return response;
    }
    let event = RawStatusEvent {
        target: EventTarget::Space(req.space_id.unwrap_or_default()),
        status: req.status.unwrap_or_default(),
        origin: EventOrigin::Http,
        received_at_ms: state.clock.now_ms(),
    };
    match state.pipeline.ingest(event).await {
        Ok(outcome) => ok(ingest_outcome_to_dto(outcome)),
        Err(err) => pipeline_error(err),
    }
}

pub async fn list_recent(
    State(state): State<AppState>,
    Query(query): Query<RecentEventsQuery>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_roles(&state, &headers, ANY_ROLE) {
        return response;
    }
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .min(MAX_RECENT_LIMIT);
    match state.event_store.list_recent_events(limit).await {
        Ok(items) => {
            let data: Vec<OccupancyEventDto> = items.into_iter().map(event_to_dto).collect();
            ok(data)
        }
        Err(err) => storage_error(err),
    }
}

/// 车位历史
///
/// `start`/`end` 均为闭区间边界；车位不存在时返回空列表。
pub async fn list_history(
    State(state): State<AppState>,
    Path(path): Path<SpacePath>,
    Query(query): Query<OccupancyHistoryQuery>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_roles(&state, &headers, ANY_ROLE) {
        return response;
    }
    if let (Some(start), Some(end)) = (query.start, query.end) {
        if start > end {
            return bad_request_error(format!("start {start} is after end {end}"));
        }
    }
    let range = EventRange {
        from_ms: query.start,
        to_ms: query.end,
        ..EventRange::default()
    }
    .descending();
    match state.event_store.list_events(&path.space_id, range).await {
        Ok(items) => {
            let data: Vec<OccupancyEventDto> = items.into_iter().map(event_to_dto).collect();
            ok(data)
        }
        Err(err) => storage_error(err),
    }
}

pub async fn latest_for_space(
    State(state): State<AppState>,
    Path(path): Path<SpacePath>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_roles(&state, &headers, ANY_ROLE) {
        return response;
    }
    match state.event_store.latest_event(&path.space_id).await {
        Ok(Some(event)) => ok(event_to_dto(event)),
        Ok(None) => not_found_error(format!("no events for space: {}", path.space_id)),
        Err(err) => storage_error(err),
    }
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(path): Path<EventPath>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_roles(&state, &headers, ANY_ROLE) {
        return response;
    }
    match state.event_store.find_event(&path.event_id).await {
        Ok(Some(event)) => ok(event_to_dto(event)),
        Ok(None) => not_found_error(format!("event not found: {}", path.event_id)),
        Err(err) => storage_error(err),
    }
}

/// 修正事件状态
///
/// 与上报不同，这里的状态必须是合法取值，否则返回 400。
pub async fn update_event(
    State(state): State<AppState>,
    Path(path): Path<EventPath>,
    headers: HeaderMap,
    Json(req): Json<UpdateOccupancyEventRequest>,
) -> Response {
    let ctx = match require_roles(&state, &headers, ADMIN_ONLY) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let status = match parse_status_strict(req.status) {
        Ok(status) => status,
        Err(response) => return response,
    };
    let before = match state.event_store.find_event(&path.event_id).await {
        Ok(Some(record)) => record,
        Ok(None) => return not_found_error(format!("event not found: {}", path.event_id)),
        Err(err) => return storage_error(err),
    };
    match state
        .event_store
        .update_event_status(&path.event_id, status)
        .await
    {
        Ok(Some(updated)) => {
            record_change(
                &state,
                &ctx,
                "OCCUPANCY.EVENT.UPDATE",
                format!("event:{}", updated.event_id),
                None,
                ChangeSet::new(event_to_dto(before), event_to_dto(updated.clone())),
            )
            .await;
            ok(event_to_dto(updated))
        }
        Ok(None) => not_found_error(format!("event not found: {}", path.event_id)),
        Err(err) => storage_error(err),
    }
}

pub async fn delete_event(
    State(state): State<AppState>,
    Path(path): Path<EventPath>,
    headers: HeaderMap,
) -> Response {
    let ctx = match require_roles(&state, &headers, ADMIN_ONLY) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let before = match state.event_store.find_event(&path.event_id).await {
        Ok(Some(record)) => record,
        Ok(None) => return not_found_error(format!("event not found: {}", path.event_id)),
        Err(err) => return storage_error(err),
    };
    match state.event_store.delete_event(&path.event_id).await {
        Ok(true) => {
            record_change(
                &state,
                &ctx,
                "OCCUPANCY.EVENT.DELETE",
                format!("event:{}", path.event_id),
                None,
                ChangeSet::removed(event_to_dto(before)),
            )
            .await;
            ok(json!({ "deleted": true }))
        }
        Ok(false) => not_found_error(format!("event not found: {}", path.event_id)),
        Err(err) => storage_error(err),
    }
}
