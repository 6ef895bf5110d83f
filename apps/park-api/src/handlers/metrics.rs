//! 进程内计数指标快照。
//!
//! - GET /metrics

use api_contract::MetricsSnapshotDto;
use axum::{extract::State, http::HeaderMap, response::Response};
use domain::permissions::ADMIN_ONLY;
use park_telemetry::metrics;

use crate::{AppState, middleware::require_roles, utils::response::ok};

pub async fn get_metrics(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_roles(&state, &headers, ADMIN_ONLY) {
        return response;
    }

    let snapshot = metrics().snapshot();
    ok(MetricsSnapshotDto {
        raw_events_http: snapshot.raw_events_http,
        raw_events_bus: snapshot.raw_events_bus,
        occupancy_applied: snapshot.occupancy_applied,
        discarded_unassigned: snapshot.discarded_unassigned,
        rejected_validation: snapshot.rejected_validation,
        rejected_not_found: snapshot.rejected_not_found,
        store_failures: snapshot.store_failures,
        bus_acks: snapshot.bus_acks,
        bus_nacks: snapshot.bus_nacks,
        reports_created: snapshot.reports_created,
        audit_purged: snapshot.audit_purged,
        reconcile_latency_ms_total: snapshot.reconcile_latency_ms_total,
        reconcile_latency_ms_count: snapshot.reconcile_latency_ms_count,
    })
}
