use park_telemetry::{metrics, new_request_ids, record_audit_purged, record_reconcile_latency_ms};

#[test]
fn request_ids_non_empty_and_distinct() {
    let ids = new_request_ids();
    assert!(!ids.request_id.is_empty());
    assert!(!ids.trace_id.is_empty());
    assert_ne!(ids.request_id, new_request_ids().request_id);
}

#[test]
fn counters_accumulate() {
    let before = metrics().snapshot();
    record_audit_purged(3);
    record_reconcile_latency_ms(7);
    let after = metrics().snapshot();
    assert!(after.audit_purged >= before.audit_purged + 3);
    assert!(after.reconcile_latency_ms_count > before.reconcile_latency_ms_count);
    assert!(after.reconcile_latency_ms_total >= before.reconcile_latency_ms_total + 7);
}
