use park_storage::{AuditLogQuery, AuditLogRecord, AuditLogStore, InMemoryAuditLogStore};
use std::collections::BTreeMap;

fn entry(audit_id: &str, action: &str, ts_ms: i64) -> AuditLogRecord {
    AuditLogRecord {
        audit_id: audit_id.to_string(),
        actor: "user-admin".to_string(),
        action: action.to_string(),
        resource: format!("space:{audit_id}"),
        result: "success".to_string(),
        detail: None,
        old_values: None,
        new_values: None,
        ts_ms,
    }
}

#[tokio::test]
async fn audit_list_filters_and_limits() {
    let store = InMemoryAuditLogStore::new();
    store
        .create_audit_log(entry("a-1", "SPACE.CREATE", 1_000))
        .await
        .expect("create");
    store
        .create_audit_log(entry("a-2", "SPACE.DELETE", 2_000))
        .await
        .expect("create");
    store
        .create_audit_log(entry("a-3", "SPACE.CREATE", 3_000))
        .await
        .expect("create");

    let all = store
        .list_audit_logs(AuditLogQuery::default())
        .await
        .expect("list");
    let ids: Vec<&str> = all.iter().map(|item| item.audit_id.as_str()).collect();
    assert_eq!(ids, vec!["a-3", "a-2", "a-1"]);

    let creates = store
        .list_audit_logs(AuditLogQuery {
            action: Some("SPACE.CREATE".to_string()),
            limit: 1,
            ..AuditLogQuery::default()
        })
        .await
        .expect("list");
    assert_eq!(creates.len(), 1);
    assert_eq!(creates[0].audit_id, "a-3");

    let windowed = store
        .list_audit_logs(AuditLogQuery {
            from_ms: Some(1_500),
            to_ms: Some(2_500),
            ..AuditLogQuery::default()
        })
        .await
        .expect("list");
    assert_eq!(windowed.len(), 1);
    assert_eq!(windowed[0].audit_id, "a-2");
}

#[tokio::test]
async fn purge_removes_entries_older_than_cutoff() {
    let store = InMemoryAuditLogStore::new();
    for (id, ts) in [("a-1", 1_000), ("a-2", 2_000), ("a-3", 3_000)] {
        store
            .create_audit_log(entry(id, "SPACE.CREATE", ts))
            .await
            .expect("create");
    }
    let purged = store.purge_audit_logs_before(2_000).await.expect("purge");
    assert_eq!(purged, 1);
    let remaining = store
        .list_audit_logs(AuditLogQuery::default())
        .await
        .expect("list");
    assert_eq!(remaining.len(), 2);
}

#[tokio::test]
async fn statistics_group_by_action_and_resource_kind() {
    let store = InMemoryAuditLogStore::new();
    store
        .create_audit_log(entry("a-1", "SPACE.CREATE", 1_000))
        .await
        .expect("create");
    store
        .create_audit_log(entry("a-2", "SPACE.CREATE", 2_000))
        .await
        .expect("create");
    store
        .create_audit_log(AuditLogRecord {
            resource: "sensor:s-1".to_string(),
            old_values: Some(r#"{"spaceId":"space-1"}"#.to_string()),
            new_values: Some(r#"{"spaceId":null}"#.to_string()),
            ..entry("a-3", "SENSOR.UPDATE", 3_000)
        })
        .await
        .expect("create");

    let stats = store.audit_statistics(None, None).await.expect("stats");
    assert_eq!(stats.total, 3);
    assert_eq!(
        stats.by_action,
        BTreeMap::from([
            ("SENSOR.UPDATE".to_string(), 1),
            ("SPACE.CREATE".to_string(), 2),
        ])
    );
    assert_eq!(
        stats.by_resource,
        BTreeMap::from([("sensor".to_string(), 1), ("space".to_string(), 2)])
    );

    let windowed = store
        .audit_statistics(Some(1_500), Some(3_000))
        .await
        .expect("stats");
    assert_eq!(windowed.total, 2);
    assert_eq!(windowed.by_action.get("SPACE.CREATE"), Some(&1));

    let logs = store
        .list_audit_logs(AuditLogQuery {
            action: Some("SENSOR.UPDATE".to_string()),
            ..AuditLogQuery::default()
        })
        .await
        .expect("list");
    assert_eq!(logs[0].old_values.as_deref(), Some(r#"{"spaceId":"space-1"}"#));
}
