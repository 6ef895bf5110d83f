use park_storage::{InMemoryReportStore, ReportRecord, ReportStore, ReportUpdate};

fn report(report_id: &str, created_at_ms: i64) -> ReportRecord {
    ReportRecord {
        report_id: report_id.to_string(),
        space_id: "space-1".to_string(),
        start_ms: 0,
        end_ms: 30_000,
        state_change_count: 2,
        occupied_ms: 15_000,
        deleted: false,
        created_at_ms,
        updated_at_ms: None,
    }
}

#[tokio::test]
async fn reports_list_newest_first() {
    let store = InMemoryReportStore::new();
    store.create_report(report("r-1", 1_000)).await.expect("create");
    store.create_report(report("r-2", 2_000)).await.expect("create");

    let list = store.list_reports().await.expect("list");
    let ids: Vec<&str> = list.iter().map(|item| item.report_id.as_str()).collect();
    assert_eq!(ids, vec!["r-2", "r-1"]);
}

#[tokio::test]
async fn soft_deleted_reports_are_hidden() {
    let store = InMemoryReportStore::new();
    store.create_report(report("r-1", 1_000)).await.expect("create");

    assert!(store.soft_delete_report("r-1", 5_000).await.expect("delete"));
    assert!(store.find_report("r-1").await.expect("find").is_none());
    assert!(store.list_reports().await.expect("list").is_empty());
    assert!(!store.soft_delete_report("r-1", 6_000).await.expect("delete"));

    let updated = store
        .update_report(
            "r-1",
            ReportUpdate {
                start_ms: None,
                end_ms: None,
                state_change_count: Some(9),
                occupied_ms: None,
                updated_at_ms: 7_000,
            },
        )
        .await
        .expect("update");
    assert!(updated.is_none());
}

#[tokio::test]
async fn partial_update_keeps_other_fields() {
    let store = InMemoryReportStore::new();
    store.create_report(report("r-1", 1_000)).await.expect("create");

    let updated = store
        .update_report(
            "r-1",
            ReportUpdate {
                start_ms: None,
                end_ms: Some(40_000),
                state_change_count: None,
                occupied_ms: Some(20_000),
                updated_at_ms: 3_000,
            },
        )
        .await
        .expect("update")
        .expect("exists");
    assert_eq!(updated.start_ms, 0);
    assert_eq!(updated.end_ms, 40_000);
    assert_eq!(updated.state_change_count, 2);
    assert_eq!(updated.occupied_ms, 20_000);
    assert_eq!(updated.updated_at_ms, Some(3_000));
}

#[tokio::test]
async fn inverted_range_is_rejected() {
    let store = InMemoryReportStore::new();
    let mut record = report("r-1", 1_000);
    record.start_ms = 10;
    record.end_ms = 5;
    assert!(store.create_report(record).await.is_err());

    store.create_report(report("r-2", 1_000)).await.expect("create");
    let result = store
        .update_report(
            "r-2",
            ReportUpdate {
                start_ms: Some(50_000),
                end_ms: None,
                state_change_count: None,
                occupied_ms: None,
                updated_at_ms: 2_000,
            },
        )
        .await;
    assert!(result.is_err());
}
