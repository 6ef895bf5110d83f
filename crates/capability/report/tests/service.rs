use domain::{ManualClock, OccupancyStatus};
use park_report::{ReportError, ReportPatch, ReportService};
use park_storage::{
    InMemoryOccupancyEventStore, InMemoryReportStore, NewOccupancyEvent, OccupancyEventStore,
    ReportStore,
};
use std::sync::Arc;

struct Fixture {
    service: ReportService,
    events: Arc<InMemoryOccupancyEventStore>,
    reports: Arc<InMemoryReportStore>,
    clock: Arc<ManualClock>,
}

fn fixture() -> Fixture {
    let events = Arc::new(InMemoryOccupancyEventStore::new());
    let reports = Arc::new(InMemoryReportStore::new());
    let clock = Arc::new(ManualClock::new(100_000));
    let service = ReportService::new(events.clone(), reports.clone(), clock.clone());
    Fixture {
        service,
        events,
        reports,
        clock,
    }
}

async fn seed(fx: &Fixture, space_id: &str, samples: &[(i64, OccupancyStatus)]) {
    for (index, (ts_ms, status)) in samples.iter().enumerate() {
        fx.events
            .append_event(NewOccupancyEvent {
                event_id: format!("{space_id}-{index}"),
                space_id: space_id.to_string(),
                status: *status,
                ts_ms: *ts_ms,
            })
            .await
            .expect("append");
    }
}

#[tokio::test]
async fn create_report_aggregates_closed_range() {
    let fx = fixture();
    seed(
        &fx,
        "space-1",
        &[
            (0, OccupancyStatus::Free),
            (10_000, OccupancyStatus::Occupied),
            (25_000, OccupancyStatus::Free),
            (40_000, OccupancyStatus::Occupied),
        ],
    )
    .await;
    seed(&fx, "space-2", &[(5_000, OccupancyStatus::Occupied)]).await;

    let report = fx
        .service
        .create_report("space-1", 0, 25_000)
        .await
        .expect("create");
    assert_eq!(report.state_change_count, 2);
    assert_eq!(report.occupied_ms, 10_000);
    assert_eq!(report.created_at_ms, 100_000);
    assert!(report.updated_at_ms.is_none());

    let stored = fx
        .reports
        .find_report(&report.report_id)
        .await
        .expect("find")
        .expect("persisted");
    assert_eq!(stored.occupied_ms, 10_000);
}

#[tokio::test]
async fn unknown_space_yields_zero_report() {
    let fx = fixture();
    let report = fx
        .service
        .create_report("space-404", 0, 60_000)
        .await
        .expect("create");
    assert_eq!(report.state_change_count, 0);
    assert_eq!(report.occupied_ms, 0);
    assert_eq!(fx.service.list_reports().await.expect("list").len(), 1);
}

#[tokio::test]
async fn preview_does_not_persist_and_is_repeatable() {
    let fx = fixture();
    seed(
        &fx,
        "space-1",
        &[(0, OccupancyStatus::Free), (3_000, OccupancyStatus::Occupied)],
    )
    .await;
    let first = fx.service.preview("space-1", 0, 3_000).await.expect("preview");
    let second = fx.service.preview("space-1", 0, 3_000).await.expect("preview");
    assert_eq!(first, second);
    assert_eq!(first.occupied_ms, 3_000);
    assert!(fx.service.list_reports().await.expect("list").is_empty());
}

#[tokio::test]
async fn inverted_range_and_blank_space_are_rejected() {
    let fx = fixture();
    let err = fx
        .service
        .create_report("space-1", 10, 5)
        .await
        .expect_err("inverted");
    assert!(matches!(err, ReportError::InvalidRange { .. }));

    let err = fx
        .service
        .create_report(" ", 0, 5)
        .await
        .expect_err("blank");
    assert!(matches!(err, ReportError::Validation(_)));
}

#[tokio::test]
async fn report_is_a_snapshot() {
    let fx = fixture();
    seed(
        &fx,
        "space-1",
        &[(0, OccupancyStatus::Free), (1_000, OccupancyStatus::Occupied)],
    )
    .await;
    let report = fx
        .service
        .create_report("space-1", 0, 10_000)
        .await
        .expect("create");

    fx.events
        .append_event(NewOccupancyEvent {
            event_id: "late".to_string(),
            space_id: "space-1".to_string(),
            status: OccupancyStatus::Occupied,
            ts_ms: 5_000,
        })
        .await
        .expect("append");

    let stored = fx
        .service
        .find_report(&report.report_id)
        .await
        .expect("find");
    assert_eq!(stored.occupied_ms, 1_000);
}

#[tokio::test]
async fn update_and_soft_delete() {
    let fx = fixture();
    let report = fx
        .service
        .create_report("space-1", 0, 10_000)
        .await
        .expect("create");

    fx.clock.advance(500);
    let updated = fx
        .service
        .update_report(
            &report.report_id,
            ReportPatch {
                occupied_ms: Some(4_000),
                ..ReportPatch::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(updated.occupied_ms, 4_000);
    assert_eq!(updated.end_ms, 10_000);
    assert_eq!(updated.updated_at_ms, Some(100_500));

    let err = fx
        .service
        .update_report(
            &report.report_id,
            ReportPatch {
                start_ms: Some(20_000),
                ..ReportPatch::default()
            },
        )
        .await
        .expect_err("inverted");
    assert!(matches!(err, ReportError::InvalidRange { .. }));

    fx.service
        .delete_report(&report.report_id)
        .await
        .expect("delete");
    let err = fx
        .service
        .find_report(&report.report_id)
        .await
        .expect_err("hidden");
    assert!(matches!(err, ReportError::NotFound(_)));
    let err = fx
        .service
        .delete_report(&report.report_id)
        .await
        .expect_err("already deleted");
    assert!(matches!(err, ReportError::NotFound(_)));
}
