use async_trait::async_trait;
use domain::{EventOrigin, EventTarget, RawStatusEvent};
use park_ingest::{
    Delivery, IngestError, RawEventHandler, RetryPolicy, dispatch, dispatch_with_retry,
    parse_sensor_message,
};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

struct RecordingHandler {
    events: Mutex<Vec<RawStatusEvent>>,
    reply: fn() -> Result<(), IngestError>,
}

impl RecordingHandler {
    fn new(reply: fn() -> Result<(), IngestError>) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            reply,
        }
    }

    fn count(&self) -> usize {
        self.events.lock().expect("lock").len()
    }
}

#[async_trait]
impl RawEventHandler for RecordingHandler {
    async fn handle(&self, event: RawStatusEvent) -> Result<(), IngestError> {
        self.events.lock().expect("lock").push(event);
        (self.reply)()
    }
}

#[test]
fn parses_camel_case_payload() {
    let event = parse_sensor_message(br#"{"hwId":"HW-1","status":"occupied"}"#, 42)
        .expect("parse");
    assert_eq!(event.target, EventTarget::Sensor("HW-1".to_string()));
    assert_eq!(event.status, "occupied");
    assert_eq!(event.origin, EventOrigin::Bus);
    assert_eq!(event.received_at_ms, 42);
}

#[test]
fn accepts_snake_case_hw_id_and_missing_fields() {
    let event = parse_sensor_message(br#"{"hw_id":"HW-2"}"#, 0).expect("parse");
    assert_eq!(event.target.id(), "HW-2");
    assert_eq!(event.status, "");

    let event = parse_sensor_message(b"{}", 0).expect("parse");
    assert_eq!(event.target.id(), "");
}

#[test]
fn rejects_non_json_payload() {
    let err = parse_sensor_message(b"not json", 0).expect_err("invalid");
    assert!(matches!(err, IngestError::InvalidPayload(_)));
}

#[tokio::test]
async fn dispatch_acks_after_successful_handling() {
    let handler = RecordingHandler::new(|| Ok(()));
    let ack = dispatch(&handler, br#"{"hwId":"HW-1","status":"free"}"#, 1).await;
    assert!(ack);
    assert_eq!(handler.count(), 1);
}

#[tokio::test]
async fn dispatch_acks_malformed_payload_without_calling_handler() {
    let handler = RecordingHandler::new(|| Ok(()));
    let ack = dispatch(&handler, b"{broken", 1).await;
    assert!(ack);
    assert_eq!(handler.count(), 0);
}

#[tokio::test]
async fn dispatch_acks_permanent_rejection() {
    let handler = RecordingHandler::new(|| Err(IngestError::Rejected("unknown sensor".into())));
    let ack = dispatch(&handler, br#"{"hwId":"HW-9","status":"free"}"#, 1).await;
    assert!(ack);
}

#[tokio::test]
async fn dispatch_leaves_transient_failure_unacked() {
    let handler = RecordingHandler::new(|| Err(IngestError::Handler("store down".into())));
    let ack = dispatch(&handler, br#"{"hwId":"HW-1","status":"free"}"#, 1).await;
    assert!(!ack);
    assert_eq!(handler.count(), 1);
}

/// 前 `failures` 次返回存储类失败，之后成功。
struct FlakyHandler {
    failures: AtomicU32,
    calls: AtomicU32,
}

impl FlakyHandler {
    fn new(failures: u32) -> Self {
        Self {
            failures: AtomicU32::new(failures),
            calls: AtomicU32::new(0),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RawEventHandler for FlakyHandler {
    async fn handle(&self, _event: RawStatusEvent) -> Result<(), IngestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(IngestError::Handler("store down".into()));
        }
        Ok(())
    }
}

fn fast_retry(attempts: u32) -> RetryPolicy {
    RetryPolicy {
        attempts,
        initial_backoff: Duration::from_millis(1),
    }
}

const PAYLOAD: &[u8] = br#"{"hwId":"HW-1","status":"occupied"}"#;

#[tokio::test]
async fn transient_failure_recovers_within_retry_budget() {
    let handler = FlakyHandler::new(2);
    let delivery = dispatch_with_retry(&handler, PAYLOAD, 1, fast_retry(3)).await;
    assert_eq!(delivery, Delivery::Ack);
    assert_eq!(handler.calls(), 3);
}

#[tokio::test]
async fn exhausted_retries_request_redelivery() {
    let handler = FlakyHandler::new(u32::MAX);
    let delivery = dispatch_with_retry(&handler, PAYLOAD, 1, fast_retry(3)).await;
    assert_eq!(delivery, Delivery::Redeliver);
    assert_eq!(handler.calls(), 3);
}

#[tokio::test]
async fn permanent_rejection_is_acked_without_retry() {
    let handler = RecordingHandler::new(|| Err(IngestError::Rejected("unknown sensor".into())));
    let delivery = dispatch_with_retry(&handler, PAYLOAD, 1, fast_retry(3)).await;
    assert_eq!(delivery, Delivery::Ack);
    assert_eq!(handler.count(), 1);
}
