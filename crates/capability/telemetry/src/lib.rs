//! 追踪、请求 ID 生成与进程内计数指标。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 指标快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub raw_events_http: u64,
    pub raw_events_bus: u64,
    pub occupancy_applied: u64,
    pub discarded_unassigned: u64,
    pub rejected_validation: u64,
    pub rejected_not_found: u64,
    pub store_failures: u64,
    pub bus_acks: u64,
    pub bus_nacks: u64,
    pub reports_created: u64,
    pub audit_purged: u64,
    pub reconcile_latency_ms_total: u64,
    pub reconcile_latency_ms_count: u64,
}

/// 进程级计数指标。
pub struct TelemetryMetrics {
    raw_events_http: AtomicU64,
    raw_events_bus: AtomicU64,
    occupancy_applied: AtomicU64,
    discarded_unassigned: AtomicU64,
    rejected_validation: AtomicU64,
    rejected_not_found: AtomicU64,
    store_failures: AtomicU64,
    bus_acks: AtomicU64,
    bus_nacks: AtomicU64,
    reports_created: AtomicU64,
    audit_purged: AtomicU64,
    reconcile_latency_ms_total: AtomicU64,
    reconcile_latency_ms_count: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            raw_events_http: AtomicU64::new(0),
            raw_events_bus: AtomicU64::new(0),
            occupancy_applied: AtomicU64::new(0),
            discarded_unassigned: AtomicU64::new(0),
            rejected_validation: AtomicU64::new(0),
            rejected_not_found: AtomicU64::new(0),
            store_failures: AtomicU64::new(0),
            bus_acks: AtomicU64::new(0),
            bus_nacks: AtomicU64::new(0),
            reports_created: AtomicU64::new(0),
            audit_purged: AtomicU64::new(0),
            reconcile_latency_ms_total: AtomicU64::new(0),
            reconcile_latency_ms_count: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            raw_events_http: self.raw_events_http.load(Ordering::Relaxed),
            raw_events_bus: self.raw_events_bus.load(Ordering::Relaxed),
            occupancy_applied: self.occupancy_applied.load(Ordering::Relaxed),
            discarded_unassigned: self.discarded_unassigned.load(Ordering::Relaxed),
            rejected_validation: self.rejected_validation.load(Ordering::Relaxed),
            rejected_not_found: self.rejected_not_found.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            bus_acks: self.bus_acks.load(Ordering::Relaxed),
            bus_nacks: self.bus_nacks.load(Ordering::Relaxed),
            reports_created: self.reports_created.load(Ordering::Relaxed),
            audit_purged: self.audit_purged.load(Ordering::Relaxed),
            reconcile_latency_ms_total: self.reconcile_latency_ms_total.load(Ordering::Relaxed),
            reconcile_latency_ms_count: self.reconcile_latency_ms_count.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录 HTTP 通道收到的原始事件。
pub fn record_raw_event_http() {
    metrics().raw_events_http.fetch_add(1, Ordering::Relaxed);
}

/// 记录 MQTT 通道收到的原始事件。
pub fn record_raw_event_bus() {
    metrics().raw_events_bus.fetch_add(1, Ordering::Relaxed);
}

/// 记录已落库的占用事件。
pub fn record_occupancy_applied() {
    metrics().occupancy_applied.fetch_add(1, Ordering::Relaxed);
}

/// 记录因传感器未绑定车位而丢弃的事件。
pub fn record_discarded_unassigned() {
    metrics()
        .discarded_unassigned
        .fetch_add(1, Ordering::Relaxed);
}

pub fn record_rejected_validation() {
    metrics()
        .rejected_validation
        .fetch_add(1, Ordering::Relaxed);
}

pub fn record_rejected_not_found() {
    metrics().rejected_not_found.fetch_add(1, Ordering::Relaxed);
}

/// 记录存储失败（可重试）。
pub fn record_store_failure() {
    metrics().store_failures.fetch_add(1, Ordering::Relaxed);
}

pub fn record_bus_ack() {
    metrics().bus_acks.fetch_add(1, Ordering::Relaxed);
}

/// 记录未确认的 MQTT 消息（等待重投）。
pub fn record_bus_nack() {
    metrics().bus_nacks.fetch_add(1, Ordering::Relaxed);
}

pub fn record_report_created() {
    metrics().reports_created.fetch_add(1, Ordering::Relaxed);
}

/// 记录清理的审计日志条数。
pub fn record_audit_purged(count: u64) {
    metrics().audit_purged.fetch_add(count, Ordering::Relaxed);
}

/// 记录状态协调耗时（毫秒，含等待车位锁）。
pub fn record_reconcile_latency_ms(latency_ms: u64) {
    let metrics = metrics();
    metrics
        .reconcile_latency_ms_total
        .fetch_add(latency_ms, Ordering::Relaxed);
    metrics
        .reconcile_latency_ms_count
        .fetch_add(1, Ordering::Relaxed);
}
