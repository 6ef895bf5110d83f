//! 车位占用服务入口：HTTP API + MQTT 事件接入。
//!
//! 启动顺序：加载配置 -> 初始化日志 -> 选择存储后端 -> 装配流水线与报表服务
//! -> 启动总线接入与审计清理任务 -> 监听 HTTP。

mod handlers;
mod ingest;
mod middleware;
mod routes;
mod utils;

#[cfg(test)]
mod tests;

use axum::{Router, middleware as axum_middleware};
use domain::{Clock, SystemClock};
use park_auth::{AuthService, JwtManager};
use park_config::{AppConfig, StorageMode};
use park_pipeline::{OccupancyPipeline, PipelineStores};
use park_report::ReportService;
use park_storage::{
    AuditLogStore, InMemoryAuditLogStore, InMemoryOccupancyEventStore, InMemoryReportStore,
    InMemorySensorPresenceStore, InMemorySensorStore, InMemorySpaceStore, InMemoryUserStore,
    OccupancyEventStore, PgAuditLogStore, PgOccupancyEventStore, PgReportStore, PgSensorStore,
    PgSpaceStore, PgUserStore, RedisSensorPresenceStore, ReportStore, SensorPresenceStore,
    SensorStore, SpaceStore, UserStore, connect_pool, run_migrations,
};
use park_telemetry::init_tracing;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// 全部存储实现。
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub spaces: Arc<dyn SpaceStore>,
    pub sensors: Arc<dyn SensorStore>,
    pub events: Arc<dyn OccupancyEventStore>,
    pub reports: Arc<dyn ReportStore>,
    pub audit_logs: Arc<dyn AuditLogStore>,
    pub presence: Arc<dyn SensorPresenceStore>,
}

impl Stores {
    /// 进程内存储（测试与 `PARK_STORAGE=memory`）。
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserStore::with_default_users()),
            spaces: Arc::new(InMemorySpaceStore::new()),
            sensors: Arc::new(InMemorySensorStore::new()),
            events: Arc::new(InMemoryOccupancyEventStore::new()),
            reports: Arc::new(InMemoryReportStore::new()),
            audit_logs: Arc::new(InMemoryAuditLogStore::new()),
            presence: Arc::new(InMemorySensorPresenceStore::new()),
        }
    }

    /// Postgres 存储；在线状态仍在进程内，由调用方按需替换为 Redis。
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            users: Arc::new(PgUserStore::new(pool.clone())),
            spaces: Arc::new(PgSpaceStore::new(pool.clone())),
            sensors: Arc::new(PgSensorStore::new(pool.clone())),
            events: Arc::new(PgOccupancyEventStore::new(pool.clone())),
            reports: Arc::new(PgReportStore::new(pool.clone())),
            audit_logs: Arc::new(PgAuditLogStore::new(pool.clone())),
            presence: Arc::new(InMemorySensorPresenceStore::new()),
        }
    }
}

/// 应用共享状态。
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub space_store: Arc<dyn SpaceStore>,
    pub sensor_store: Arc<dyn SensorStore>,
    pub event_store: Arc<dyn OccupancyEventStore>,
    pub audit_log_store: Arc<dyn AuditLogStore>,
    pub presence_store: Arc<dyn SensorPresenceStore>,
    pub pipeline: Arc<OccupancyPipeline>,
    pub reports: Arc<ReportService>,
    pub clock: Arc<dyn Clock>,
    /// 传感器在线判定窗口（毫秒）。
    pub presence_ttl_ms: i64,
    /// 仅 Postgres 模式下存在，用于 readyz。
    pub db_pool: Option<PgPool>,
}

impl AppState {
    pub fn new(
        stores: Stores,
        jwt: JwtManager,
        clock: Arc<dyn Clock>,
        presence_ttl_seconds: u64,
        db_pool: Option<PgPool>,
    ) -> Self {
        let pipeline = OccupancyPipeline::new(
            PipelineStores {
                spaces: stores.spaces.clone(),
                sensors: stores.sensors.clone(),
                events: stores.events.clone(),
                presence: stores.presence.clone(),
            },
            clock.clone(),
        );
        let reports = ReportService::new(stores.events.clone(), stores.reports, clock.clone());
        Self {
            auth: Arc::new(AuthService::new(stores.users, jwt)),
            space_store: stores.spaces,
            sensor_store: stores.sensors,
            event_store: stores.events,
            audit_log_store: stores.audit_logs,
            presence_store: stores.presence,
            pipeline: Arc::new(pipeline),
            reports: Arc::new(reports),
            clock,
            presence_ttl_ms: i64::try_from(presence_ttl_seconds.saturating_mul(1000))
                .unwrap_or(i64::MAX),
            db_pool,
        }
    }
}

/// 组装完整路由：同一组接口同时挂在 `/` 与 `/api` 下。
pub fn build_app(state: AppState) -> Router {
    let api = routes::create_api_router();
    Router::new()
        .merge(api.clone())
        .nest("/api", api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(middleware::request_context))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    init_tracing();

    let (mut stores, db_pool) = match config.storage {
        StorageMode::Postgres => {
            let database_url = config.database_url.as_deref().unwrap_or_default();
            let pool = connect_pool(database_url).await?;
            run_migrations(&pool).await?;
            info!("storage: postgres");
            (Stores::postgres(&pool), Some(pool))
        }
        StorageMode::Memory => {
            info!("storage: memory");
            (Stores::in_memory(), None)
        }
    };
    if let Some(redis_url) = config.redis_url.as_deref() {
        stores.presence = Arc::new(RedisSensorPresenceStore::connect(
            redis_url,
            config.sensor_presence_ttl_seconds,
        )?);
        info!("sensor presence: redis");
    }

    let jwt = JwtManager::new(
        config.jwt_secret.clone(),
        config.jwt_access_ttl_seconds,
        config.jwt_refresh_ttl_seconds,
    );
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = AppState::new(
        stores,
        jwt,
        clock,
        config.sensor_presence_ttl_seconds,
        db_pool,
    );

    let _ingest_handle = ingest::spawn_ingest(&config, state.pipeline.clone());
    if let Some(days) = config.audit_retention_days {
        spawn_audit_purge(state.clone(), days);
    }

    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!("http listening on {}", config.http_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

const AUDIT_PURGE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// 每日清理过期审计日志。
fn spawn_audit_purge(state: AppState, retention_days: u64) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(AUDIT_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let cutoff_ms = utils::audit::retention_cutoff_ms(state.clock.now_ms(), retention_days);
            match state.audit_log_store.purge_audit_logs_before(cutoff_ms).await {
                Ok(deleted) => {
                    park_telemetry::record_audit_purged(deleted);
                    info!(target: "park.api", deleted, cutoff_ms, "audit_purged");
                }
                Err(err) => warn!(target: "park.api", error = %err, "audit_purge_failed"),
            }
        }
    })
}
