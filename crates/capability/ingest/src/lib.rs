//! 事件接入（消息总线侧）
//!
//! 订阅 `sensor/event`，把 `{hwId,status}` 报文解析为 [`RawStatusEvent`]
//! 交给 [`RawEventHandler`]。MQTT 使用 QoS1 + 手动 ack：处理完成后才确认。
//! 可重试失败先在进程内按 [`RetryPolicy`] 退避重试；仍失败则不确认并主动断开，
//! 持久会话恢复后由 broker 重投。

use async_trait::async_trait;
use domain::{Clock, EventOrigin, EventTarget, RawStatusEvent, SystemClock};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 接入错误。
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    /// 处理器判定为永久失败（校验、未找到）。
    #[error("rejected: {0}")]
    Rejected(String),
    /// 处理器临时失败（存储故障），消息需要重投。
    #[error("handler error: {0}")]
    Handler(String),
    #[error("source error: {0}")]
    Source(String),
}

impl IngestError {
    /// 是否确认该消息。只有临时失败保持未确认。
    pub fn should_ack(&self) -> bool {
        !matches!(self, IngestError::Handler(_))
    }
}

/// 原始事件处理器。
#[async_trait]
pub trait RawEventHandler: Send + Sync {
    async fn handle(&self, event: RawStatusEvent) -> Result<(), IngestError>;
}

/// 接入源抽象。
#[async_trait]
pub trait Source: Send + Sync {
    async fn run(&self, handler: Arc<dyn RawEventHandler>) -> Result<(), IngestError>;
}

/// 空接入源（关闭总线接入时使用）。
#[derive(Debug, Default)]
pub struct NoopSource;

#[async_trait]
impl Source for NoopSource {
    async fn run(&self, _handler: Arc<dyn RawEventHandler>) -> Result<(), IngestError> {
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SensorMessage {
    #[serde(alias = "hw_id")]
    hw_id: Option<String>,
    status: Option<String>,
}

/// 解析总线报文 `{hwId,status}`。
///
/// 字段缺失时保留空串，交由流水线做统一校验。
pub fn parse_sensor_message(
    payload: &[u8],
    received_at_ms: i64,
) -> Result<RawStatusEvent, IngestError> {
    let message: SensorMessage = serde_json::from_slice(payload)
        .map_err(|err| IngestError::InvalidPayload(err.to_string()))?;
    Ok(RawStatusEvent {
        target: EventTarget::Sensor(message.hw_id.unwrap_or_default()),
        status: message.status.unwrap_or_default(),
        origin: EventOrigin::Bus,
        received_at_ms,
    })
}

/// 解析并分发一条报文，返回是否应当确认。
pub async fn dispatch(
    handler: &dyn RawEventHandler,
    payload: &[u8],
    received_at_ms: i64,
) -> bool {
    let event = match parse_sensor_message(payload, received_at_ms) {
        Ok(event) => event,
        Err(err) => {
            warn!(target: "park.ingest", error = %err, "payload_rejected");
            return true;
        }
    };
    debug!(
        target: "park.ingest",
        hw_id = %event.target.id(),
        status = %event.status,
        "raw_event_received"
    );
    match handler.handle(event).await {
        Ok(()) => true,
        Err(err) => {
            let ack = err.should_ack();
            warn!(target: "park.ingest", error = %err, ack, "raw_event_failed");
            ack
        }
    }
}

/// 可重试失败的进程内重试策略（每次等待时间翻倍）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_backoff: Duration::from_millis(200),
        }
    }
}

/// 单条报文处理后的投递决定。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// 确认，broker 不再投递。
    Ack,
    /// 不确认并断开连接，恢复会话后由 broker 重投。
    Redeliver,
}

/// 带重试的分发：确认即返回；不确认时按策略退避后重试，耗尽后要求重投。
pub async fn dispatch_with_retry(
    handler: &dyn RawEventHandler,
    payload: &[u8],
    received_at_ms: i64,
    policy: RetryPolicy,
) -> Delivery {
    let mut backoff = policy.initial_backoff;
    for attempt in 1..=policy.attempts.max(1) {
        if dispatch(handler, payload, received_at_ms).await {
            return Delivery::Ack;
        }
        if attempt < policy.attempts {
            debug!(
                target: "park.ingest",
                attempt,
                backoff_ms = backoff.as_millis() as u64,
                "dispatch_retry"
            );
            tokio::time::sleep(backoff).await;
            backoff = backoff.saturating_mul(2);
        }
    }
    Delivery::Redeliver
}

/// MQTT 接入源配置。
#[derive(Debug, Clone)]
pub struct MqttSourceConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: String,
    pub topic: String,
}

/// MQTT 接入源。
pub struct MqttSource {
    config: MqttSourceConfig,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

impl MqttSource {
    pub fn new(config: MqttSourceConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: MqttSourceConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            retry: RetryPolicy::default(),
        }
    }

    pub fn config(&self) -> &MqttSourceConfig {
        &self.config
    }

    fn options(&self) -> rumqttc::MqttOptions {
        let mut options = rumqttc::MqttOptions::new(
            self.config.client_id.clone(),
            self.config.host.clone(),
            self.config.port,
        );
        options.set_keep_alive(Duration::from_secs(30));
        options.set_clean_session(false);
        options.set_manual_acks(true);
        if let (Some(username), Some(password)) =
            (self.config.username.as_ref(), self.config.password.as_ref())
        {
            options.set_credentials(username, password);
        }
        options
    }
}

const RECONNECT_DELAY: Duration = Duration::from_secs(2);

#[async_trait]
impl Source for MqttSource {
    async fn run(&self, handler: Arc<dyn RawEventHandler>) -> Result<(), IngestError> {
        let (client, mut eventloop) = rumqttc::AsyncClient::new(self.options(), 10);
        loop {
            match eventloop.poll().await {
                Ok(rumqttc::Event::Incoming(rumqttc::Packet::ConnAck(_))) => {
                    // 每次（重新）连接后都订阅一次
                    client
                        .subscribe(self.config.topic.clone(), rumqttc::QoS::AtLeastOnce)
                        .await
                        .map_err(|err| IngestError::Source(err.to_string()))?;
                    info!(target: "park.ingest", topic = %self.config.topic, "mqtt_subscribed");
                }
                Ok(rumqttc::Event::Incoming(rumqttc::Packet::Publish(publish))) => {
                    if publish.topic != self.config.topic {
                        debug!(target: "park.ingest", topic = %publish.topic, "mqtt_topic_skipped");
                        continue;
                    }
                    let delivery = dispatch_with_retry(
                        handler.as_ref(),
                        &publish.payload,
                        self.clock.now_ms(),
                        self.retry,
                    )
                    .await;
                    match delivery {
                        Delivery::Ack => client
                            .ack(&publish)
                            .await
                            .map_err(|err| IngestError::Source(err.to_string()))?,
                        Delivery::Redeliver => {
                            // 连接保持时 broker 不会重发未确认的报文，断开后由重连恢复会话
                            warn!(
                                target: "park.ingest",
                                pkid = publish.pkid,
                                "mqtt_session_resume_for_redelivery"
                            );
                            client
                                .disconnect()
                                .await
                                .map_err(|err| IngestError::Source(err.to_string()))?;
                        }
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(target: "park.ingest", error = %err, "mqtt_connection_lost");
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }
}
