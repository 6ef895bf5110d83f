//! 总线接入装配
//!
//! 把消息总线收到的传感器事件交给占用事件流水线，并把流水线结果
//! 映射为确认语义：永久失败（校验、未找到）确认并丢弃，存储故障不确认等待重投。

use park_config::AppConfig;
use park_ingest::{IngestError, MqttSource, MqttSourceConfig, NoopSource, RawEventHandler, Source};
use park_pipeline::{IngestOutcome, OccupancyPipeline, PipelineError};
use park_telemetry::{record_bus_ack, record_bus_nack};
use std::sync::Arc;
use tracing::{info, warn};

/// 总线事件处理器
struct BusHandler {
    pipeline: Arc<OccupancyPipeline>,
}

#[async_trait::async_trait]
impl RawEventHandler for BusHandler {
    async fn handle(&self, event: domain::RawStatusEvent) -> Result<(), IngestError> {
        let result = self.pipeline.ingest(event).await;
        let mapped = map_outcome(result);
        match &mapped {
            Err(err) if !err.should_ack() => record_bus_nack(),
            _ => record_bus_ack(),
        }
        mapped
    }
}

fn map_outcome(result: Result<IngestOutcome, PipelineError>) -> Result<(), IngestError> {
    match result {
        Ok(IngestOutcome::Applied(reconciled)) => {
            info!(
                target: "park.ingest",
                space_id = %reconciled.space.space_id,
                status = reconciled.space.status.as_str(),
                seq = reconciled.event.seq,
                "bus_event_applied"
            );
            Ok(())
        }
        Ok(IngestOutcome::Discarded { hw_id, .. }) => {
            info!(target: "park.ingest", hw_id = %hw_id, "bus_event_discarded");
            Ok(())
        }
        Err(err @ (PipelineError::Validation(_) | PipelineError::NotFound(_))) => {
            Err(IngestError::Rejected(err.to_string()))
        }
        Err(PipelineError::Store(err)) => Err(IngestError::Handler(err.to_string())),
    }
}

/// 启动总线接入任务
///
/// `PARK_INGEST=off` 时使用空接入源，任务立即结束。
pub fn spawn_ingest(
    config: &AppConfig,
    pipeline: Arc<OccupancyPipeline>,
) -> tokio::task::JoinHandle<()> {
    let handler = Arc::new(BusHandler { pipeline });

    let source: Arc<dyn Source> = if config.ingest_enabled {
        let mqtt_config = MqttSourceConfig {
            host: config.mqtt_host.clone(),
            port: config.mqtt_port,
            username: config.mqtt_username.clone(),
            password: config.mqtt_password.clone(),
            client_id: config.mqtt_client_id.clone(),
            topic: config.mqtt_event_topic.clone(),
        };
        info!(
            "ingest source: mqtt {}:{} topic={}",
            mqtt_config.host, mqtt_config.port, mqtt_config.topic
        );
        Arc::new(MqttSource::new(mqtt_config))
    } else {
        info!("ingest source: noop (PARK_INGEST=off)");
        Arc::new(NoopSource)
    };

    tokio::spawn(async move {
        if let Err(err) = source.run(handler).await {
            warn!("ingest stopped: {}", err);
        }
    })
}
