//! 审计日志写入辅助。
//!
//! 管理端变更操作完成后写入一条审计记录；写入失败只记日志，不影响业务响应。
//! 更新与删除操作通过 [`record_change`] 同时保存变更前后的值。

use crate::AppState;
use domain::ActorContext;
use park_storage::AuditLogRecord;
use serde::Serialize;
use serde_json::Value;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// 变更前后的值；删除操作只有 `old_values`。
#[derive(Debug, Default)]
pub struct ChangeSet {
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
}

impl ChangeSet {
    pub fn new(old: impl Serialize, new: impl Serialize) -> Self {
        Self {
            old_values: snapshot(old),
            new_values: snapshot(new),
        }
    }

    pub fn removed(old: impl Serialize) -> Self {
        Self {
            old_values: snapshot(old),
            new_values: None,
        }
    }
}

fn snapshot(value: impl Serialize) -> Option<Value> {
    serde_json::to_value(value).ok()
}

/// 写入审计日志。`detail` 序列化为 JSON 字符串保存。
pub async fn record_audit(
    state: &AppState,
    ctx: &ActorContext,
    action: &str,
    resource: String,
    result: &str,
    detail: Option<Value>,
) {
    write_audit(state, ctx, action, resource, result, detail, ChangeSet::default()).await;
}

/// 写入一条带变更前后值的审计日志。
pub async fn record_change(
    state: &AppState,
    ctx: &ActorContext,
    action: &str,
    resource: String,
    detail: Option<Value>,
    change: ChangeSet,
) {
    write_audit(state, ctx, action, resource, "success", detail, change).await;
}

async fn write_audit(
    state: &AppState,
    ctx: &ActorContext,
    action: &str,
    resource: String,
    result: &str,
    detail: Option<Value>,
    change: ChangeSet,
) {
    let record = AuditLogRecord {
        audit_id: uuid::Uuid::new_v4().to_string(),
        actor: ctx.username.clone(),
        action: action.to_string(),
        resource,
        result: result.to_string(),
        detail: detail.map(|value| value.to_string()),
        old_values: change.old_values.map(|value| value.to_string()),
        new_values: change.new_values.map(|value| value.to_string()),
        ts_ms: state.clock.now_ms(),
    };
    if let Err(err) = state.audit_log_store.create_audit_log(record).await {
        tracing::warn!(target: "park.api", action, error = %err, "audit_write_failed");
    }
}

/// 保留 `days` 天时的清理截止时间。
pub fn retention_cutoff_ms(now_ms: i64, days: u64) -> i64 {
    let days = i64::try_from(days).unwrap_or(i64::MAX);
    now_ms.saturating_sub(days.saturating_mul(DAY_MS))
}
