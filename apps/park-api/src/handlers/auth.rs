//! 认证相关 handlers：健康检查、登录、刷新 token
//!
//! ## 公开端点（无需认证）
//! - `GET /health`：存活探针，返回 `{"ok": true}`
//! - `GET /readyz`：就绪探针，Postgres 模式下检查数据库连接
//! - `POST /login`：验证用户名密码后返回 access/refresh token
//! - `POST /refresh-token`：使用 refresh token 换取新 token
//!
//! `expires` 字段为毫秒时间戳。

use crate::AppState;
use crate::utils::response::{auth_error, internal_auth_error, ok};
use api_contract::{LoginRequest, LoginResponse, RefreshTokenRequest, RefreshTokenResponse};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use park_auth::AuthError;

/// 健康检查端点，只反映进程存活。
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

/// Readiness 探针：Postgres 模式下执行一次 `select 1`。
pub async fn readyz(State(state): State<AppState>) -> Response {
    let Some(pool) = state.db_pool.as_ref() else {
        return (StatusCode::OK, Json(serde_json::json!({ "ok": true }))).into_response();
    };

    match sqlx::query_scalar::<_, i32>("select 1").fetch_one(pool).await {
        Ok(_) => (StatusCode::OK, Json(serde_json::json!({ "ok": true }))).into_response(),
        Err(err) => {
            tracing::warn!(target: "park.api", error = %err, "readyz check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "ok": false })),
            )
                .into_response()
        }
    }
}

/// 登录接口
///
/// # Errors
///
/// - `401 UNAUTHORIZED`: 用户名或密码错误
/// - `500 INTERNAL SERVER ERROR`: 认证服务内部错误
pub async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> Response {
    match state.auth.login(&req.username, &req.password).await {
        Ok((user, tokens)) => {
            tracing::info!(target: "park.api", username = %user.username, "login_succeeded");
            ok(LoginResponse {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
                // 秒级转毫秒级
                expires: tokens.expires_at.saturating_mul(1000),
                username: user.username,
                roles: user.roles,
            })
        }
        Err(AuthError::InvalidCredentials) => auth_error(StatusCode::UNAUTHORIZED),
        Err(err) => internal_auth_error(err),
    }
}

/// 刷新 token；角色以用户当前记录为准。
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(req): Json<RefreshTokenRequest>,
) -> Response {
    match state.auth.refresh(&req.refresh_token).await {
        Ok(tokens) => ok(RefreshTokenResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires: tokens.expires_at.saturating_mul(1000),
        }),
        Err(AuthError::TokenInvalid | AuthError::TokenExpired) => {
            auth_error(StatusCode::UNAUTHORIZED)
        }
        Err(err) => internal_auth_error(err),
    }
}
