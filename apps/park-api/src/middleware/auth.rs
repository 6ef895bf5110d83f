//! 认证和授权中间件
//!
//! 提供以下中间件和辅助函数：
//! - request_context：请求上下文中间件，注入 request_id/trace_id
//! - bearer_token：从 Authorization 头提取 Bearer token
//! - require_actor：验证 access token 并提取调用方身份
//! - require_roles：验证 token 后按角色授权
//!
//! 认证流程：
//! 1. request_context：在所有请求前注入追踪 ID
//! 2. bearer_token：从请求头提取 token
//! 3. require_actor：验证 JWT 签名，获取 ActorContext
//! 4. require_roles：调用 `domain::permissions::authorize` 判定角色

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::Response,
};
use domain::ActorContext;
use domain::permissions::{Access, authorize};
use park_auth::AuthError;
use park_telemetry::new_request_ids;
use tracing::{Instrument, info_span};

use crate::AppState;
use crate::utils::response::{auth_error, forbidden_error, internal_auth_error};

/// 请求上下文中间件：注入 request_id/trace_id
pub async fn request_context(mut req: Request<Body>, next: Next) -> Response {
    let ids = new_request_ids();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    req.extensions_mut().insert(ids.clone());

    let span = info_span!(
        "request",
        request_id = %ids.request_id,
        trace_id = %ids.trace_id,
        method = %method,
        path = %path
    );

    let mut response = next.run(req).instrument(span).await;
    for (name, value) in [("x-request-id", &ids.request_id), ("x-trace-id", &ids.trace_id)] {
        if let Ok(value) = HeaderValue::from_str(value) {
            response.headers_mut().insert(name, value);
        }
    }
    response
}

/// 从请求头中提取 Bearer token
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header_value = headers.get(header::AUTHORIZATION)?;
    let auth_str = header_value.to_str().ok()?;
    auth_str.strip_prefix("Bearer ")
}

/// 验证 access token 并提取调用方身份
pub fn require_actor(state: &AppState, headers: &HeaderMap) -> Result<ActorContext, Response> {
    let token = bearer_token(headers).ok_or_else(|| auth_error(StatusCode::UNAUTHORIZED))?;
    match state.auth.verify_access_token(token) {
        Ok(ctx) => Ok(ctx),
        Err(AuthError::TokenInvalid | AuthError::TokenExpired) => {
            Err(auth_error(StatusCode::UNAUTHORIZED))
        }
        Err(err) => Err(internal_auth_error(err)),
    }
}

/// 验证身份并要求持有 `required` 中任一角色（为空表示任意已登录用户）
pub fn require_roles(
    state: &AppState,
    headers: &HeaderMap,
    required: &[&str],
) -> Result<ActorContext, Response> {
    let ctx = require_actor(state, headers)?;
    match authorize(&ctx.roles, required) {
        Access::Allow => Ok(ctx),
        Access::Deny => Err(forbidden_error()),
    }
}
