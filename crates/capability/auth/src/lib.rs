//! 认证能力：登录、JWT 生成与校验。
//!
//! 角色只有 `admin` 与 `user` 两种，授权判断在 HTTP 层通过
//! `domain::permissions::authorize` 完成，本模块只负责身份。

mod jwt;
mod password;

use domain::ActorContext;
use park_storage::{UserRecord, UserStore};
use std::sync::Arc;

pub use jwt::JwtManager;
pub use password::{PasswordCheck, hash_password, verify_password_and_maybe_upgrade};

/// 认证相关错误。
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("token expired")]
    TokenExpired,
    #[error("token invalid")]
    TokenInvalid,
    #[error("internal error: {0}")]
    Internal(String),
}

/// 登录/刷新返回的 token 结构。
#[derive(Debug, Clone)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// access token 过期时间（秒级时间戳）。
    pub expires_at: u64,
}

/// 认证服务（基于 UserStore + JWT）。
pub struct AuthService {
    user_store: Arc<dyn UserStore>,
    jwt: JwtManager,
}

impl AuthService {
    pub fn new(user_store: Arc<dyn UserStore>, jwt: JwtManager) -> Self {
        Self { user_store, jwt }
    }

    /// 登录校验并签发 token；历史明文口令在校验通过后升级为 argon2。
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(UserRecord, AuthTokens), AuthError> {
        let user = self
            .user_store
            .find_by_username(username)
            .await
            .map_err(|err| AuthError::Internal(err.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;
        let check = verify_password_and_maybe_upgrade(&user.password, password)?;
        if !check.verified {
            return Err(AuthError::InvalidCredentials);
        }
        if let Some(password_hash) = check.upgrade_hash {
            let updated = self
                .user_store
                .update_password_hash(&user.user_id, &password_hash)
                .await
                .map_err(|err| AuthError::Internal(err.to_string()))?;
            if !updated {
                return Err(AuthError::Internal("password migration update failed".to_string()));
            }
        }
        let tokens = self.jwt.issue_tokens(&user.to_actor_context())?;
        Ok((user, tokens))
    }

    /// 校验 access token 并提取调用方身份。
    pub fn verify_access_token(&self, token: &str) -> Result<ActorContext, AuthError> {
        self.jwt.decode_access(token)
    }

    /// 使用 refresh token 换取新 token，角色以用户当前记录为准。
    pub async fn refresh(&self, token: &str) -> Result<AuthTokens, AuthError> {
        let ctx = self.jwt.decode_refresh(token)?;
        let user = self
            .user_store
            .find_by_id(&ctx.user_id)
            .await
            .map_err(|err| AuthError::Internal(err.to_string()))?
            .ok_or(AuthError::TokenInvalid)?;
        self.jwt.issue_tokens(&user.to_actor_context())
    }
}
