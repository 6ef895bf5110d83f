use crate::{AuthError, AuthTokens};
use domain::ActorContext;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

// 区分 access 与 refresh 的 token 类型。
const ACCESS_TOKEN_TYPE: &str = "access";
const REFRESH_TOKEN_TYPE: &str = "refresh";

#[derive(Debug, Serialize, Deserialize)]
/// JWT 内部 claims。
struct Claims {
    sub: String,
    username: String,
    roles: Vec<String>,
    exp: usize,
    token_type: String,
    jti: String,
}

/// JWT 生成与校验（HS256）。
pub struct JwtManager {
    secret: Vec<u8>,
    access_ttl_seconds: u64,
    refresh_ttl_seconds: u64,
}

impl JwtManager {
    pub fn new(secret: String, access_ttl_seconds: u64, refresh_ttl_seconds: u64) -> Self {
        Self {
            secret: secret.into_bytes(),
            access_ttl_seconds,
            refresh_ttl_seconds,
        }
    }

    /// 基于 ActorContext 签发 access/refresh token。
    pub fn issue_tokens(&self, ctx: &ActorContext) -> Result<AuthTokens, AuthError> {
        let access_token = self.encode(ctx, self.access_ttl_seconds, ACCESS_TOKEN_TYPE)?;
        let refresh_token = self.encode(ctx, self.refresh_ttl_seconds, REFRESH_TOKEN_TYPE)?;
        Ok(AuthTokens {
            access_token,
            refresh_token,
            expires_at: now_epoch_seconds() + self.access_ttl_seconds,
        })
    }

    pub fn decode_access(&self, token: &str) -> Result<ActorContext, AuthError> {
        self.decode(token, ACCESS_TOKEN_TYPE)
    }

    pub fn decode_refresh(&self, token: &str) -> Result<ActorContext, AuthError> {
        self.decode(token, REFRESH_TOKEN_TYPE)
    }

    fn encode(
        &self,
        ctx: &ActorContext,
        ttl_seconds: u64,
        token_type: &str,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            sub: ctx.user_id.clone(),
            username: ctx.username.clone(),
            roles: ctx.roles.clone(),
            exp: (now_epoch_seconds() + ttl_seconds) as usize,
            token_type: token_type.to_string(),
            // 同一秒内签发的 token 也互不相同
            jti: Uuid::new_v4().to_string(),
        };
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|err| AuthError::Internal(err.to_string()))
    }

    /// 解码并校验 token 类型。
    fn decode(&self, token: &str, expected_type: &str) -> Result<ActorContext, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let claims = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.secret),
            &validation,
        )
        .map_err(map_jwt_error)?
        .claims;
        if claims.token_type != expected_type {
            return Err(AuthError::TokenInvalid);
        }
        Ok(ActorContext::new(claims.sub, claims.username, claims.roles))
    }
}

fn now_epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// 将 jwt 库错误映射为业务错误。
fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::TokenInvalid,
    }
}
