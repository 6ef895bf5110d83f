//! 口令哈希与校验。
//!
//! 新口令统一存为 argon2 PHC 字符串；不以 `$argon2` 开头的存量值视为历史明文，
//! 以常量时间比较校验，通过后返回升级用的新哈希。

use crate::AuthError;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand_core::OsRng;
use subtle::ConstantTimeEq;

const ARGON2_PREFIX: &str = "$argon2";

/// 口令校验结果。
#[derive(Debug)]
pub struct PasswordCheck {
    pub verified: bool,
    /// 需要写回存储的新哈希（仅历史明文校验通过时存在）。
    pub upgrade_hash: Option<String>,
}

impl PasswordCheck {
    fn rejected() -> Self {
        Self {
            verified: false,
            upgrade_hash: None,
        }
    }
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthError::Internal(err.to_string()))
}

pub fn verify_password_and_maybe_upgrade(
    stored: &str,
    password: &str,
) -> Result<PasswordCheck, AuthError> {
    if stored.starts_with(ARGON2_PREFIX) {
        let parsed =
            PasswordHash::new(stored).map_err(|err| AuthError::Internal(err.to_string()))?;
        let verified = Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok();
        return Ok(PasswordCheck {
            verified,
            upgrade_hash: None,
        });
    }

    let matches: bool = stored.as_bytes().ct_eq(password.as_bytes()).into();
    if !matches {
        return Ok(PasswordCheck::rejected());
    }
    Ok(PasswordCheck {
        verified: true,
        upgrade_hash: Some(hash_password(password)?),
    })
}
