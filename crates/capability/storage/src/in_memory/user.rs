//! 用户内存存储实现
//!
//! 仅用于本地演示和测试。
//!
//! 功能：
//! - 内置 admin 账户（用户名：admin，密码：admin123，角色 admin）
//! - 内置 operator 账户（用户名：operator，密码：operator123，角色 user）
//! - 根据用户名 / 用户 ID 查找用户

use crate::error::StorageError;
use crate::models::UserRecord;
use crate::traits::UserStore;
use domain::permissions::{ROLE_ADMIN, ROLE_USER};
use std::collections::HashMap;
use std::sync::RwLock;

/// 用户内存存储
///
/// 使用 RwLock + HashMap 提供线程安全的内存存储，按用户名索引。
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserStore {
    /// 创建包含默认账户的存储。
    pub fn with_default_users() -> Self {
        let mut users = HashMap::new();
        for (user_id, username, password, role) in [
            ("user-admin", "admin", "admin123", ROLE_ADMIN),
            ("user-operator", "operator", "operator123", ROLE_USER),
        ] {
            users.insert(
                username.to_string(),
                UserRecord {
                    user_id: user_id.to_string(),
                    username: username.to_string(),
                    password: password.to_string(),
                    roles: vec![role.to_string()],
                },
            );
        }
        Self {
            users: RwLock::new(users),
        }
    }
}

#[async_trait::async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StorageError> {
        Ok(self
            .users
            .read()
            .map(|map| map.get(username).cloned())
            .map_err(|_| StorageError::new("lock failed"))?)
    }

    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserRecord>, StorageError> {
        Ok(self
            .users
            .read()
            .map(|map| {
                map.values()
                    .find(|user| user.user_id == user_id)
                    .cloned()
            })
            .map_err(|_| StorageError::new("lock failed"))?)
    }

    async fn update_password_hash(
        &self,
        user_id: &str,
        password_hash: &str,
    ) -> Result<bool, StorageError> {
        let mut map = self
            .users
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        match map.values_mut().find(|user| user.user_id == user_id) {
            Some(user) => {
                user.password = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
