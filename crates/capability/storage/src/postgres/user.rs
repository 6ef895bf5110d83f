//! Postgres 用户存储实现
//!
//! 角色以 `text[]` 形式存放在 users 表中。

use crate::error::StorageError;
use crate::models::UserRecord;
use crate::traits::UserStore;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

pub struct PgUserStore {
    pub pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 通过数据库 URL 建立连接池
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = crate::connection::connect_pool(database_url).await?;
        Ok(Self { pool })
    }
}

fn user_from_row(row: &PgRow) -> Result<UserRecord, StorageError> {
    Ok(UserRecord {
        user_id: row.try_get("user_id")?,
        username: row.try_get("username")?,
        password: row.try_get("password_hash")?,
        roles: row.try_get("roles")?,
    })
}

#[async_trait::async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StorageError> {
        let row = sqlx::query(
            "select user_id, username, password_hash, roles from users where username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserRecord>, StorageError> {
        let row = sqlx::query(
            "select user_id, username, password_hash, roles from users where user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn update_password_hash(
        &self,
        user_id: &str,
        password_hash: &str,
    ) -> Result<bool, StorageError> {
        let result = sqlx::query("update users set password_hash = $2 where user_id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
