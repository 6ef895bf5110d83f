//! 数据库连接管理
//!
//! 提供数据库连接池初始化功能：
//! - connect_pool：建立 Postgres 连接池
//! - run_migrations：执行内置建表脚本
//!
//! 设计原则：
//! - 最大连接数限制为 8
//! - 建表脚本幂等（`create ... if not exists`），可在每次启动时执行

use crate::error::StorageError;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

const SCHEMA_SQL: &str = include_str!("../migrations/0001_parking.sql");

/// 建立 Postgres 连接池
///
/// 从数据库 URL 创建连接池，最大连接数限制为 8。
pub async fn connect_pool(database_url: &str) -> Result<PgPool, StorageError> {
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// 执行建表脚本
///
/// 脚本包含多条语句，使用 simple query 协议一次提交。
pub async fn run_migrations(pool: &PgPool) -> Result<(), StorageError> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}
