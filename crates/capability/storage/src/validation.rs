//! 验证辅助函数
//!
//! 写入前的数据一致性校验，内存实现与 Postgres 实现共用：
//! - ensure_not_blank：必填字段非空
//! - ensure_space_code：车位编号格式（`A-01` ~ `Z-99`）
//! - ensure_time_range：区间起止顺序

use crate::error::StorageError;
use domain::space_code::is_valid_space_code;

/// 验证字段非空
pub fn ensure_not_blank(field: &str, value: &str) -> Result<(), StorageError> {
    if value.trim().is_empty() {
        return Err(StorageError::new(format!("{field} required")));
    }
    Ok(())
}

/// 验证车位编号格式
pub fn ensure_space_code(space_code: &str) -> Result<(), StorageError> {
    if !is_valid_space_code(space_code) {
        return Err(StorageError::new(format!("invalid space code: {space_code}")));
    }
    Ok(())
}

/// 验证区间起止顺序
pub fn ensure_time_range(start_ms: i64, end_ms: i64) -> Result<(), StorageError> {
    if start_ms > end_ms {
        return Err(StorageError::new("start must not be after end"));
    }
    Ok(())
}
