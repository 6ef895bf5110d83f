//! 输入验证辅助函数
//!
//! - normalize_required：必填字段，去除空格并检查非空
//! - normalize_optional：可选字段，提供时去除空格并检查非空
//! - parse_status_strict：管理端输入的状态必须是 free/occupied/unknown 之一
//! - parse_sensor_kind：传感器类型
//! - validate_region：区域坐标左上角不得越过右下角
//!
//! 失败统一返回 `bad_request_error` 响应。

use crate::utils::response::bad_request_error;
use api_contract::SpaceRegionDto;
use axum::response::Response;
use domain::{OccupancyStatus, SensorKind};

/// 验证必填字段，去除空格并检查非空
pub fn normalize_required(value: Option<String>, field: &str) -> Result<String, Response> {
    let value = value.unwrap_or_default();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(bad_request_error(format!("{field} required")));
    }
    Ok(trimmed.to_string())
}

/// 验证可选字段，如果提供则去除空格并检查非空
pub fn normalize_optional(value: Option<String>, field: &str) -> Result<Option<String>, Response> {
    match value {
        Some(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(bad_request_error(format!("{field} required")));
            }
            Ok(Some(trimmed.to_string()))
        }
        None => Ok(None),
    }
}

/// 严格解析状态（大小写不敏感），不做 unknown 兜底
pub fn parse_status_strict(value: Option<String>) -> Result<OccupancyStatus, Response> {
    let value = normalize_required(value, "status")?;
    OccupancyStatus::parse(&value.to_ascii_lowercase())
        .ok_or_else(|| bad_request_error(format!("invalid status: {value}")))
}

/// 解析传感器类型；未提供时返回 None，由调用方决定默认值
pub fn parse_sensor_kind(value: Option<String>) -> Result<Option<SensorKind>, Response> {
    match normalize_optional(value, "kind")? {
        Some(value) => SensorKind::parse(&value)
            .map(Some)
            .ok_or_else(|| bad_request_error(format!("invalid sensor kind: {value}"))),
        None => Ok(None),
    }
}

/// 验证区域坐标
pub fn validate_region(region: Option<SpaceRegionDto>) -> Result<Option<SpaceRegionDto>, Response> {
    match region {
        Some(region) if region.x1 > region.x2 || region.y1 > region.y2 => Err(bad_request_error(
            "region must satisfy x1 <= x2 and y1 <= y2",
        )),
        other => Ok(other),
    }
}
