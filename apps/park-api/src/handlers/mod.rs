//! Handlers 模块

pub mod audit;
pub mod auth;
pub mod metrics;
pub mod occupancy;
pub mod reports;
pub mod sensors;
pub mod spaces;
