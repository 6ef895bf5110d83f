//! Handler 共用辅助函数。

pub mod audit;
pub mod response;
pub mod validation;

pub use validation::*;
