//! 工具函数模块
//!
//! 提供时间戳获取等通用工具函数

pub mod helpers;

pub use helpers::ServiceHelper;

use chrono::Utc;

/// 获取当前时间戳（秒）
pub fn current_seconds() -> i64 {
    Utc::now().timestamp()
}
