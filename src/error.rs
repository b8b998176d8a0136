//! Chatify Load Core 错误模块
//!
//! - 统一压测工具启动阶段的错误分类
//! - 传输和序列化错误不在这里，它们只影响单次迭代，记录在 Outcome 中

use thiserror::Error;

/// 压测工具错误类型
///
/// 两类错误都在压测开始前产生并终止启动
#[derive(Debug, Error)]
pub enum LoadGenError {
    /// 配置错误（目标地址非法、虚拟用户数为 0 等）
    #[error("Configuration error: {0}")]
    Config(String),

    /// 载荷生成前提不满足（语料为空、字母表为空等）
    #[error("Generation error: {0}")]
    Generation(String),
}

/// 压测工具统一结果类型
pub type Result<T, E = LoadGenError> = std::result::Result<T, E>;

/// 便捷宏：构造配置错误并提前返回
#[macro_export]
macro_rules! bail_config {
    ($($arg:tt)*) => {
        return Err($crate::error::LoadGenError::Config(format!($($arg)*)))
    };
}

/// 便捷宏：条件不满足时返回配置错误
#[macro_export]
macro_rules! ensure_config {
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            $crate::bail_config!($($arg)*);
        }
    };
}
