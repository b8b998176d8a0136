//! # 日志初始化模块
//!
//! 为压测工具提供统一的 tracing-subscriber 初始化，支持文本和 JSON 两种输出。

use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LogFormat, LoggingConfig};

/// 构建日志过滤器：RUST_LOG 优先，否则使用配置中的级别
fn build_env_filter(logging_config: Option<&LoggingConfig>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = logging_config.map(|c| c.level.as_str()).unwrap_or("info");
        EnvFilter::try_new(level).unwrap_or_else(|err| {
            eprintln!("invalid log level '{level}': {err}, falling back to info");
            EnvFilter::new("info")
        })
    })
}

/// 从配置初始化日志系统
///
/// `logging_config` 为 None 时使用默认配置（info 级别、文本输出）。
/// 全局订阅者已存在时返回 false，不会覆盖之前的初始化。
///
/// # 示例
/// ```rust,ignore
/// use chatify_load_core::config::{LogFormat, LoggingConfig};
/// use chatify_load_core::tracing::init_tracing_from_config;
///
/// let config = LoggingConfig {
///     level: "chatify_push_loadtest=debug,info".to_string(),
///     format: LogFormat::Json,
///     ..LoggingConfig::default()
/// };
/// init_tracing_from_config(Some(&config));
/// ```
pub fn init_tracing_from_config(logging_config: Option<&LoggingConfig>) -> bool {
    let env_filter = build_env_filter(logging_config);

    let default_config = LoggingConfig::default();
    let config = logging_config.unwrap_or(&default_config);

    let builder = fmt::Subscriber::builder()
        .with_target(config.with_target)
        .with_thread_ids(config.with_thread_ids)
        .with_file(config.with_file)
        .with_line_number(config.with_line_number)
        .with_env_filter(env_filter);

    let result = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
    };
    result.is_ok()
}
