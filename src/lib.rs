//! Chatify Load Core 公共库
//!
//! 提供压测工具共用的配置加载、日志初始化、指标收集和错误类型

pub mod config;
pub mod error;
pub mod metrics;
pub mod tracing;
pub mod utils;

pub use config::{
    ConfigManager, LoadGenAppConfig, LogFormat, LoggingConfig, PushLoadTestServiceConfig, ServicesConfig,
    TargetEndpointConfig, load_config, load_config_from_path, resolve_config,
};
pub use error::*;
pub use utils::*;
