//! 启动辅助函数

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::{ConfigManager, LoadGenAppConfig, default_config_source, load_config};
use crate::tracing::init_tracing_from_config;

/// 压测工具启动辅助函数
pub struct ServiceHelper;

impl ServiceHelper {
    /// 加载配置、初始化日志并校验目标引用
    ///
    /// 显式给出的配置路径无法加载时直接返回错误，此时日志尚未初始化，
    /// 错误由调用方输出。
    pub fn bootstrap(config_path: Option<&str>) -> Result<&'static LoadGenAppConfig> {
        let source = match config_path {
            Some(path) => Some(path.into()),
            None => default_config_source(),
        };
        let config = load_config(config_path)?;
        init_tracing_from_config(Some(&config.logging));

        match source {
            Some(source) => info!(
                config_path = %source.display(),
                environment = %ConfigManager::get_environment(),
                targets = config.targets.len(),
                "configuration loaded"
            ),
            None => warn!("no configuration found, running with built-in defaults"),
        }

        config
            .validate_references()
            .context("configuration validation failed")?;

        Ok(config)
    }
}
