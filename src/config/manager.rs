//! 配置管理器 - 负责处理不同环境下的配置选择和覆盖
//!
//! 该模块提供了配置管理功能，包括：
//! - 加载环境特定配置（environments/{env}.toml）
//! - 应用环境变量覆盖（CHATIFY_*）

use std::collections::HashMap;
use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{LoadGenAppConfig, PushLoadTestServiceConfig, ServicesConfig, TargetEndpointConfig};

/// 环境名称变量
pub const ENV_NAME_VAR: &str = "CHATIFY_ENV";
/// 目标基础地址覆盖
pub const TARGET_URL_VAR: &str = "CHATIFY_TARGET_URL";
/// 虚拟用户数覆盖
pub const VIRTUAL_USERS_VAR: &str = "CHATIFY_VUS";
/// 迭代次数覆盖
pub const ITERATIONS_VAR: &str = "CHATIFY_ITERATIONS";
/// 持续时间覆盖（秒）
pub const DURATION_SECS_VAR: &str = "CHATIFY_DURATION_SECS";
/// 随机种子覆盖
pub const SEED_VAR: &str = "CHATIFY_SEED";

/// 环境配置文件中允许出现的部分
#[derive(Debug, Default, Deserialize)]
struct EnvironmentOverlay {
    #[serde(default)]
    targets: HashMap<String, TargetEndpointConfig>,
    #[serde(default)]
    services: ServicesConfig,
}

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 获取当前环境名称
    ///
    /// 从环境变量 CHATIFY_ENV 获取当前环境名称，
    /// 如果未设置则默认为 "development"
    pub fn get_environment() -> String {
        env::var(ENV_NAME_VAR).unwrap_or_else(|_| "development".to_string())
    }

    /// 根据环境加载特定配置
    ///
    /// 加载 {config_root}/environments/{environment}.toml 文件中的配置，
    /// 并将其合并到基础配置中
    pub fn load_environment_config(
        base_config: &mut LoadGenAppConfig,
        config_root: &Path,
    ) -> Result<()> {
        let env = Self::get_environment();
        Self::load_named_environment(base_config, config_root, &env)
    }

    /// 加载指定名称的环境配置
    pub fn load_named_environment(
        base_config: &mut LoadGenAppConfig,
        config_root: &Path,
        env: &str,
    ) -> Result<()> {
        let env_config_path = config_root
            .join("environments")
            .join(format!("{}.toml", env));

        if !env_config_path.exists() {
            debug!(path = %env_config_path.display(), "no environment config found");
            return Ok(());
        }

        let value = super::load_toml_value(&env_config_path)?;
        let overlay: EnvironmentOverlay = value
            .try_into()
            .with_context(|| format!("无效的环境配置格式: {}", env_config_path.display()))?;

        Self::merge_overlay(base_config, overlay);
        Ok(())
    }

    /// 合并环境配置
    fn merge_overlay(base_config: &mut LoadGenAppConfig, overlay: EnvironmentOverlay) {
        for (name, target) in overlay.targets {
            base_config.targets.insert(name, target);
        }

        if let Some(service_overlay) = overlay.services.push_loadtest {
            base_config
                .services
                .push_loadtest
                .get_or_insert_with(PushLoadTestServiceConfig::default)
                .merge_from(service_overlay);
        }
    }

    /// 应用环境变量覆盖
    ///
    /// `lookup` 通常是 `|key| std::env::var(key).ok()`，测试时可以注入固定映射。
    /// 无法解析的值会被忽略并记录警告。
    /// CHATIFY_ITERATIONS 会清除配置文件中的 duration_secs，两个变量同时设置时持续时间优先。
    pub fn apply_env_overrides<F>(config: &mut LoadGenAppConfig, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let service = config
            .services
            .push_loadtest
            .get_or_insert_with(PushLoadTestServiceConfig::default);

        if let Some(url) = lookup(TARGET_URL_VAR).filter(|url| !url.trim().is_empty()) {
            service.target_url = Some(url.trim().to_string());
        }
        if let Some(vus) = parse_var(&lookup, VIRTUAL_USERS_VAR) {
            service.virtual_users = Some(vus);
        }
        if let Some(iterations) = parse_var(&lookup, ITERATIONS_VAR) {
            service.iterations = Some(iterations);
            if let Some(previous) = service.duration_secs.take() {
                debug!(
                    duration_secs = previous,
                    iterations, "iteration override replaces configured duration"
                );
            }
        }
        if let Some(duration) = parse_var(&lookup, DURATION_SECS_VAR) {
            service.duration_secs = Some(duration);
        }
        if let Some(seed) = parse_var(&lookup, SEED_VAR) {
            service.seed = Some(seed);
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key = key, value = %raw, "ignoring unparsable environment override");
            None
        }
    }
}
