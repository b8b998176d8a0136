//! Chatify Load Core 配置模块
//!
//! 该模块提供了压测工具的配置管理功能，包括：
//! - 配置文件加载和解析（单文件或目录）
//! - 环境特定配置覆盖
//! - 压测目标与压测服务配置定义

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::sync::OnceLock;
use toml::Value;
use tracing::warn;

// 导入配置管理器模块
mod manager;
pub use manager::ConfigManager;

/// 全局应用配置实例，使用 OnceLock 确保只初始化一次
static APP_CONFIG: OnceLock<LoadGenAppConfig> = OnceLock::new();

/// 默认压测目标名称
pub const DEFAULT_TARGET_PROFILE: &str = "local";

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别（trace / debug / info / warn / error）
    #[serde(default = "default_log_level")]
    pub level: String,
    /// 是否输出 target
    #[serde(default = "default_true")]
    pub with_target: bool,
    /// 是否输出线程 ID
    #[serde(default)]
    pub with_thread_ids: bool,
    /// 是否输出文件名
    #[serde(default)]
    pub with_file: bool,
    /// 是否输出行号
    #[serde(default)]
    pub with_line_number: bool,
    /// 输出格式，压测结果需要被采集时使用 json
    #[serde(default)]
    pub format: LogFormat,
}

/// 日志输出格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            with_target: true,
            with_thread_ids: false,
            with_file: false,
            with_line_number: false,
            format: LogFormat::Text,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

/// 压测目标端点配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TargetEndpointConfig {
    /// 目标服务基础地址，如 http://localhost:8034
    pub base_url: String,
    /// 请求路径
    #[serde(default)]
    pub path: Option<String>,
    /// 请求超时时间（毫秒）
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// 额外请求头
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// 推送压测服务配置
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct PushLoadTestServiceConfig {
    /// 引用的压测目标名称（对应 `[targets.<name>]`）
    #[serde(default)]
    pub target: Option<String>,
    /// 直接指定目标基础地址，优先于 target 引用
    #[serde(default)]
    pub target_url: Option<String>,
    /// 覆盖请求路径
    #[serde(default)]
    pub path: Option<String>,
    /// 接收方用户 ID 列表
    #[serde(default)]
    pub to_user_ids: Option<Vec<String>>,
    /// 并发虚拟用户数
    #[serde(default)]
    pub virtual_users: Option<usize>,
    /// 每个虚拟用户的迭代次数
    #[serde(default)]
    pub iterations: Option<u64>,
    /// 压测持续时间（秒），设置后优先于 iterations
    #[serde(default)]
    pub duration_secs: Option<u64>,
    /// 消息过期时间（秒）
    #[serde(default)]
    pub ttl_seconds: Option<i64>,
    /// 期望的响应状态码
    #[serde(default)]
    pub expected_status: Option<u16>,
    /// 两次迭代之间的思考时间（毫秒）
    #[serde(default)]
    pub think_time_ms: Option<u64>,
    /// 随机种子，设置后每个虚拟用户的随机序列可复现
    #[serde(default)]
    pub seed: Option<u64>,
    /// 覆盖内置语料
    #[serde(default)]
    pub phrases: Option<Vec<String>>,
    /// 请求超时时间（毫秒），优先于目标配置
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

impl PushLoadTestServiceConfig {
    /// 用 overlay 中已设置的字段覆盖当前配置
    pub fn merge_from(&mut self, overlay: PushLoadTestServiceConfig) {
        macro_rules! take {
            ($($field:ident),* $(,)?) => {
                $(
                    if overlay.$field.is_some() {
                        self.$field = overlay.$field;
                    }
                )*
            };
        }

        take!(
            target,
            target_url,
            path,
            to_user_ids,
            virtual_users,
            iterations,
            duration_secs,
            ttl_seconds,
            expected_status,
            think_time_ms,
            seed,
            phrases,
            request_timeout_ms,
        );
    }
}

/// 服务配置集合
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServicesConfig {
    /// 推送压测服务配置
    #[serde(default)]
    pub push_loadtest: Option<PushLoadTestServiceConfig>,
}

/// 压测应用配置主结构体
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoadGenAppConfig {
    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 压测目标配置映射
    #[serde(default)]
    pub targets: HashMap<String, TargetEndpointConfig>,
    /// 服务配置
    #[serde(default)]
    pub services: ServicesConfig,
}

impl LoadGenAppConfig {
    /// 获取压测目标配置
    pub fn target_profile(&self, name: &str) -> Option<&TargetEndpointConfig> {
        self.targets.get(name)
    }

    /// 获取推送压测服务配置
    pub fn push_loadtest_service(&self) -> PushLoadTestServiceConfig {
        self.services.push_loadtest.clone().unwrap_or_default()
    }

    /// 校验服务配置中引用的 target 是否存在
    pub fn validate_references(&self) -> Result<()> {
        let service = self.push_loadtest_service();
        if service.target_url.is_some() {
            return Ok(());
        }

        let name = service
            .target
            .as_deref()
            .unwrap_or(DEFAULT_TARGET_PROFILE);
        if self.target_profile(name).is_none() {
            return Err(anyhow!(
                "services.push_loadtest references unknown target profile '{}'",
                name
            ));
        }

        Ok(())
    }

    /// 确保配置有默认值
    pub fn ensure_defaults(&mut self) {
        self.targets
            .entry(DEFAULT_TARGET_PROFILE.to_string())
            .or_insert_with(default_target);
    }
}

/// 未指定路径时依次尝试的配置位置
pub const DEFAULT_CONFIG_CANDIDATES: [&str; 2] = ["config", "config.toml"];

/// 加载配置并写入全局缓存
///
/// 首次调用时加载并缓存，之后的调用直接返回缓存的配置。
/// 加载失败时不写入缓存。
pub fn load_config(path: Option<&str>) -> Result<&'static LoadGenAppConfig> {
    if let Some(cfg) = APP_CONFIG.get() {
        return Ok(cfg);
    }

    let cfg = resolve_config(path, |key| std::env::var(key).ok())?;
    Ok(APP_CONFIG.get_or_init(|| cfg))
}

/// 解析完整配置，不写入全局缓存
///
/// - 显式指定的路径必须存在且能解析，环境配置文件同理
/// - 未指定路径时使用第一个存在的默认位置；都不存在时使用内置默认配置
/// - 最后应用环境变量覆盖
pub fn resolve_config<F>(path: Option<&str>, lookup: F) -> Result<LoadGenAppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let source = match path {
        Some(p) => Some(PathBuf::from(p)),
        None => default_config_source(),
    };

    let mut cfg = match source {
        Some(source) => {
            let mut cfg = load_config_from_path(&source).with_context(|| {
                format!("failed to load configuration from {}", source.display())
            })?;
            let root = config_root(&source);
            ConfigManager::load_environment_config(&mut cfg, &root).with_context(|| {
                format!("failed to load environment config under {}", root.display())
            })?;
            cfg
        }
        None => {
            warn!("no configuration found, using built-in defaults");
            default_config()
        }
    };

    ConfigManager::apply_env_overrides(&mut cfg, lookup);
    Ok(cfg)
}

/// 第一个存在的默认配置位置
pub fn default_config_source() -> Option<PathBuf> {
    DEFAULT_CONFIG_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.exists())
}

/// 从指定路径加载配置，不写入全局缓存，也不应用环境配置
pub fn load_config_from_path(path: impl AsRef<Path>) -> Result<LoadGenAppConfig> {
    let mut cfg = load_config_from_source(path.as_ref())?;
    cfg.ensure_defaults();
    Ok(cfg)
}

/// 环境配置根目录：目录配置取其自身，文件配置取其所在目录
fn config_root(path: &Path) -> PathBuf {
    if path.is_dir() {
        return path.to_path_buf();
    }
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("config"),
    }
}

/// 从源加载配置
fn load_config_from_source(path: &Path) -> Result<LoadGenAppConfig> {
    if !path.exists() {
        return Err(anyhow!(
            "configuration path {} does not exist",
            path.display()
        ));
    }

    let metadata = path
        .metadata()
        .with_context(|| format!("unable to read metadata for {}", path.display()))?;

    if metadata.is_dir() {
        load_config_from_directory(path)
    } else {
        load_config_from_file(path)
    }
}

/// 从文件加载配置
fn load_config_from_file(path: &Path) -> Result<LoadGenAppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("unable to read config file: {}", path.display()))?;
    let cfg: LoadGenAppConfig = toml::from_str(&content)
        .with_context(|| format!("invalid config format: {}", path.display()))?;
    Ok(cfg)
}

/// 从目录加载配置
fn load_config_from_directory(path: &Path) -> Result<LoadGenAppConfig> {
    let base_file = path.join("base.toml");
    if !base_file.exists() {
        return Err(anyhow!(
            "missing base configuration: {}",
            base_file.display()
        ));
    }

    let mut merged = load_toml_value(&base_file)?;

    if !merged.is_table() {
        return Err(anyhow!(
            "base configuration must be a table: {}",
            base_file.display()
        ));
    }

    merge_directory(&mut merged, &path.join("shared"))?;
    merge_directory(&mut merged, &path.join("services"))?;
    merge_directory(&mut merged, &path.join("overrides"))?;

    let cfg: LoadGenAppConfig = merged
        .try_into()
        .with_context(|| format!("invalid configuration after merging {}", path.display()))?;

    Ok(cfg)
}

/// 合并目录中的配置
fn merge_directory(root: &mut Value, dir: &Path) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }

    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("unable to read config directory {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(OsStr::to_str)
                .map(|ext| ext.eq_ignore_ascii_case("toml"))
                .unwrap_or(false)
        })
        .collect::<Vec<_>>();

    entries.sort_by_key(|entry| entry.path());

    for entry in entries {
        let value = load_toml_value(&entry.path())?;
        merge_value(root, value);
    }

    Ok(())
}

/// 加载 TOML 值
pub(crate) fn load_toml_value(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("unable to read config fragment {}", path.display()))?;
    let value: Value = toml::from_str(&content)
        .with_context(|| format!("invalid TOML content in fragment {}", path.display()))?;
    Ok(value)
}

/// 合并值
fn merge_value(base: &mut Value, overlay: Value) {
    match overlay {
        Value::Table(overlay_table) => {
            if let Value::Table(base_table) = base {
                for (key, overlay_value) in overlay_table.into_iter() {
                    match base_table.get_mut(&key) {
                        Some(base_value) => merge_value(base_value, overlay_value),
                        None => {
                            base_table.insert(key, overlay_value);
                        }
                    }
                }
            } else {
                *base = Value::Table(overlay_table);
            }
        }
        other => {
            *base = other;
        }
    }
}

/// 默认压测目标：本地 logic 服务的系统推送接口
fn default_target() -> TargetEndpointConfig {
    TargetEndpointConfig {
        base_url: "http://localhost:8034".to_string(),
        path: Some("/chatify/logic/v1/sendSystemPush".to_string()),
        timeout_ms: Some(5_000),
        headers: HashMap::new(),
    }
}

/// 默认配置
fn default_config() -> LoadGenAppConfig {
    let mut cfg = LoadGenAppConfig::default();
    cfg.ensure_defaults();
    cfg
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = fs::File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_load_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.toml");
        write_file(
            &file,
            r#"
[logging]
level = "debug"

[targets.staging]
base_url = "http://staging:8034"
timeout_ms = 2000

[services.push_loadtest]
target = "staging"
virtual_users = 20
iterations = 50
to_user_ids = ["uidA", "uidB"]
"#,
        );

        let cfg = load_config_from_path(&file).unwrap();
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(
            cfg.target_profile("staging").unwrap().base_url,
            "http://staging:8034"
        );
        // 默认 target 总是存在
        assert!(cfg.target_profile(DEFAULT_TARGET_PROFILE).is_some());

        let service = cfg.push_loadtest_service();
        assert_eq!(service.virtual_users, Some(20));
        assert_eq!(service.iterations, Some(50));
        assert_eq!(
            service.to_user_ids,
            Some(vec!["uidA".to_string(), "uidB".to_string()])
        );
        assert!(cfg.validate_references().is_ok());
    }

    #[test]
    fn test_load_directory_merges_fragments_in_order() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            &dir.path().join("base.toml"),
            r#"
[services.push_loadtest]
virtual_users = 1
iterations = 1
"#,
        );
        write_file(
            &dir.path().join("services/push_loadtest.toml"),
            r#"
[services.push_loadtest]
virtual_users = 10
"#,
        );
        write_file(
            &dir.path().join("overrides/zz_local.toml"),
            r#"
[services.push_loadtest]
seed = 42
"#,
        );
        // 非 toml 文件被忽略
        write_file(&dir.path().join("services/readme.txt"), "not toml");

        let cfg = load_config_from_path(dir.path()).unwrap();
        let service = cfg.push_loadtest_service();
        assert_eq!(service.virtual_users, Some(10));
        assert_eq!(service.iterations, Some(1));
        assert_eq!(service.seed, Some(42));
    }

    #[test]
    fn test_directory_without_base_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config_from_path(dir.path()).unwrap_err();
        assert!(err.to_string().contains("missing base configuration"));
    }

    #[test]
    fn test_missing_path_is_rejected() {
        let err = load_config_from_path("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bad.toml");
        write_file(
            &file,
            r#"
[services.push_loadtest]
target_url = "http://prod:9"
virtual_users = "ten"
"#,
        );

        let err = resolve_config(file.to_str(), |_| None).unwrap_err();
        assert!(format!("{err:#}").contains("bad.toml"), "{err:#}");
    }

    #[test]
    fn test_resolve_rejects_missing_explicit_path() {
        let err = resolve_config(Some("/definitely/not/here"), |_| None).unwrap_err();
        assert!(format!("{err:#}").contains("does not exist"), "{err:#}");
    }

    #[test]
    fn test_resolve_rejects_malformed_environment_overlay() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir.path().join("base.toml"), "[logging]\nlevel = \"info\"\n");
        // 未设置 CHATIFY_ENV 时使用 development
        let env = ConfigManager::get_environment();
        write_file(
            &dir.path().join(format!("environments/{env}.toml")),
            "[services.push_loadtest]\niterations = [1, 2]\n",
        );

        let err = resolve_config(dir.path().to_str(), |_| None).unwrap_err();
        assert!(format!("{err:#}").contains("environment"), "{err:#}");
    }

    #[test]
    fn test_resolve_applies_env_overrides_after_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.toml");
        write_file(
            &file,
            r#"
[services.push_loadtest]
target_url = "http://prod:9"
virtual_users = 4
"#,
        );

        let cfg = resolve_config(file.to_str(), |key| {
            (key == super::manager::VIRTUAL_USERS_VAR).then(|| "16".to_string())
        })
        .unwrap();

        let service = cfg.push_loadtest_service();
        assert_eq!(service.target_url.as_deref(), Some("http://prod:9"));
        assert_eq!(service.virtual_users, Some(16));
    }

    #[test]
    fn test_validate_references_unknown_target() {
        let mut cfg = default_config();
        cfg.services.push_loadtest = Some(PushLoadTestServiceConfig {
            target: Some("missing".to_string()),
            ..Default::default()
        });
        assert!(cfg.validate_references().is_err());

        // 直接给出地址时不需要 target 引用
        cfg.services.push_loadtest = Some(PushLoadTestServiceConfig {
            target: Some("missing".to_string()),
            target_url: Some("http://127.0.0.1:1".to_string()),
            ..Default::default()
        });
        assert!(cfg.validate_references().is_ok());
    }

    #[test]
    fn test_merge_from_only_overrides_set_fields() {
        let mut base = PushLoadTestServiceConfig {
            virtual_users: Some(5),
            iterations: Some(10),
            ..Default::default()
        };
        base.merge_from(PushLoadTestServiceConfig {
            iterations: Some(99),
            seed: Some(7),
            ..Default::default()
        });

        assert_eq!(base.virtual_users, Some(5));
        assert_eq!(base.iterations, Some(99));
        assert_eq!(base.seed, Some(7));
    }

    #[test]
    fn test_default_config_points_to_local_logic_service() {
        let cfg = default_config();
        let target = cfg.target_profile(DEFAULT_TARGET_PROFILE).unwrap();
        assert_eq!(target.base_url, "http://localhost:8034");
        assert_eq!(
            target.path.as_deref(),
            Some("/chatify/logic/v1/sendSystemPush")
        );
    }

    #[test]
    fn test_bundled_config_directory() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("config");
        let mut cfg = load_config_from_path(&root).unwrap();

        let service = cfg.push_loadtest_service();
        assert_eq!(service.target.as_deref(), Some(DEFAULT_TARGET_PROFILE));
        assert_eq!(service.to_user_ids, Some(vec!["uidhSSWsdYgB9".to_string()]));
        cfg.validate_references().unwrap();

        ConfigManager::load_named_environment(&mut cfg, &root, "staging").unwrap();
        let service = cfg.push_loadtest_service();
        assert_eq!(service.target.as_deref(), Some("staging"));
        assert_eq!(service.duration_secs, Some(300));
        cfg.validate_references().unwrap();
    }

    #[test]
    fn test_logging_format_parses_lowercase() {
        let cfg: LoadGenAppConfig = toml::from_str(
            r#"
            [logging]
            level = "debug"
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert!(cfg.logging.with_target);
        assert_eq!(LoggingConfig::default().format, LogFormat::Text);
    }
}
