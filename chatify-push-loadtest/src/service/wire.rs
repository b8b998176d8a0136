//! Wire 风格的依赖注入模块
//!
//! 按依赖顺序构建压测所需的全部组件

use std::sync::Arc;

use anyhow::{Context, Result};
use chatify_load_core::config::LoadGenAppConfig;
use chatify_load_core::metrics::PushLoadMetrics;
use tracing::info;

use crate::application::handlers::{DriverConfig, VirtualUserDriver};
use crate::application::{LoadRunner, RunnerConfig};
use crate::domain::repositories::PushTransport;
use crate::domain::service::{PayloadSynthesizer, SynthesizerConfig};
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::config::PushLoadTestConfig;
use crate::infrastructure::transport::ReqwestPushTransport;
use crate::infrastructure::validator::PushRequestValidatorImpl;

/// 应用上下文 - 包含所有已初始化的组件
pub struct ApplicationContext {
    pub config: Arc<PushLoadTestConfig>,
    pub runner: LoadRunner,
    pub metrics: Arc<PushLoadMetrics>,
}

/// 构建应用上下文
///
/// 所有致命的配置错误都在这里返回，之后不会再发起任何失败的初始化
pub fn initialize(app_config: &LoadGenAppConfig) -> Result<ApplicationContext> {
    // 1. 校验压测配置
    let config = Arc::new(
        PushLoadTestConfig::from_app_config(app_config)
            .context("Failed to load push load test configuration")?,
    );

    // 2. 载荷生成器
    let synthesizer_config = SynthesizerConfig::new(
        config.corpus.clone(),
        config.to_user_ids.clone(),
        config.ttl_seconds,
    )
    .context("Failed to build payload synthesizer")?;
    let validator = Arc::new(PushRequestValidatorImpl::new(&synthesizer_config));
    let synthesizer = Arc::new(PayloadSynthesizer::new(
        synthesizer_config,
        Arc::new(SystemClock::new()),
    ));

    // 3. HTTP 传输（连接池在所有虚拟用户之间共享）
    let transport: Arc<dyn PushTransport> = Arc::new(
        ReqwestPushTransport::new(config.request_timeout)
            .context("Failed to create push transport")?,
    );

    // 4. 指标
    let metrics = Arc::new(PushLoadMetrics::new());

    // 5. 虚拟用户驱动
    let driver_config = DriverConfig {
        url: config.endpoint.to_string(),
        headers: config.headers.clone(),
        expected_status: config.expected_status,
        request_timeout: config.request_timeout,
    };
    let driver = Arc::new(
        VirtualUserDriver::new(Arc::new(driver_config), synthesizer, transport)
            .with_validator(validator)
            .with_metrics(metrics.clone()),
    );

    // 6. 运行器
    let runner_config = RunnerConfig {
        virtual_users: config.virtual_users,
        policy: config.policy,
        think_time: config.think_time,
        seed: config.seed,
    };
    let runner = LoadRunner::new(runner_config, driver).with_metrics(metrics.clone());

    info!(
        endpoint = %config.endpoint,
        virtual_users = config.virtual_users,
        policy = ?config.policy,
        "push load test context initialized"
    );

    Ok(ApplicationContext {
        config,
        runner,
        metrics,
    })
}
