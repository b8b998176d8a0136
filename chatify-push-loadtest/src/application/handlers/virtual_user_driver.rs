//! 虚拟用户驱动 - 执行一次压测迭代：生成请求、发送、判定结果

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chatify_load_core::metrics::PushLoadMetrics;
use rand::Rng;
use tracing::{Level, debug, instrument, warn};

use crate::domain::model::{Outcome, OutcomeErrorKind};
use crate::domain::repositories::PushTransport;
use crate::domain::service::PayloadSynthesizer;
use crate::infrastructure::validator::PushRequestValidator;

/// 驱动配置（只读，在虚拟用户之间共享）
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub url: String,
    pub headers: HashMap<String, String>,
    pub expected_status: u16,
    pub request_timeout: Duration,
}

impl DriverConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
            expected_status: 200,
            request_timeout: Duration::from_secs(5),
        }
    }

    pub fn assertion_name(&self) -> String {
        format!("status is {}", self.expected_status)
    }
}

/// 虚拟用户驱动
///
/// 不持有任何迭代间状态，随机数源由调用方按虚拟用户传入
pub struct VirtualUserDriver {
    config: Arc<DriverConfig>,
    synthesizer: Arc<PayloadSynthesizer>,
    transport: Arc<dyn PushTransport>,
    validator: Option<Arc<dyn PushRequestValidator>>,
    metrics: Option<Arc<PushLoadMetrics>>,
}

impl VirtualUserDriver {
    pub fn new(
        config: Arc<DriverConfig>,
        synthesizer: Arc<PayloadSynthesizer>,
        transport: Arc<dyn PushTransport>,
    ) -> Self {
        Self {
            config,
            synthesizer,
            transport,
            validator: None,
            metrics: None,
        }
    }

    /// debug 日志级别下校验每个生成的请求
    pub fn with_validator(mut self, validator: Arc<dyn PushRequestValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<PushLoadMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// 执行一次迭代
    ///
    /// 每次调用恰好发出一个网络请求（序列化失败时不发请求）。
    /// 断言失败和传输错误都以失败的 Outcome 返回，不会重试。
    #[instrument(level = "debug", skip_all, fields(url = %self.config.url))]
    pub async fn run_iteration<R: Rng + ?Sized>(&self, rng: &mut R) -> Outcome {
        let request = self.synthesizer.build_request(rng);
        let assertion_name = self.config.assertion_name();

        if let Some(validator) = self.validator.as_ref() {
            if tracing::enabled!(Level::DEBUG) {
                if let Err(err) = validator.validate(&request) {
                    warn!(error = %err, content_id = %request.content_id, "generated request violates protocol");
                }
            }
        }

        let body = match request.to_json_bytes() {
            Ok(body) => body,
            Err(err) => {
                warn!(error = %err, "failed to serialize push request");
                let outcome = Outcome::from_error(
                    assertion_name,
                    OutcomeErrorKind::Serialization,
                    err.to_string(),
                    Duration::ZERO,
                    request.content_id,
                    request.from_user_id,
                );
                self.record(&outcome);
                return outcome;
            }
        };

        let started = Instant::now();
        let result = tokio::time::timeout(
            self.config.request_timeout,
            self.transport
                .post_json(&self.config.url, &self.config.headers, body),
        )
        .await;
        let latency = started.elapsed();

        let outcome = match result {
            Ok(Ok(response)) => {
                let outcome = Outcome::from_status(
                    assertion_name,
                    self.config.expected_status,
                    response.status,
                    latency,
                    request.content_id,
                    request.from_user_id,
                );
                if outcome.passed {
                    debug!(status = response.status, latency_ms = latency.as_millis() as u64, "push request passed");
                } else {
                    warn!(
                        status = response.status,
                        expected = self.config.expected_status,
                        body = %response.body,
                        "push request failed check"
                    );
                }
                outcome
            }
            Ok(Err(err)) => {
                warn!(error = %err, "push request transport error");
                Outcome::from_error(
                    assertion_name,
                    err.kind(),
                    err.to_string(),
                    latency,
                    request.content_id,
                    request.from_user_id,
                )
            }
            Err(_) => {
                warn!(timeout_ms = self.config.request_timeout.as_millis() as u64, "push request timed out");
                Outcome::from_error(
                    assertion_name,
                    OutcomeErrorKind::Timeout,
                    format!("no response within {:?}", self.config.request_timeout),
                    latency,
                    request.content_id,
                    request.from_user_id,
                )
            }
        };

        self.record(&outcome);
        outcome
    }

    fn record(&self, outcome: &Outcome) {
        if let Some(metrics) = self.metrics.as_ref() {
            metrics.record_request(
                outcome.passed,
                outcome.status_code,
                outcome.error_kind().map(|kind| kind.as_str()),
                outcome.latency.as_secs_f64(),
            );
        }
    }
}
