//! # Prometheus 指标收集模块
//!
//! 记录压测请求的结果、状态码、错误类型和耗时。

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

/// 全局指标注册表
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// 推送压测指标
pub struct PushLoadMetrics {
    /// 请求总数（按 result=passed/failed）
    pub push_requests_total: IntCounterVec,
    /// 响应状态码分布
    pub push_request_status_total: IntCounterVec,
    /// 未收到响应的请求次数（按错误类型）
    pub push_request_errors_total: IntCounterVec,
    /// 请求耗时（秒）
    pub push_request_duration_seconds: HistogramVec,
    /// 当前活跃的虚拟用户数
    pub push_virtual_users_active: IntGauge,
}

impl PushLoadMetrics {
    pub fn new() -> Self {
        let push_requests_total = IntCounterVec::new(
            Opts::new("push_requests_total", "Total number of push requests issued"),
            &["result"],
        )
        .expect("Failed to create push_requests_total metric");

        let push_request_status_total = IntCounterVec::new(
            Opts::new(
                "push_request_status_total",
                "Number of push responses by HTTP status code",
            ),
            &["status"],
        )
        .expect("Failed to create push_request_status_total metric");

        let push_request_errors_total = IntCounterVec::new(
            Opts::new(
                "push_request_errors_total",
                "Number of push requests that failed without a response",
            ),
            &["kind"],
        )
        .expect("Failed to create push_request_errors_total metric");

        let push_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "push_request_duration_seconds",
                "Push request duration in seconds",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            &["result"],
        )
        .expect("Failed to create push_request_duration_seconds metric");

        let push_virtual_users_active = IntGauge::new(
            "push_virtual_users_active",
            "Number of virtual users currently running",
        )
        .expect("Failed to create push_virtual_users_active metric");

        // 注册指标，忽略重复注册错误（测试中可能会重复创建）
        let _ = REGISTRY.register(Box::new(push_requests_total.clone()));
        let _ = REGISTRY.register(Box::new(push_request_status_total.clone()));
        let _ = REGISTRY.register(Box::new(push_request_errors_total.clone()));
        let _ = REGISTRY.register(Box::new(push_request_duration_seconds.clone()));
        let _ = REGISTRY.register(Box::new(push_virtual_users_active.clone()));

        Self {
            push_requests_total,
            push_request_status_total,
            push_request_errors_total,
            push_request_duration_seconds,
            push_virtual_users_active,
        }
    }

    /// 记录一次请求结果
    ///
    /// `status` 为 None 表示没有收到响应，此时 `error_kind` 记录失败原因
    pub fn record_request(
        &self,
        passed: bool,
        status: Option<u16>,
        error_kind: Option<&str>,
        duration_secs: f64,
    ) {
        let result = if passed { "passed" } else { "failed" };
        self.push_requests_total.with_label_values(&[result]).inc();
        self.push_request_duration_seconds
            .with_label_values(&[result])
            .observe(duration_secs);

        if let Some(status) = status {
            self.push_request_status_total
                .with_label_values(&[status.to_string().as_str()])
                .inc();
        }
        if let Some(kind) = error_kind {
            self.push_request_errors_total
                .with_label_values(&[kind])
                .inc();
        }
    }
}

impl Default for PushLoadMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// 以 Prometheus 文本格式导出全局注册表
pub fn gather_text() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        tracing::warn!(error = %err, "failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
