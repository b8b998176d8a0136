use anyhow::Result;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use chatify_load_core::ServiceHelper;
use chatify_load_core::metrics::gather_text;

use crate::application::RunReport;

mod wire;

pub use wire::{ApplicationContext, initialize};

/// 应用启动器
pub struct ApplicationBootstrap;

impl ApplicationBootstrap {
    /// 运行压测的主入口点
    ///
    /// 只有配置错误会返回 Err，检查失败的请求只体现在报告里
    pub async fn run(config_path: Option<&str>) -> Result<RunReport> {
        // 加载应用配置并初始化日志
        let app_config = ServiceHelper::bootstrap(config_path)?;

        // 使用 Wire 风格的依赖注入构建应用上下文
        let context = wire::initialize(app_config)?;

        Self::run_with_context(context).await
    }

    /// 运行压测（带应用上下文），Ctrl+C 触发优雅停止
    pub async fn run_with_context(context: ApplicationContext) -> Result<RunReport> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let signal_task = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("shutdown signal received (Ctrl+C), finishing in-flight iterations");
                    let _ = shutdown_tx.send(true);
                }
                Err(err) => warn!(error = %err, "failed to listen for Ctrl+C"),
            }
        });

        let report = context.runner.run(shutdown_rx).await;
        signal_task.abort();

        Self::log_report(&report);
        debug!(metrics = %gather_text(), "final metrics snapshot");

        Ok(report)
    }

    fn log_report(report: &RunReport) {
        let summary = &report.summary;
        info!(
            run_id = %report.run_id,
            total = summary.total,
            passed = summary.passed,
            failed = summary.failed,
            pass_rate = format!("{:.2}%", summary.pass_rate() * 100.0),
            iterations_per_second = format!("{:.1}", report.iterations_per_second()),
            elapsed_ms = report.elapsed.as_millis() as u64,
            cancelled = report.cancelled,
            "✓ status check summary"
        );

        if let Some(latency) = summary.latency_stats() {
            info!(
                min = ?latency.min,
                mean = ?latency.mean,
                p50 = ?latency.p50,
                p95 = ?latency.p95,
                p99 = ?latency.p99,
                max = ?latency.max,
                "request latency"
            );
        }

        for (status, count) in &summary.status_counts {
            info!(status, count, "responses by status");
        }
        for (kind, count) in &summary.error_counts {
            warn!(kind = kind.as_str(), count, "requests without response");
        }
        if report.crashed_virtual_users > 0 {
            warn!(
                crashed = report.crashed_virtual_users,
                "virtual users terminated abnormally"
            );
        }
    }
}
