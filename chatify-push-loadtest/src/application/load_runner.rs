//! 压测运行器 - 启动 N 个并发虚拟用户并汇总结果
//!
//! 每个虚拟用户是一个独立的 tokio 任务，持有自己的随机数生成器；
//! 共享的只有只读配置、语料库和传输连接池。

use std::sync::Arc;
use std::time::Duration;

use chatify_load_core::metrics::PushLoadMetrics;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::application::handlers::VirtualUserDriver;
use crate::application::summary::RunSummary;

/// 迭代策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationPolicy {
    /// 每个虚拟用户执行固定次数
    Iterations(u64),
    /// 整个压测持续固定时长，在迭代边界检查
    Duration(Duration),
}

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub virtual_users: usize,
    pub policy: IterationPolicy,
    pub think_time: Option<Duration>,
    /// 设置后虚拟用户 i 使用种子 `seed + i`
    pub seed: Option<u64>,
}

impl RunnerConfig {
    pub fn new(virtual_users: usize, policy: IterationPolicy) -> Self {
        Self {
            virtual_users,
            policy,
            think_time: None,
            seed: None,
        }
    }
}

/// 单个虚拟用户的执行报告
#[derive(Debug, Clone)]
pub struct VirtualUserReport {
    pub vu_id: usize,
    pub iterations: u64,
    pub summary: RunSummary,
}

/// 整次压测报告
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub elapsed: Duration,
    pub summary: RunSummary,
    pub virtual_users: Vec<VirtualUserReport>,
    /// 异常退出（panic）的虚拟用户数
    pub crashed_virtual_users: usize,
    /// 是否因关闭信号提前结束
    pub cancelled: bool,
}

impl RunReport {
    pub fn iterations_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.summary.total as f64 / secs
    }
}

/// 压测运行器
pub struct LoadRunner {
    config: RunnerConfig,
    driver: Arc<VirtualUserDriver>,
    metrics: Option<Arc<PushLoadMetrics>>,
}

impl LoadRunner {
    pub fn new(config: RunnerConfig, driver: Arc<VirtualUserDriver>) -> Self {
        Self {
            config,
            driver,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<PushLoadMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// 运行压测直到策略完成或收到关闭信号
    ///
    /// 关闭信号在每个迭代边界检查；进行中的请求受请求超时约束，不会被强行中断
    #[instrument(skip_all, fields(virtual_users = self.config.virtual_users))]
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> RunReport {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        let deadline = match self.config.policy {
            IterationPolicy::Duration(duration) => Some(started + duration),
            IterationPolicy::Iterations(_) => None,
        };

        info!(
            run_id = %run_id,
            policy = ?self.config.policy,
            seed = ?self.config.seed,
            "starting push load run"
        );

        let mut tasks = JoinSet::new();
        for vu_id in 0..self.config.virtual_users {
            let user = VirtualUser {
                vu_id,
                driver: self.driver.clone(),
                policy: self.config.policy,
                deadline,
                think_time: self.config.think_time,
                rng: rng_for(self.config.seed, vu_id),
                shutdown: shutdown.clone(),
                metrics: self.metrics.clone(),
            };
            tasks.spawn(user.run());
        }

        let mut reports = Vec::with_capacity(self.config.virtual_users);
        let mut crashed_virtual_users = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(err) => {
                    crashed_virtual_users += 1;
                    error!(run_id = %run_id, error = %err, "virtual user terminated abnormally");
                }
            }
        }
        reports.sort_by_key(|report| report.vu_id);

        let mut summary = RunSummary::default();
        for report in &reports {
            summary.merge(&report.summary);
        }

        let report = RunReport {
            run_id,
            elapsed: started.elapsed(),
            summary,
            virtual_users: reports,
            crashed_virtual_users,
            cancelled: *shutdown.borrow(),
        };

        info!(
            run_id = %run_id,
            total = report.summary.total,
            passed = report.summary.passed,
            failed = report.summary.failed,
            elapsed_ms = report.elapsed.as_millis() as u64,
            cancelled = report.cancelled,
            "push load run finished"
        );

        report
    }
}

fn rng_for(seed: Option<u64>, vu_id: usize) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(vu_id as u64)),
        None => StdRng::from_entropy(),
    }
}

/// 活跃虚拟用户计数，任务结束（包括 panic）时自动减一
struct ActiveGuard(Option<Arc<PushLoadMetrics>>);

impl ActiveGuard {
    fn enter(metrics: Option<Arc<PushLoadMetrics>>) -> Self {
        if let Some(metrics) = metrics.as_ref() {
            metrics.push_virtual_users_active.inc();
        }
        Self(metrics)
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        if let Some(metrics) = self.0.as_ref() {
            metrics.push_virtual_users_active.dec();
        }
    }
}

struct VirtualUser {
    vu_id: usize,
    driver: Arc<VirtualUserDriver>,
    policy: IterationPolicy,
    deadline: Option<Instant>,
    think_time: Option<Duration>,
    rng: StdRng,
    shutdown: watch::Receiver<bool>,
    metrics: Option<Arc<PushLoadMetrics>>,
}

impl VirtualUser {
    async fn run(mut self) -> VirtualUserReport {
        let _active = ActiveGuard::enter(self.metrics.take());
        let mut summary = RunSummary::default();
        let mut iterations = 0u64;

        loop {
            if *self.shutdown.borrow() {
                debug!(vu_id = self.vu_id, iterations, "virtual user stopped by shutdown signal");
                break;
            }
            if self.finished(iterations) {
                break;
            }

            let outcome = self.driver.run_iteration(&mut self.rng).await;
            iterations += 1;
            summary.record(&outcome);

            if let Some(pause) = self.think_time {
                self.think(pause).await;
            }
        }

        VirtualUserReport {
            vu_id: self.vu_id,
            iterations,
            summary,
        }
    }

    fn finished(&self, iterations: u64) -> bool {
        match self.policy {
            IterationPolicy::Iterations(limit) => iterations >= limit,
            IterationPolicy::Duration(_) => self
                .deadline
                .is_some_and(|deadline| Instant::now() >= deadline),
        }
    }

    /// 思考时间，收到关闭信号或到达截止时间时提前结束
    async fn think(&mut self, pause: Duration) {
        let mut wake_at = Instant::now() + pause;
        if let Some(deadline) = self.deadline {
            wake_at = wake_at.min(deadline);
        }

        let sleep = tokio::time::sleep_until(wake_at);
        tokio::pin!(sleep);

        tokio::select! {
            _ = &mut sleep => {}
            changed = self.shutdown.changed() => {
                // 发送端已关闭时不会再有信号，睡完剩余时间
                if changed.is_err() {
                    sleep.await;
                }
            }
        }
    }
}
