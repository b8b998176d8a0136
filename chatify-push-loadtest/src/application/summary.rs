//! 压测结果汇总

use std::collections::BTreeMap;
use std::time::Duration;

use crate::domain::model::{Outcome, OutcomeErrorKind};

/// 延迟统计
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyStats {
    pub min: Duration,
    pub max: Duration,
    pub mean: Duration,
    pub p50: Duration,
    pub p95: Duration,
    pub p99: Duration,
}

/// Outcome 汇总
///
/// 每个虚拟用户各自累积，结束后由 LoadRunner 合并
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    pub status_counts: BTreeMap<u16, u64>,
    pub error_counts: BTreeMap<OutcomeErrorKind, u64>,
    latencies_us: Vec<u64>,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &Outcome) {
        self.total += 1;
        if outcome.passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        if let Some(status) = outcome.status_code {
            *self.status_counts.entry(status).or_default() += 1;
        }
        if let Some(kind) = outcome.error_kind() {
            *self.error_counts.entry(kind).or_default() += 1;
        }
        self.latencies_us
            .push(u64::try_from(outcome.latency.as_micros()).unwrap_or(u64::MAX));
    }

    pub fn merge(&mut self, other: &RunSummary) {
        self.total += other.total;
        self.passed += other.passed;
        self.failed += other.failed;
        for (status, count) in &other.status_counts {
            *self.status_counts.entry(*status).or_default() += count;
        }
        for (kind, count) in &other.error_counts {
            *self.error_counts.entry(*kind).or_default() += count;
        }
        self.latencies_us.extend_from_slice(&other.latencies_us);
    }

    /// 通过率（0.0 - 1.0），没有任何请求时为 0
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.passed as f64 / self.total as f64
    }

    pub fn latency_stats(&self) -> Option<LatencyStats> {
        if self.latencies_us.is_empty() {
            return None;
        }

        let mut sorted = self.latencies_us.clone();
        sorted.sort_unstable();
        let sum: u128 = sorted.iter().map(|v| *v as u128).sum();
        let mean = (sum / sorted.len() as u128) as u64;

        Some(LatencyStats {
            min: Duration::from_micros(sorted[0]),
            max: Duration::from_micros(sorted[sorted.len() - 1]),
            mean: Duration::from_micros(mean),
            p50: Duration::from_micros(percentile(&sorted, 50.0)),
            p95: Duration::from_micros(percentile(&sorted, 95.0)),
            p99: Duration::from_micros(percentile(&sorted, 99.0)),
        })
    }
}

/// 最近秩百分位，`sorted` 必须非空且升序
fn percentile(sorted: &[u64], p: f64) -> u64 {
    let rank = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}
