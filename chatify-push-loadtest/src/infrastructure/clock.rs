//! 时钟实现

use std::sync::atomic::{AtomicI64, Ordering};

use chatify_load_core::current_seconds;

use crate::domain::repositories::Clock;

/// 系统时钟
///
/// 墙钟回拨时返回已见过的最大值，保证同一次压测内时间戳单调不减
#[derive(Debug, Default)]
pub struct SystemClock {
    high_water: AtomicI64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }

    fn observe(&self, now: i64) -> i64 {
        let previous = self.high_water.fetch_max(now, Ordering::AcqRel);
        previous.max(now)
    }
}

impl Clock for SystemClock {
    fn now_seconds(&self) -> i64 {
        self.observe(current_seconds())
    }
}

/// 固定时钟，用于测试和基准
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    seconds: i64,
}

impl FixedClock {
    pub fn new(seconds: i64) -> Self {
        Self { seconds }
    }
}

impl Clock for FixedClock {
    fn now_seconds(&self) -> i64 {
        self.seconds
    }
}
