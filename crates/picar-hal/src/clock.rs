//! 单调时钟
//!
//! 控制循环只通过 [`Clock`] 获取时间和休眠，测试中可替换为虚拟时钟
//! （见 [`crate::sim::ManualClock`]）。

use spin_sleep::SpinSleeper;
use std::time::{Duration, Instant};

/// 时钟接口
pub trait Clock {
    /// 自时钟锚点以来的单调时间
    fn now(&self) -> Duration;

    /// 休眠指定时长
    fn sleep(&self, duration: Duration);
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// 系统时钟
///
/// 使用 `Instant` 锚点（不受系统时间调整影响），
/// 休眠使用 `spin_sleep` 以降低抖动。
#[derive(Debug, Clone)]
pub struct SystemClock {
    anchor: Instant,
    sleeper: SpinSleeper,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            anchor: Instant::now(),
            sleeper: SpinSleeper::default(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.anchor.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            self.sleeper.sleep(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_monotonic() {
        let clock = SystemClock::new();
        let t1 = clock.now();
        clock.sleep(Duration::from_millis(5));
        let t2 = clock.now();
        assert!(t2 >= t1 + Duration::from_millis(5));
    }
}
