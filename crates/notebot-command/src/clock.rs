//! # 时间源
//!
//! 所有超时都以"自计时组合命令 initialize 起经过的时间"计算，与实际
//! tick 次数无关。时间源可注入：
//!
//! | 实现 | 用途 |
//! |------|------|
//! | [`MonotonicClock`] | 真实运行（`Instant`） |
//! | [`ManualClock`] | 测试与仿真，由调用方推进 |

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// 时间源
pub trait Clock: Send + Sync {
    /// 自时间源创建以来经过的时间
    fn now(&self) -> Duration;
}

/// 共享时间源句柄
pub type SharedClock = Arc<dyn Clock>;

/// 单调时钟
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    /// 包装为共享句柄
    pub fn shared() -> SharedClock {
        Arc::new(Self::new())
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// 手动时钟
///
/// 克隆出的句柄共享同一时间值，测试中一份交给命令、一份用于推进。
///
/// ```rust
/// use notebot_command::clock::{Clock, ManualClock};
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// clock.advance(Duration::from_millis(20));
/// assert_eq!(clock.now(), Duration::from_millis(20));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// 推进时间
    pub fn advance(&self, by: Duration) {
        self.nanos
            .fetch_add(by.as_nanos() as u64, Ordering::Relaxed);
    }

    /// 设置绝对时间
    pub fn set(&self, at: Duration) {
        self.nanos.store(at.as_nanos() as u64, Ordering::Relaxed);
    }

    /// 作为共享句柄（与 `self` 共享时间值）
    pub fn shared(&self) -> SharedClock {
        Arc::new(self.clone())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_handles() {
        let clock = ManualClock::new();
        let shared = clock.shared();

        clock.advance(Duration::from_millis(250));
        assert_eq!(shared.now(), Duration::from_millis(250));

        clock.set(Duration::from_secs(2));
        assert_eq!(shared.now(), Duration::from_secs(2));
    }

    #[test]
    fn test_monotonic_clock_does_not_go_backwards() {
        let clock = MonotonicClock::new();
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
