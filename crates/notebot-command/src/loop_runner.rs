//! Loop Runner - 调度循环包装器
//!
//! 以固定周期驱动 [`Scheduler`]，处理定时和周期超时告警。
//!
//! # 核心功能
//!
//! - **精确定时**: 使用 `spin_sleep` 与绝对时间锚点，消除累积漂移
//! - **周期超时检测**: 单周期耗时超过标称周期时告警
//! - **非实时模式**: 仿真/测试中不休眠，时间由调用方的时钟推进
//!
//! # 使用示例
//!
//! ```rust
//! use notebot_command::loop_runner::{LoopConfig, Pacing, run_loop};
//! use notebot_command::scheduler::Scheduler;
//! use std::ops::ControlFlow;
//!
//! let mut scheduler = Scheduler::new();
//! let config = LoopConfig {
//!     pacing: Pacing::Unpaced,
//!     max_iterations: Some(10),
//!     ..LoopConfig::default()
//! };
//!
//! let stats = run_loop(&mut scheduler, &config, |_, _| ControlFlow::Continue(())).unwrap();
//! assert_eq!(stats.iterations, 10);
//! ```

use crate::error::SchedulerError;
use crate::scheduler::Scheduler;
use std::ops::ControlFlow;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// 周期节奏
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pacing {
    /// 按墙钟周期休眠（真实机器人）
    #[default]
    RealTime,
    /// 不休眠，尽快执行（仿真、测试）
    Unpaced,
}

/// 调度循环配置
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// 调度周期
    pub period: Duration,

    /// 最大迭代次数（None 表示直到回调要求停止）
    pub max_iterations: Option<u64>,

    pub pacing: Pacing,
}

impl Default for LoopConfig {
    fn default() -> Self {
        LoopConfig {
            period: Duration::from_millis(20), // 50Hz
            max_iterations: None,
            pacing: Pacing::RealTime,
        }
    }
}

/// 循环统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub iterations: u64,
    /// 周期耗时超过标称周期的次数
    pub overruns: u64,
}

/// 运行调度循环
///
/// 每个周期先调用 `before_cycle(scheduler, iteration)`（更新传感器、推进
/// 仿真时钟、调度新命令），再执行一次 `scheduler.run()`。
/// 回调返回 `ControlFlow::Break(())` 或达到 `max_iterations` 时返回。
pub fn run_loop<F>(
    scheduler: &mut Scheduler,
    config: &LoopConfig,
    mut before_cycle: F,
) -> Result<LoopStats, SchedulerError>
where
    F: FnMut(&mut Scheduler, u64) -> ControlFlow<()>,
{
    if config.period.is_zero() {
        return Err(SchedulerError::InvalidLoopConfig(
            "period must be > 0".to_string(),
        ));
    }

    let mut stats = LoopStats::default();
    let mut next_deadline = Instant::now() + config.period;

    loop {
        if let Some(max_iter) = config.max_iterations
            && stats.iterations >= max_iter
        {
            break;
        }

        let cycle_start = Instant::now();
        if before_cycle(scheduler, stats.iterations).is_break() {
            break;
        }
        scheduler.run();
        stats.iterations += 1;

        if config.pacing == Pacing::RealTime {
            let spent = cycle_start.elapsed();
            if spent > config.period {
                stats.overruns += 1;
                warn!(
                    "Scheduler loop overrun: {:?} (period {:?})",
                    spent, config.period
                );
            }

            let now = Instant::now();
            if next_deadline > now {
                spin_sleep::sleep(next_deadline - now);
                next_deadline += config.period;
            } else {
                // 已落后一个周期以上，重新锚定，不追赶
                next_deadline = now + config.period;
            }
        }
    }

    debug!(
        "Scheduler loop stopped after {} iterations ({} overruns)",
        stats.iterations, stats.overruns
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::run;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_zero_period_is_rejected() {
        let mut scheduler = Scheduler::new();
        let config = LoopConfig {
            period: Duration::ZERO,
            ..LoopConfig::default()
        };
        let err = run_loop(&mut scheduler, &config, |_, _| ControlFlow::Continue(())).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidLoopConfig(_)));
    }

    #[test]
    fn test_break_stops_loop() {
        let mut scheduler = Scheduler::new();
        let ticks = Rc::new(Cell::new(0));
        let t = ticks.clone();
        scheduler.schedule(run(move || t.set(t.get() + 1), []));

        let config = LoopConfig {
            pacing: Pacing::Unpaced,
            ..LoopConfig::default()
        };
        let stats = run_loop(&mut scheduler, &config, |_, iteration| {
            if iteration == 5 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .unwrap();

        assert_eq!(stats.iterations, 5);
        assert_eq!(ticks.get(), 5);
    }

    #[test]
    fn test_real_time_pacing_respects_period() {
        let mut scheduler = Scheduler::new();
        let config = LoopConfig {
            period: Duration::from_millis(5),
            max_iterations: Some(4),
            pacing: Pacing::RealTime,
        };

        let start = Instant::now();
        let stats = run_loop(&mut scheduler, &config, |_, _| ControlFlow::Continue(())).unwrap();
        assert_eq!(stats.iterations, 4);
        assert!(start.elapsed() >= Duration::from_millis(15));
    }
}
