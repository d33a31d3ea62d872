//! 仿真运行环境
//!
//! 非实时模式下用手动时钟，每周期推进一个 `period`；实时模式下用单调时钟，
//! 由 `spin_sleep` 控制节奏。

use anyhow::{Context, Result};
use notebot_command::{Clock, ManualClock, MonotonicClock, Pacing, SharedClock};
use notebot_subsystems::sim::SimConfig;
use std::path::Path;
use std::time::Duration;

/// 仿真时间源
pub enum SimTime {
    Manual(ManualClock),
    RealTime(SharedClock),
}

impl SimTime {
    pub fn new(pacing: Pacing) -> Self {
        match pacing {
            Pacing::Unpaced => SimTime::Manual(ManualClock::new()),
            Pacing::RealTime => SimTime::RealTime(MonotonicClock::shared()),
        }
    }

    pub fn shared(&self) -> SharedClock {
        match self {
            SimTime::Manual(clock) => clock.shared(),
            SimTime::RealTime(clock) => clock.clone(),
        }
    }

    pub fn now(&self) -> Duration {
        match self {
            SimTime::Manual(clock) => clock.now(),
            SimTime::RealTime(clock) => clock.now(),
        }
    }

    /// 推进一个周期（实时模式下时间自行流逝）
    pub fn advance(&self, period: Duration) {
        if let SimTime::Manual(clock) = self {
            clock.advance(period);
        }
    }
}

/// 读取仿真参数（TOML），未指定时使用默认值
pub fn load_sim_config(path: Option<&Path>) -> Result<SimConfig> {
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("读取仿真参数失败: {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("解析仿真参数失败: {}", path.display()))
}
