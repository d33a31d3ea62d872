//! 确定性仿真机器人
//!
//! 不依赖任何硬件：子系统状态由 [`SimRobot::update`] 按固定步长推进，
//! 所有命令式调用记录在 [`Journal`] 中。
//!
//! ```rust
//! use notebot_command::ManualClock;
//! use notebot_subsystems::sim::{SimAction, SimConfig, SimRobot};
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let robot = SimRobot::new(SimConfig::default(), clock.shared());
//! let subsystems = robot.subsystems();
//!
//! subsystems.shooter.set_rpm(3000.0);
//! for _ in 0..100 {
//!     clock.advance(Duration::from_millis(20));
//!     robot.update(Duration::from_millis(20));
//! }
//! assert!(subsystems.shooter.at_goal_rpm());
//! assert_eq!(robot.journal().actions(), vec![SimAction::ShooterSetRpm(3000.0)]);
//! ```

mod devices;
mod journal;

pub use devices::{BeltState, RollerState, SimArm, SimIndexer, SimIntake, SimShooter};
pub use journal::{DEFAULT_JOURNAL_CAPACITY, Journal, JournalEntry, SimAction};

use crate::Subsystems;
use notebot_command::SharedClock;
use std::sync::Arc;
use std::time::Duration;

/// 仿真参数
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// 光电门覆盖区间（米，沿通道）
    pub sensor_window: (f64, f64),
    /// 通道末端（进入 shooter）位置（米）
    pub shooter_position: f64,
    /// intake/outtake 传送速度（米/秒）
    pub belt_speed: f64,
    /// feed 传送速度（米/秒）
    pub feed_speed: f64,
    /// 飞轮加速度（RPM/秒）
    pub rpm_accel: f64,
    /// 判定到达目标转速的容差（RPM）
    pub rpm_tolerance: f64,
    /// 开环：每伏对应的稳态转速
    pub rpm_per_volt: f64,
    /// Arm 角速度（度/秒）
    pub arm_speed: f64,
    /// 判定到达目标角度的容差（度）
    pub angle_tolerance: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            sensor_window: (0.30, 0.45),
            shooter_position: 0.6,
            belt_speed: 0.5,
            feed_speed: 1.0,
            rpm_accel: 6000.0,
            rpm_tolerance: 50.0,
            rpm_per_volt: 500.0,
            arm_speed: 90.0,
            angle_tolerance: 1.0,
        }
    }
}

/// 仿真机器人
pub struct SimRobot {
    intake: Arc<SimIntake>,
    indexer: Arc<SimIndexer>,
    shooter: Arc<SimShooter>,
    arm: Arc<SimArm>,
    journal: Journal,
    clock: SharedClock,
}

impl SimRobot {
    pub fn new(config: SimConfig, clock: SharedClock) -> Self {
        let journal = Journal::new(clock.clone());
        Self {
            intake: Arc::new(SimIntake::new(journal.clone())),
            indexer: Arc::new(SimIndexer::new(config.clone(), journal.clone())),
            shooter: Arc::new(SimShooter::new(config.clone(), journal.clone())),
            arm: Arc::new(SimArm::new(config, journal.clone())),
            journal,
            clock,
        }
    }

    /// 供命令库使用的子系统句柄
    pub fn subsystems(&self) -> Subsystems {
        Subsystems {
            intake: self.intake.clone(),
            indexer: self.indexer.clone(),
            shooter: self.shooter.clone(),
            arm: self.arm.clone(),
            clock: self.clock.clone(),
        }
    }

    /// 推进物理模型 `dt`
    pub fn update(&self, dt: Duration) {
        self.indexer.update(dt);
        self.shooter.update(dt);
        self.arm.update(dt);
    }

    pub fn intake(&self) -> &Arc<SimIntake> {
        &self.intake
    }

    pub fn indexer(&self) -> &Arc<SimIndexer> {
        &self.indexer
    }

    pub fn shooter(&self) -> &Arc<SimShooter> {
        &self.shooter
    }

    pub fn arm(&self) -> &Arc<SimArm> {
        &self.arm
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }
}

/// 脚本事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteEvent {
    /// 在通道入口放入 note
    Insert,
    /// 覆盖光电门读数
    Detected(bool),
}

/// 按时间触发的 note 脚本
///
/// 事件按时间排序，[`NoteScript::apply`] 每周期调用一次，执行所有到期事件。
#[derive(Debug, Clone, Default)]
pub struct NoteScript {
    events: Vec<(Duration, NoteEvent)>,
    next: usize,
}

impl NoteScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, at: Duration, event: NoteEvent) -> Self {
        self.push(at, event);
        self
    }

    pub fn push(&mut self, at: Duration, event: NoteEvent) {
        let index = self.events.partition_point(|(t, _)| *t <= at);
        self.events.insert(index, (at, event));
    }

    /// 执行所有 `at <= now` 的未执行事件，返回执行的数量
    pub fn apply(&mut self, robot: &SimRobot, now: Duration) -> usize {
        let start = self.next;
        while let Some(&(at, event)) = self.events.get(self.next) {
            if at > now {
                break;
            }
            tracing::debug!("script {:?} @ {:?}", event, at);
            match event {
                NoteEvent::Insert => robot.indexer().insert_note(),
                NoteEvent::Detected(detected) => robot.indexer().set_note_detected(detected),
            }
            self.next += 1;
        }
        self.next - start
    }

    pub fn is_exhausted(&self) -> bool {
        self.next >= self.events.len()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
