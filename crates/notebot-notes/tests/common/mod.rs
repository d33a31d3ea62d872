//! 测试基础设施
//!
//! 手动时钟 + 仿真机器人 + 参考调度器，按 20 ms 周期推进。

#![allow(dead_code)]

use notebot_command::{ChannelHook, Clock, LifecycleEvent, ManualClock, Scheduler};
use notebot_notes::NoteCommands;
use notebot_subsystems::sim::{SimAction, SimConfig, SimRobot};
use std::sync::Arc;
use std::time::Duration;

pub const DT: Duration = Duration::from_millis(20);

pub struct Rig {
    pub clock: ManualClock,
    pub robot: SimRobot,
    pub scheduler: Scheduler,
    pub notes: NoteCommands,
}

impl Rig {
    pub fn new() -> Self {
        let clock = ManualClock::new();
        let robot = SimRobot::new(SimConfig::default(), clock.shared());
        let notes = NoteCommands::new(robot.subsystems());
        Self {
            clock,
            robot,
            scheduler: Scheduler::new(),
            notes,
        }
    }

    /// 订阅调度器生命周期事件
    pub fn lifecycle(&mut self) -> crossbeam_channel::Receiver<LifecycleEvent> {
        let (hook, rx) = ChannelHook::new(256);
        self.scheduler.hooks_mut().add_hook(Arc::new(hook));
        rx
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// 推进一个周期：时钟、物理模型、调度器
    pub fn step(&mut self) {
        self.clock.advance(DT);
        self.robot.update(DT);
        self.scheduler.run();
    }

    pub fn steps(&mut self, cycles: usize) {
        for _ in 0..cycles {
            self.step();
        }
    }

    /// 推进到 `at`（含）
    pub fn run_until(&mut self, at: Duration) {
        while self.now() < at {
            self.step();
        }
    }

    pub fn note_detected(&self, detected: bool) {
        self.robot.indexer().set_note_detected(detected);
    }

    pub fn actions(&self) -> Vec<SimAction> {
        self.robot.journal().actions()
    }

    pub fn count(&self, action: SimAction) -> usize {
        self.actions().into_iter().filter(|a| *a == action).count()
    }

    /// `action` 第一次出现的时间
    pub fn first_at(&self, action: SimAction) -> Option<Duration> {
        self.robot
            .journal()
            .entries()
            .into_iter()
            .find(|e| e.action == action)
            .map(|e| e.at)
    }
}

pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}
