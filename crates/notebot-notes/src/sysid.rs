//! # 系统辨识（SysId）
//!
//! 对可直接输出电压的机构做电压扫描，记录 (时间, 电压, 位置, 速度) 样本，
//! 用于离线拟合前馈参数。
//!
//! 每个机构有四个独立的测试命令：
//!
//! - `<name> Quasistatic Forward` / `<name> Quasistatic Reverse`：
//!   电压按 `ramp_rate * elapsed` 线性增加
//! - `<name> Dynamic Forward` / `<name> Dynamic Reverse`：恒定 `step_voltage`
//!
//! 测试在 `timeout` 后结束，任何退出路径都把电压置 0。只占用机构本身的
//! 资源。
//!
//! 样本通过 `crossbeam_channel` 发送；通道满或接收端关闭时丢弃样本并计数，
//! 不阻塞控制循环。

use crossbeam_channel::{Receiver, Sender, TrySendError};
use notebot_command::prelude::*;
use notebot_subsystems::SysIdMechanism;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{info, warn};

/// 测试参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SysIdConfig {
    /// 准静态斜坡（V/s）
    pub ramp_rate: f64,
    /// 动态阶跃电压（V）
    pub step_voltage: f64,
    /// 单次测试时长
    pub timeout: Duration,
}

impl Default for SysIdConfig {
    fn default() -> Self {
        Self {
            ramp_rate: 1.0,
            step_voltage: 7.0,
            timeout: Duration::from_secs(10),
        }
    }
}

/// 测试方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Reverse => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "Forward"),
            Direction::Reverse => write!(f, "Reverse"),
        }
    }
}

/// 测试类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestKind {
    Quasistatic,
    Dynamic,
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestKind::Quasistatic => write!(f, "Quasistatic"),
            TestKind::Dynamic => write!(f, "Dynamic"),
        }
    }
}

/// 单个样本
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SysIdSample {
    pub mechanism: &'static str,
    pub test: TestKind,
    pub direction: Direction,
    /// 自测试开始的时间
    pub time: Duration,
    /// 本周期输出的电压（V）
    pub voltage: f64,
    pub position: f64,
    pub velocity: f64,
}

/// 带标签的测试命令
pub struct LabelledCommand {
    pub label: String,
    pub command: BoxedCommand,
}

/// 一次测试的状态
///
/// 由该测试命令的闭包独占，不同测试之间互不共享。
#[derive(Debug, Clone, Copy, Default)]
struct RoutineState {
    started: Duration,
}

/// 某个机构的系统辨识测试集
pub struct SysIdRoutine {
    mechanism: Arc<dyn SysIdMechanism>,
    config: SysIdConfig,
    clock: SharedClock,
    sink: Sender<SysIdSample>,
    dropped: Arc<AtomicU64>,
}

impl SysIdRoutine {
    pub fn new(
        mechanism: Arc<dyn SysIdMechanism>,
        config: SysIdConfig,
        clock: SharedClock,
        sink: Sender<SysIdSample>,
    ) -> Self {
        Self {
            mechanism,
            config,
            clock,
            sink,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// 创建测试集和容量为 `capacity` 的样本通道
    pub fn with_channel(
        mechanism: Arc<dyn SysIdMechanism>,
        config: SysIdConfig,
        clock: SharedClock,
        capacity: usize,
    ) -> (Self, Receiver<SysIdSample>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        (Self::new(mechanism, config, clock, tx), rx)
    }

    pub fn config(&self) -> &SysIdConfig {
        &self.config
    }

    /// 被丢弃的样本数量
    pub fn dropped_samples(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn label(&self, test: TestKind, direction: Direction) -> String {
        format!("{} {} {}", self.mechanism.mechanism_name(), test, direction)
    }

    pub fn quasistatic(&self, direction: Direction) -> BoxedCommand {
        self.build(TestKind::Quasistatic, direction)
    }

    pub fn dynamic(&self, direction: Direction) -> BoxedCommand {
        self.build(TestKind::Dynamic, direction)
    }

    /// 全部四个测试命令
    pub fn commands(&self) -> Vec<LabelledCommand> {
        [
            (TestKind::Quasistatic, Direction::Forward),
            (TestKind::Quasistatic, Direction::Reverse),
            (TestKind::Dynamic, Direction::Forward),
            (TestKind::Dynamic, Direction::Reverse),
        ]
        .into_iter()
        .map(|(test, direction)| LabelledCommand {
            label: self.label(test, direction),
            command: self.build(test, direction),
        })
        .collect()
    }

    fn build(&self, test: TestKind, direction: Direction) -> BoxedCommand {
        let label = self.label(test, direction);
        let state = Rc::new(Cell::new(RoutineState::default()));
        let config = self.config;
        let name = self.mechanism.mechanism_name();

        let (start_state, start_clock, start_label) =
            (state.clone(), self.clock.clone(), label.clone());
        let (tick_state, tick_clock, tick_mechanism) =
            (state.clone(), self.clock.clone(), self.mechanism.clone());
        let (sink, dropped) = (self.sink.clone(), self.dropped.clone());
        let (stop_mechanism, stop_label) = (self.mechanism.clone(), label.clone());

        Action::new(label, [self.mechanism.resource()])
            .with_initialize(move || {
                info!("SysId: starting {}", start_label);
                start_state.set(RoutineState {
                    started: start_clock.now(),
                });
            })
            .with_tick(move || {
                let time = tick_clock.now().saturating_sub(tick_state.get().started);
                let magnitude = match test {
                    TestKind::Quasistatic => config.ramp_rate * time.as_secs_f64(),
                    TestKind::Dynamic => config.step_voltage,
                };
                let volts = direction.sign() * magnitude;
                tick_mechanism.set_voltage(volts);

                let sample = SysIdSample {
                    mechanism: name,
                    test,
                    direction,
                    time,
                    voltage: volts,
                    position: tick_mechanism.position(),
                    velocity: tick_mechanism.velocity(),
                };
                match sink.try_send(sample) {
                    Ok(()) => {},
                    Err(TrySendError::Full(_)) => {
                        dropped.fetch_add(1, Ordering::Relaxed);
                    },
                    Err(TrySendError::Disconnected(_)) => {
                        if dropped.fetch_add(1, Ordering::Relaxed) == 0 {
                            warn!("SysId: sample receiver closed, discarding samples");
                        }
                    },
                }
            })
            .with_timeout(config.timeout, self.clock.clone())
            .finally_do(move |interrupted| {
                stop_mechanism.set_voltage(0.0);
                info!("SysId: {} ended (interrupted: {})", stop_label, interrupted);
            })
            .boxed()
    }
}
