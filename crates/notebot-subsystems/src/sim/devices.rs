//! 仿真子系统
//!
//! 每个设备都用 `parking_lot::Mutex` 做内部可变性，可以被多个命令
//! 闭包共享。物理模型由 [`SimRobot::update`](super::SimRobot::update) 推进；
//! 测试里也可以不推进模型，直接用 `force_*` / `set_note_detected` 设定传感器。

use super::SimConfig;
use super::journal::{Journal, SimAction};
use crate::{Arm, Indexer, Intake, Shooter, SysIdMechanism};
use notebot_command::{Resource, ResourceId};
use parking_lot::Mutex;
use std::time::Duration;

/// 滚轮状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RollerState {
    #[default]
    Disabled,
    Forward,
    Reverse,
}

/// 传送带状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BeltState {
    #[default]
    Disabled,
    Intake,
    Outtake,
    Feed,
}

// ==================== Intake ====================

pub struct SimIntake {
    id: ResourceId,
    state: Mutex<RollerState>,
    journal: Journal,
}

impl SimIntake {
    pub(crate) fn new(journal: Journal) -> Self {
        Self {
            id: ResourceId::new("intake"),
            state: Mutex::new(RollerState::Disabled),
            journal,
        }
    }

    pub fn state(&self) -> RollerState {
        *self.state.lock()
    }

    fn apply(&self, state: RollerState, action: SimAction) {
        *self.state.lock() = state;
        self.journal.record(action);
    }
}

impl Resource for SimIntake {
    fn resource(&self) -> ResourceId {
        self.id
    }
}

impl Intake for SimIntake {
    fn intake_in(&self) {
        self.apply(RollerState::Forward, SimAction::IntakeIn);
    }

    fn intake_out(&self) {
        self.apply(RollerState::Reverse, SimAction::IntakeOut);
    }

    fn disable(&self) {
        self.apply(RollerState::Disabled, SimAction::IntakeDisable);
    }
}

// ==================== Indexer ====================

#[derive(Debug, Default)]
struct IndexerModel {
    belt: BeltState,
    /// note 沿通道的位置（米），`None` 表示没有 note
    note_position: Option<f64>,
    /// 测试用的传感器覆盖值
    sensor_override: Option<bool>,
}

pub struct SimIndexer {
    id: ResourceId,
    model: Mutex<IndexerModel>,
    config: SimConfig,
    journal: Journal,
}

impl SimIndexer {
    pub(crate) fn new(config: SimConfig, journal: Journal) -> Self {
        Self {
            id: ResourceId::new("indexer"),
            model: Mutex::new(IndexerModel::default()),
            config,
            journal,
        }
    }

    pub fn state(&self) -> BeltState {
        self.model.lock().belt
    }

    /// 直接设定光电门读数（覆盖 note 位置模型）
    pub fn set_note_detected(&self, detected: bool) {
        self.model.lock().sensor_override = Some(detected);
    }

    /// 取消覆盖，恢复位置模型
    pub fn clear_sensor_override(&self) {
        self.model.lock().sensor_override = None;
    }

    /// 在通道入口放入一个 note
    pub fn insert_note(&self) {
        self.model.lock().note_position = Some(0.0);
    }

    pub fn note_position(&self) -> Option<f64> {
        self.model.lock().note_position
    }

    pub(crate) fn update(&self, dt: Duration) {
        let mut model = self.model.lock();
        let Some(position) = model.note_position else {
            return;
        };
        let dt = dt.as_secs_f64();
        let next = match model.belt {
            BeltState::Disabled => position,
            BeltState::Intake => position + self.config.belt_speed * dt,
            BeltState::Outtake => position - self.config.belt_speed * dt,
            BeltState::Feed => position + self.config.feed_speed * dt,
        };
        model.note_position = if next < 0.0 {
            tracing::debug!("sim: note ejected");
            None
        } else if next >= self.config.shooter_position {
            tracing::debug!("sim: note left through shooter");
            None
        } else {
            Some(next)
        };
    }

    fn apply(&self, belt: BeltState, action: SimAction) {
        self.model.lock().belt = belt;
        self.journal.record(action);
    }
}

impl Resource for SimIndexer {
    fn resource(&self) -> ResourceId {
        self.id
    }
}

impl Indexer for SimIndexer {
    fn intake(&self) {
        self.apply(BeltState::Intake, SimAction::IndexerIntake);
    }

    fn outtake(&self) {
        self.apply(BeltState::Outtake, SimAction::IndexerOuttake);
    }

    fn feed(&self) {
        self.apply(BeltState::Feed, SimAction::IndexerFeed);
    }

    fn disable(&self) {
        self.apply(BeltState::Disabled, SimAction::IndexerDisable);
    }

    fn is_note_detected(&self) -> bool {
        let model = self.model.lock();
        if let Some(detected) = model.sensor_override {
            return detected;
        }
        let (lo, hi) = self.config.sensor_window;
        model.note_position.is_some_and(|p| p >= lo && p <= hi)
    }
}

// ==================== Shooter ====================

#[derive(Debug, Default)]
struct ShooterModel {
    enabled: bool,
    goal_rpm: f64,
    rpm: f64,
    /// 原始电压输出（系统辨识），优先于闭环
    voltage: Option<f64>,
    rotations: f64,
}

pub struct SimShooter {
    id: ResourceId,
    model: Mutex<ShooterModel>,
    config: SimConfig,
    journal: Journal,
}

impl SimShooter {
    pub(crate) fn new(config: SimConfig, journal: Journal) -> Self {
        Self {
            id: ResourceId::new("shooter"),
            model: Mutex::new(ShooterModel::default()),
            config,
            journal,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.model.lock().enabled
    }

    pub fn rpm(&self) -> f64 {
        self.model.lock().rpm
    }

    /// 直接设定实际转速
    pub fn force_rpm(&self, rpm: f64) {
        self.model.lock().rpm = rpm;
    }

    pub(crate) fn update(&self, dt: Duration) {
        let mut model = self.model.lock();
        let dt = dt.as_secs_f64();
        let target = match model.voltage {
            Some(volts) => volts * self.config.rpm_per_volt,
            None if model.enabled => model.goal_rpm,
            None => 0.0,
        };
        let max_step = self.config.rpm_accel * dt;
        let delta = (target - model.rpm).clamp(-max_step, max_step);
        model.rpm += delta;
        model.rotations += model.rpm / 60.0 * dt;
    }
}

impl Resource for SimShooter {
    fn resource(&self) -> ResourceId {
        self.id
    }
}

impl Shooter for SimShooter {
    fn set_rpm(&self, rpm: f64) {
        {
            let mut model = self.model.lock();
            model.enabled = true;
            model.goal_rpm = rpm;
            model.voltage = None;
        }
        self.journal.record(SimAction::ShooterSetRpm(rpm));
    }

    fn disable(&self) {
        {
            let mut model = self.model.lock();
            model.enabled = false;
            model.voltage = None;
        }
        self.journal.record(SimAction::ShooterDisable);
    }

    fn goal_rpm(&self) -> f64 {
        self.model.lock().goal_rpm
    }

    fn at_goal_rpm(&self) -> bool {
        let model = self.model.lock();
        model.enabled && (model.rpm - model.goal_rpm).abs() <= self.config.rpm_tolerance
    }
}

impl SysIdMechanism for SimShooter {
    fn mechanism_name(&self) -> &'static str {
        "Shooter"
    }

    fn set_voltage(&self, volts: f64) {
        {
            let mut model = self.model.lock();
            model.enabled = false;
            model.voltage = Some(volts);
        }
        self.journal.record(SimAction::ShooterVoltage(volts));
    }

    fn position(&self) -> f64 {
        self.model.lock().rotations
    }

    fn velocity(&self) -> f64 {
        self.model.lock().rpm / 60.0
    }
}

// ==================== Arm ====================

#[derive(Debug, Default)]
struct ArmModel {
    enabled: bool,
    goal: f64,
    angle: f64,
}

pub struct SimArm {
    id: ResourceId,
    model: Mutex<ArmModel>,
    config: SimConfig,
    journal: Journal,
}

impl SimArm {
    pub(crate) fn new(config: SimConfig, journal: Journal) -> Self {
        Self {
            id: ResourceId::new("arm"),
            model: Mutex::new(ArmModel::default()),
            config,
            journal,
        }
    }

    pub fn angle(&self) -> f64 {
        self.model.lock().angle
    }

    pub fn goal_angle(&self) -> f64 {
        self.model.lock().goal
    }

    /// 直接设定实际角度
    pub fn force_angle(&self, degrees: f64) {
        self.model.lock().angle = degrees;
    }

    pub(crate) fn update(&self, dt: Duration) {
        let mut model = self.model.lock();
        if !model.enabled {
            return;
        }
        let max_step = self.config.arm_speed * dt.as_secs_f64();
        let delta = (model.goal - model.angle).clamp(-max_step, max_step);
        model.angle += delta;
    }
}

impl Resource for SimArm {
    fn resource(&self) -> ResourceId {
        self.id
    }
}

impl Arm for SimArm {
    fn set_goal_angle(&self, degrees: f64) {
        {
            let mut model = self.model.lock();
            model.enabled = true;
            model.goal = degrees;
        }
        self.journal.record(SimAction::ArmSetGoal(degrees));
    }

    fn disable(&self) {
        self.model.lock().enabled = false;
        self.journal.record(SimAction::ArmDisable);
    }

    fn at_goal_angle(&self) -> bool {
        let model = self.model.lock();
        model.enabled && (model.angle - model.goal).abs() <= self.config.angle_tolerance
    }
}
