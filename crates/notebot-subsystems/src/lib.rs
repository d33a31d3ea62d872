//! # Notebot Subsystems
//!
//! 持球机构子系统抽象层，为命令库提供统一的动作与传感器接口。
//!
//! 所有动作都是一次性、非阻塞、幂等的调用（重复 `disable()` 与调用一次等价），
//! 传感器读取是同步的。方法只接收 `&self`，具体实现自行做内部可变性，
//! 这样命令闭包可以在构建时捕获 `Arc<dyn Trait>` 句柄。
//!
//! ## Feature Flags
//!
//! - `sim`（默认）：确定性仿真实现，见 [`sim`]
//! - `serde`：仿真参数序列化

use notebot_command::{Resource, SharedClock};
use std::sync::Arc;

#[cfg(feature = "sim")]
pub mod sim;

/// Intake 滚轮
pub trait Intake: Resource + Send + Sync {
    /// 正转（吸入）
    fn intake_in(&self);
    /// 反转（吐出）
    fn intake_out(&self);
    fn disable(&self);
}

/// Indexer 传送带与光电门（beam-break）
pub trait Indexer: Resource + Send + Sync {
    /// 向内输送
    fn intake(&self);
    /// 向外输送
    fn outtake(&self);
    /// 把 note 送入 shooter
    fn feed(&self);
    fn disable(&self);
    /// 光电门是否检测到 note
    fn is_note_detected(&self) -> bool;
}

/// Shooter 飞轮
pub trait Shooter: Resource + Send + Sync {
    /// 设置目标转速（RPM）并使能闭环
    fn set_rpm(&self, rpm: f64);
    fn disable(&self);
    /// 当前目标转速
    fn goal_rpm(&self) -> f64;
    /// 实际转速是否已收敛到目标
    fn at_goal_rpm(&self) -> bool;
}

/// Arm 俯仰关节
pub trait Arm: Resource + Send + Sync {
    /// 设置目标角度（度）
    fn set_goal_angle(&self, degrees: f64);
    fn disable(&self);
    fn at_goal_angle(&self) -> bool;
}

/// 可做系统辨识（电压扫描）的机构
///
/// 直接输出原始电压，并提供位置/速度测量。
pub trait SysIdMechanism: Resource + Send + Sync {
    /// 名称（用于命令标签和日志）
    fn mechanism_name(&self) -> &'static str;
    /// 输出原始电压（V），0 表示停止
    fn set_voltage(&self, volts: f64);
    /// 位置（机构单位，例如转数）
    fn position(&self) -> f64;
    /// 速度（机构单位/秒）
    fn velocity(&self) -> f64;
}

/// 子系统容器
///
/// 进程启动时创建一次，生命周期与进程相同。命令库只借用其中的句柄。
#[derive(Clone)]
pub struct Subsystems {
    pub intake: Arc<dyn Intake>,
    pub indexer: Arc<dyn Indexer>,
    pub shooter: Arc<dyn Shooter>,
    pub arm: Arc<dyn Arm>,
    /// 所有超时使用的时间源
    pub clock: SharedClock,
}

impl Subsystems {
    /// 全部禁用（进程退出、急停）
    pub fn disable_all(&self) {
        self.intake.disable();
        self.indexer.disable();
        self.shooter.disable();
        self.arm.disable();
    }
}
