//! # Notebot Command
//!
//! 命令组合引擎：把原子硬件动作组合成带时序、由传感器门控的行为序列。
//!
//! - [`command`]：命令契约（initialize / tick / is_finished / end）
//! - [`action`]：闭包驱动的原子动作与叶子构造函数
//! - [`composite`]：Sequence / Parallel / Race / Branch / Hold 组合
//! - [`cleanup`]：任意退出路径恰好执行一次的终结器
//! - [`scheduler`]：参考调度器（资源独占、抢占、默认命令）
//! - [`loop_runner`]：固定周期调度循环
//! - [`clock`]：可注入时间源
//!
//! # 示例
//!
//! ```rust
//! use notebot_command::prelude::*;
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let roller = ResourceId::new("roller");
//!
//! let command = sequence(vec![
//!     run_once(|| println!("roller on"), [roller]).boxed(),
//!     idle([roller]).with_timeout(Duration::from_millis(40), clock.shared()).boxed(),
//! ])
//! .finally_do(|_| println!("roller off"));
//!
//! let mut scheduler = Scheduler::new();
//! let handle = scheduler.schedule(command);
//! for _ in 0..3 {
//!     clock.advance(Duration::from_millis(20));
//!     scheduler.run();
//! }
//! assert!(!scheduler.is_scheduled(handle));
//! ```

pub mod action;
pub mod cleanup;
pub mod clock;
pub mod command;
pub mod composite;
mod error;
pub mod hooks;
pub mod loop_runner;
pub mod resource;
pub mod scheduler;

pub use action::Action;
pub use cleanup::Finally;
pub use clock::{Clock, ManualClock, MonotonicClock, SharedClock};
pub use command::{BoxedCommand, Command, CommandExt, Condition};
pub use composite::{Composite, CompositeKind};
pub use error::SchedulerError;
pub use hooks::{ChannelHook, HookManager, LifecycleEvent, LifecycleKind, SchedulerHook};
pub use loop_runner::{LoopConfig, LoopStats, Pacing, run_loop};
pub use resource::{Resource, ResourceId, ResourceSet};
pub use scheduler::{CommandHandle, Scheduler};

/// 常用导入
pub mod prelude {
    pub use crate::action::{
        Action, either, idle, none, parallel, run, run_once, sequence, wait, wait_until,
    };
    pub use crate::clock::{Clock, ManualClock, MonotonicClock, SharedClock};
    pub use crate::command::{BoxedCommand, Command, CommandExt};
    pub use crate::composite::Composite;
    pub use crate::resource::{Resource, ResourceId, ResourceSet};
    pub use crate::scheduler::{CommandHandle, Scheduler};
}
