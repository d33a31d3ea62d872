//! # Notebot Notes
//!
//! 持球（note）处理序列库：吸入、自动居中、吐出、射出，以及 shooter / arm
//! 的辅助命令和系统辨识测试。
//!
//! 所有序列都由 [`notebot_command`] 的组合原语构建，只依赖
//! [`notebot_subsystems`] 的 trait，不关心具体实现。
//!
//! # 示例
//!
//! ```rust
//! use notebot_command::{ManualClock, Scheduler};
//! use notebot_notes::NoteCommands;
//! use notebot_subsystems::sim::{SimConfig, SimRobot};
//!
//! let clock = ManualClock::new();
//! let robot = SimRobot::new(SimConfig::default(), clock.shared());
//! let notes = NoteCommands::new(robot.subsystems());
//!
//! let mut scheduler = Scheduler::new();
//! // 没有 note 时，射出命令立即完成
//! let handle = scheduler.schedule(notes.shoot(3000.0));
//! scheduler.run();
//! assert!(!scheduler.is_scheduled(handle));
//! assert!(robot.journal().is_empty());
//! ```

pub mod arm_commands;
pub mod config;
pub mod note_commands;
pub mod shooter_commands;
pub mod sysid;

pub use config::{ConfigError, NoteConfig, NoteTiming};
pub use note_commands::{
    AUTO_CENTER_NOTE_CONTINUATION, AUTO_CENTER_NOTE_STANDALONE, FEED_SETTLE, NoteCommands,
};
pub use sysid::{Direction, LabelledCommand, SysIdConfig, SysIdRoutine, SysIdSample, TestKind};
