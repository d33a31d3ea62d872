//! 命令定义和实现

pub mod config;
pub mod run;
pub mod sysid;

pub use config::ConfigCommand;
pub use run::{RunCommand, Sequence};
pub use sysid::SysIdCommand;
