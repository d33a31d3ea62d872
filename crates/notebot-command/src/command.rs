//! 命令契约
//!
//! [`Command`] 是最小可调度单元，生命周期固定为：
//!
//! ```text
//! initialize() ─► tick() ─► is_finished()? ─► ... ─► end(interrupted)
//! ```
//!
//! - `initialize` 总是先于任何 `tick`
//! - 每个调度周期 `tick` 最多调用一次，随后立即查询 `is_finished`
//! - `end` 在丢弃前必定调用一次；非 `is_finished()` 导致的结束 `interrupted = true`
//! - `end` 之后可以再次 `initialize`，命令从头开始（默认命令依赖这一点）
//!
//! 组合算子见 [`composite`](crate::composite)，清理保证见
//! [`cleanup`](crate::cleanup)。

use crate::cleanup::Finally;
use crate::clock::SharedClock;
use crate::composite::Composite;
use crate::resource::ResourceSet;
use std::time::Duration;

/// 可调度命令
pub trait Command {
    /// 命令名称（日志、钩子用）
    fn name(&self) -> &str;

    /// 需求集合，生命周期内不变
    fn requirements(&self) -> &ResourceSet;

    /// 激活时调用一次
    fn initialize(&mut self) {}

    /// 每个调度周期调用一次
    fn tick(&mut self) {}

    /// 是否已完成（每周期 tick 之后查询）
    fn is_finished(&self) -> bool {
        false
    }

    /// 结束时调用一次
    fn end(&mut self, interrupted: bool) {
        let _ = interrupted;
    }
}

/// 装箱命令
pub type BoxedCommand = Box<dyn Command>;

/// 条件谓词（每周期最多求值一次）
pub type Condition = Box<dyn FnMut() -> bool>;

impl<C: Command + ?Sized> Command for Box<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn requirements(&self) -> &ResourceSet {
        (**self).requirements()
    }

    fn initialize(&mut self) {
        (**self).initialize()
    }

    fn tick(&mut self) {
        (**self).tick()
    }

    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }

    fn end(&mut self, interrupted: bool) {
        (**self).end(interrupted)
    }
}

/// 组合适配器
///
/// 每个适配器都只是显式构造一棵组合树，与直接调用
/// [`Composite`] 的构造函数等价。
pub trait CommandExt: Command + Sized + 'static {
    /// 装箱
    fn boxed(self) -> BoxedCommand {
        Box::new(self)
    }

    /// 与外部条件竞速，条件成立即结束
    fn until(self, condition: impl FnMut() -> bool + 'static) -> Composite {
        Composite::race(self.boxed(), Some(Box::new(condition)), None)
    }

    /// 与超时竞速，自 initialize 起经过 `timeout` 即结束
    fn with_timeout(self, timeout: Duration, clock: SharedClock) -> Composite {
        Composite::race(self.boxed(), None, Some((timeout, clock)))
    }

    /// 附加终结器，任何退出路径都恰好执行一次
    fn finally_do(self, finalizer: impl FnMut(bool) + 'static) -> Finally<Self> {
        Finally::new(self, finalizer)
    }

    /// 之后顺序执行 `next`
    fn and_then(self, next: impl Command + 'static) -> Composite {
        Composite::sequence(vec![self.boxed(), Box::new(next)])
    }
}

impl<C: Command + Sized + 'static> CommandExt for C {}
