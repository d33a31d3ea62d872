//! 清理保证
//!
//! [`Finally`] 给任意命令附加终结器。无论结束路径是正常完成、传感器提前
//! 退出、超时还是被抢占，终结器都在被包装命令的 `end` 之后执行，且每次
//! 激活恰好执行一次。
//!
//! 典型用途：序列以任何方式结束时，把 intake / indexer / shooter 电机置为
//! 禁用状态。

use crate::command::Command;
use crate::resource::ResourceSet;

/// 带终结器的命令
pub struct Finally<C> {
    inner: C,
    finalizer: Box<dyn FnMut(bool)>,
    active: bool,
}

impl<C: Command> Finally<C> {
    pub fn new(inner: C, finalizer: impl FnMut(bool) + 'static) -> Self {
        Self {
            inner,
            finalizer: Box::new(finalizer),
            active: false,
        }
    }
}

impl<C: Command> Command for Finally<C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn requirements(&self) -> &ResourceSet {
        self.inner.requirements()
    }

    fn initialize(&mut self) {
        self.active = true;
        self.inner.initialize();
    }

    fn tick(&mut self) {
        self.inner.tick();
    }

    fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    fn end(&mut self, interrupted: bool) {
        if !self.active {
            return;
        }
        self.active = false;
        self.inner.end(interrupted);
        (self.finalizer)(interrupted);
    }
}
