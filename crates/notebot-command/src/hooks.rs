//! 钩子系统（Hook System）
//!
//! 在命令生命周期转换（initialize / 完成 / 中断）时触发自定义回调，
//! 用于遥测和测试日志。
//!
//! # 使用示例
//!
//! ```rust
//! use notebot_command::hooks::{ChannelHook, SchedulerHook};
//! use notebot_command::scheduler::Scheduler;
//! use notebot_command::action::none;
//! use std::sync::Arc;
//!
//! let mut scheduler = Scheduler::new();
//! let (hook, rx) = ChannelHook::new(64);
//! scheduler.hooks_mut().add_hook(Arc::new(hook));
//!
//! scheduler.schedule(none());
//! scheduler.run();
//! assert_eq!(rx.try_iter().count(), 2); // initialized + finished
//! ```

use crate::scheduler::CommandHandle;
use crossbeam_channel::{Receiver, Sender, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// 生命周期转换类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleKind {
    /// `initialize()` 即将执行
    Initialized,
    /// `is_finished()` 为真，已 `end(false)`
    Finished,
    /// 被抢占或取消，已 `end(true)`
    Interrupted,
}

/// 生命周期事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    /// 调度周期序号
    pub cycle: u64,
    pub handle: CommandHandle,
    pub name: String,
    pub kind: LifecycleKind,
}

/// 生命周期回调 Trait
///
/// 回调在调度线程上同步执行，不应阻塞。
pub trait SchedulerHook {
    fn on_event(&self, event: &LifecycleEvent);
}

/// 钩子管理器
#[derive(Default)]
pub struct HookManager {
    hooks: Vec<Arc<dyn SchedulerHook>>,
}

impl HookManager {
    #[must_use]
    pub const fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    pub fn add_hook(&mut self, hook: Arc<dyn SchedulerHook>) {
        self.hooks.push(hook);
    }

    /// 移除所有钩子
    pub fn clear(&mut self) {
        self.hooks.clear();
    }

    /// 触发所有钩子
    pub fn trigger_all(&self, event: &LifecycleEvent) {
        for hook in self.hooks.iter() {
            hook.on_event(event);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

/// 通过有界 channel 转发事件的钩子
///
/// channel 满时丢弃事件并计数，不阻塞调度周期。
pub struct ChannelHook {
    tx: Sender<LifecycleEvent>,
    dropped: Arc<AtomicU64>,
}

impl ChannelHook {
    /// 创建钩子和对应的接收端
    pub fn new(capacity: usize) -> (Self, Receiver<LifecycleEvent>) {
        let (tx, rx) = bounded(capacity);
        (
            Self {
                tx,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            rx,
        )
    }

    /// 丢弃事件计数器
    pub fn dropped_counter(&self) -> Arc<AtomicU64> {
        self.dropped.clone()
    }
}

impl SchedulerHook for ChannelHook {
    fn on_event(&self, event: &LifecycleEvent) {
        if self.tx.try_send(event.clone()).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: LifecycleKind) -> LifecycleEvent {
        LifecycleEvent {
            cycle: 1,
            handle: CommandHandle::from_raw(7),
            name: "Intake".to_string(),
            kind,
        }
    }

    #[test]
    fn test_hook_manager_add_and_clear() {
        let mut hooks = HookManager::new();
        assert!(hooks.is_empty());

        let (hook, _rx) = ChannelHook::new(4);
        hooks.add_hook(Arc::new(hook));
        assert_eq!(hooks.len(), 1);

        hooks.clear();
        assert!(hooks.is_empty());
    }

    #[test]
    fn test_hook_manager_trigger_all() {
        let mut hooks = HookManager::new();
        let (hook, rx) = ChannelHook::new(4);
        hooks.add_hook(Arc::new(hook));

        hooks.trigger_all(&event(LifecycleKind::Initialized));

        let received = rx.try_recv().expect("event forwarded");
        assert_eq!(received.kind, LifecycleKind::Initialized);
        assert_eq!(received.name, "Intake");
    }

    #[test]
    fn test_channel_hook_counts_dropped_events() {
        let (hook, _rx) = ChannelHook::new(1);
        let dropped = hook.dropped_counter();

        hook.on_event(&event(LifecycleKind::Initialized));
        hook.on_event(&event(LifecycleKind::Finished));

        assert_eq!(dropped.load(Ordering::Relaxed), 1);
    }
}
