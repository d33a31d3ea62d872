//! 参考调度器
//!
//! 单线程、协作式、固定周期。每个周期对所有活动命令调用一次
//! `tick()` + `is_finished()`，并维护资源独占表。
//!
//! # 抢占规则
//!
//! 调度一个新命令时，若它的需求与某个活动命令重叠，先中断该活动命令
//! （`end(true)`，包括其内部所有清理），然后才执行新命令的
//! `initialize()`。没有优先级概念：最近调度的命令赢得资源。
//!
//! # 默认命令
//!
//! 每个资源可以绑定一个默认命令。周期末尾，所有无人占有的资源会调度其
//! 默认命令；Hold 组合正是靠占有资源来压制默认命令。
//!
//! # 示例
//!
//! ```rust
//! use notebot_command::action::{idle, run_once};
//! use notebot_command::resource::ResourceId;
//! use notebot_command::scheduler::Scheduler;
//!
//! let indexer = ResourceId::new("indexer");
//! let mut scheduler = Scheduler::new();
//!
//! let first = scheduler.schedule(idle([indexer]));
//! let second = scheduler.schedule(run_once(|| {}, [indexer]));
//!
//! // 后调度的命令抢占了 indexer
//! assert!(!scheduler.is_scheduled(first));
//! assert_eq!(scheduler.owner_of(indexer), Some(second));
//! ```

use crate::command::{BoxedCommand, Command};
use crate::error::SchedulerError;
use crate::hooks::{HookManager, LifecycleEvent, LifecycleKind};
use crate::resource::ResourceId;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::{debug, info, trace};

/// 已调度命令的句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandHandle(u64);

impl CommandHandle {
    /// 从原始 id 构造（测试、日志回放用）
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for CommandHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct ScheduledCommand {
    handle: CommandHandle,
    command: BoxedCommand,
    default_for: Option<ResourceId>,
}

/// 参考调度器
pub struct Scheduler {
    scheduled: Vec<ScheduledCommand>,
    owners: HashMap<ResourceId, CommandHandle>,
    /// `None` 表示默认命令当前正在运行
    defaults: BTreeMap<ResourceId, Option<BoxedCommand>>,
    hooks: HookManager,
    next_handle: u64,
    cycle: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            scheduled: Vec::new(),
            owners: HashMap::new(),
            defaults: BTreeMap::new(),
            hooks: HookManager::new(),
            next_handle: 1,
            cycle: 0,
        }
    }

    pub fn hooks_mut(&mut self) -> &mut HookManager {
        &mut self.hooks
    }

    /// 已执行的周期数
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// 调度命令
    ///
    /// 与其需求重叠的活动命令会先被中断。
    pub fn schedule(&mut self, command: impl Command + 'static) -> CommandHandle {
        self.schedule_boxed(Box::new(command), None)
    }

    fn schedule_boxed(
        &mut self,
        mut command: BoxedCommand,
        default_for: Option<ResourceId>,
    ) -> CommandHandle {
        let handle = CommandHandle(self.next_handle);
        self.next_handle += 1;

        let mut conflicts: Vec<CommandHandle> = command
            .requirements()
            .iter()
            .filter_map(|resource| self.owners.get(&resource).copied())
            .collect();
        conflicts.sort_unstable();
        conflicts.dedup();

        for owner in conflicts {
            debug!(
                "Command {} preempts {} on shared resources",
                command.name(),
                owner
            );
            self.interrupt(owner);
        }

        info!(
            "Scheduling {} {} requiring {:?}",
            command.name(),
            handle,
            command.requirements()
        );
        self.emit(handle, command.name(), LifecycleKind::Initialized);
        command.initialize();

        for resource in command.requirements().iter() {
            self.owners.insert(resource, handle);
        }
        self.scheduled.push(ScheduledCommand {
            handle,
            command,
            default_for,
        });
        handle
    }

    /// 执行一个调度周期
    pub fn run(&mut self) {
        self.cycle += 1;
        trace!("Scheduler cycle {}", self.cycle);

        let mut scheduled = std::mem::take(&mut self.scheduled);
        let mut still_running = Vec::with_capacity(scheduled.len());
        for mut entry in scheduled.drain(..) {
            entry.command.tick();
            if entry.command.is_finished() {
                entry.command.end(false);
                debug!("Command {} {} finished", entry.command.name(), entry.handle);
                self.emit(entry.handle, entry.command.name(), LifecycleKind::Finished);
                self.release(entry);
            } else {
                still_running.push(entry);
            }
        }
        // 周期内不会有新命令加入（命令无法访问调度器），直接放回
        self.scheduled = still_running;

        self.schedule_defaults();
    }

    /// 取消命令，返回它此前是否在调度中
    pub fn cancel(&mut self, handle: CommandHandle) -> bool {
        self.interrupt(handle)
    }

    /// 取消所有命令（包括正在运行的默认命令）
    pub fn cancel_all(&mut self) {
        let handles: Vec<_> = self.scheduled.iter().map(|e| e.handle).collect();
        for handle in handles {
            self.interrupt(handle);
        }
    }

    pub fn is_scheduled(&self, handle: CommandHandle) -> bool {
        self.scheduled.iter().any(|e| e.handle == handle)
    }

    /// 当前占有资源的命令
    pub fn owner_of(&self, resource: ResourceId) -> Option<CommandHandle> {
        self.owners.get(&resource).copied()
    }

    /// 活动命令的名称
    pub fn name_of(&self, handle: CommandHandle) -> Option<&str> {
        self.scheduled
            .iter()
            .find(|e| e.handle == handle)
            .map(|e| e.command.name())
    }

    /// 活动命令数量
    pub fn len(&self) -> usize {
        self.scheduled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scheduled.is_empty()
    }

    /// 为资源绑定默认命令
    ///
    /// 默认命令必须恰好需求该资源。若旧的默认命令正在运行，先将其中断。
    pub fn set_default_command(
        &mut self,
        resource: ResourceId,
        command: impl Command + 'static,
    ) -> Result<(), SchedulerError> {
        let requirements = command.requirements();
        if requirements.len() != 1 || !requirements.contains(resource) {
            return Err(SchedulerError::DefaultCommandRequirements {
                resource,
                actual: format!("{:?}", requirements),
            });
        }

        if let Some(running) = self
            .scheduled
            .iter()
            .find(|e| e.default_for == Some(resource))
            .map(|e| e.handle)
        {
            self.interrupt(running);
        }
        self.defaults.insert(resource, Some(Box::new(command)));
        Ok(())
    }

    /// 移除资源的默认命令
    pub fn remove_default_command(&mut self, resource: ResourceId) {
        if let Some(running) = self
            .scheduled
            .iter()
            .find(|e| e.default_for == Some(resource))
            .map(|e| e.handle)
        {
            self.interrupt(running);
        }
        self.defaults.remove(&resource);
    }

    fn schedule_defaults(&mut self) {
        let idle: Vec<ResourceId> = self
            .defaults
            .iter()
            .filter(|(resource, slot)| slot.is_some() && !self.owners.contains_key(*resource))
            .map(|(resource, _)| *resource)
            .collect();

        for resource in idle {
            if let Some(command) = self.defaults.get_mut(&resource).and_then(Option::take) {
                trace!("Scheduling default command for {}", resource);
                self.schedule_boxed(command, Some(resource));
            }
        }
    }

    fn interrupt(&mut self, handle: CommandHandle) -> bool {
        let Some(pos) = self.scheduled.iter().position(|e| e.handle == handle) else {
            return false;
        };
        let mut entry = self.scheduled.remove(pos);
        entry.command.end(true);
        info!("Command {} {} interrupted", entry.command.name(), handle);
        self.emit(handle, entry.command.name(), LifecycleKind::Interrupted);
        self.release(entry);
        true
    }

    fn release(&mut self, entry: ScheduledCommand) {
        for resource in entry.command.requirements().iter() {
            if self.owners.get(&resource) == Some(&entry.handle) {
                self.owners.remove(&resource);
            }
        }
        if let Some(resource) = entry.default_for
            && let Some(slot) = self.defaults.get_mut(&resource)
            && slot.is_none()
        {
            *slot = Some(entry.command);
        }
    }

    fn emit(&self, handle: CommandHandle, name: &str, kind: LifecycleKind) {
        if self.hooks.is_empty() {
            return;
        }
        self.hooks.trigger_all(&LifecycleEvent {
            cycle: self.cycle,
            handle,
            name: name.to_owned(),
            kind,
        });
    }
}
