//! 组合算子
//!
//! 组合命令用一个带标签的枚举 [`CompositeKind`] 表示，每种组合自身也实现
//! [`Command`]，可以任意递归嵌套。
//!
//! | 类型 | 结束条件 | 中断时 |
//! |------|----------|--------|
//! | Sequence | 最后一个子命令完成 | 只结束当前活动子命令 |
//! | Parallel | 所有子命令完成 | 结束所有仍在运行的子命令 |
//! | Race | 主体完成 / until 成立 / 超时，取最先者 | 结束主体 |
//! | Branch | 被选中分支完成 | 结束被选中分支 |
//! | Hold | 从不 | - |
//!
//! # 需求集合
//!
//! 组合命令的需求是所有可达子命令需求的并集，在整个组合命令的生命周期内
//! 持续持有，而不仅仅是当前活动的子命令。这样其它命令无法在两个步骤之间
//! 抢走资源。

use crate::clock::SharedClock;
use crate::command::{BoxedCommand, Command, Condition};
use crate::resource::{ResourceId, ResourceSet};
use std::borrow::Cow;
use std::time::Duration;
use tracing::trace;

/// 超时状态
pub struct Timeout {
    duration: Duration,
    clock: SharedClock,
    started: Duration,
}

impl Timeout {
    fn new(duration: Duration, clock: SharedClock) -> Self {
        Self {
            duration,
            clock,
            started: Duration::ZERO,
        }
    }

    fn start(&mut self) {
        self.started = self.clock.now();
    }

    fn elapsed(&self) -> Duration {
        self.clock.now().saturating_sub(self.started)
    }

    fn expired(&self) -> bool {
        self.elapsed() >= self.duration
    }
}

/// 组合类型及其运行状态
pub enum CompositeKind {
    /// 按声明顺序依次执行
    Sequence {
        children: Vec<BoxedCommand>,
        index: usize,
    },
    /// 同时执行，全部完成才结束
    Parallel {
        children: Vec<BoxedCommand>,
        running: Vec<bool>,
    },
    /// 主体与 until 条件 / 超时竞速
    Race {
        body: BoxedCommand,
        until: Option<Condition>,
        timeout: Option<Timeout>,
        body_finished: bool,
        triggered: bool,
    },
    /// 激活时求值一次，之后完全委托给被选中的分支
    Branch {
        condition: Condition,
        on_true: BoxedCommand,
        on_false: BoxedCommand,
        selected: Option<bool>,
    },
    /// 只占有资源，永不结束
    Hold,
}

/// 组合命令
pub struct Composite {
    name: Cow<'static, str>,
    requirements: ResourceSet,
    kind: CompositeKind,
}

fn union_of<'a>(children: impl IntoIterator<Item = &'a BoxedCommand>) -> ResourceSet {
    let mut set = ResourceSet::new();
    for child in children {
        set.extend_from(child.requirements());
    }
    set
}

impl Composite {
    /// 顺序组合
    pub fn sequence(children: Vec<BoxedCommand>) -> Self {
        Self {
            name: Cow::Borrowed("Sequence"),
            requirements: union_of(&children),
            kind: CompositeKind::Sequence { children, index: 0 },
        }
    }

    /// 并行组合（AND-join）
    ///
    /// # Panics
    ///
    /// 子命令需求有重叠时 panic：两个同时运行的子命令不能驱动同一资源。
    pub fn parallel(children: Vec<BoxedCommand>) -> Self {
        let mut requirements = ResourceSet::new();
        for child in &children {
            assert!(
                !requirements.intersects(child.requirements()),
                "parallel children must have disjoint requirements: {} overlaps {:?}",
                child.name(),
                requirements
            );
            requirements.extend_from(child.requirements());
        }
        let running = vec![false; children.len()];
        Self {
            name: Cow::Borrowed("Parallel"),
            requirements,
            kind: CompositeKind::Parallel { children, running },
        }
    }

    /// 竞速组合（OR-join）
    ///
    /// `until` 与 `timeout` 可以同时给出，也可以都不给（此时等价于主体本身）。
    pub fn race(
        body: BoxedCommand,
        until: Option<Condition>,
        timeout: Option<(Duration, SharedClock)>,
    ) -> Self {
        Self {
            name: Cow::Owned(body.name().to_owned()),
            requirements: body.requirements().clone(),
            kind: CompositeKind::Race {
                body,
                until,
                timeout: timeout.map(|(duration, clock)| Timeout::new(duration, clock)),
                body_finished: false,
                triggered: false,
            },
        }
    }

    /// 条件分支
    ///
    /// 需求为两个分支的并集：资源在调度时就要占有，此时条件尚未求值。
    pub fn branch(condition: Condition, on_true: BoxedCommand, on_false: BoxedCommand) -> Self {
        let requirements = union_of([&on_true, &on_false]);
        Self {
            name: Cow::Borrowed("Branch"),
            requirements,
            kind: CompositeKind::Branch {
                condition,
                on_true,
                on_false,
                selected: None,
            },
        }
    }

    /// 占有资源的空闲命令
    pub fn hold(requirements: impl IntoIterator<Item = ResourceId>) -> Self {
        Self {
            name: Cow::Borrowed("Hold"),
            requirements: requirements.into_iter().collect(),
            kind: CompositeKind::Hold,
        }
    }

    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// 顺序组合当前活动子命令的下标（其它类型返回 `None`）
    pub fn active_index(&self) -> Option<usize> {
        match &self.kind {
            CompositeKind::Sequence { index, .. } => Some(*index),
            _ => None,
        }
    }
}

impl Command for Composite {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &ResourceSet {
        &self.requirements
    }

    fn initialize(&mut self) {
        match &mut self.kind {
            CompositeKind::Sequence { children, index } => {
                *index = 0;
                if let Some(first) = children.first_mut() {
                    first.initialize();
                }
            },
            CompositeKind::Parallel { children, running } => {
                for (child, running) in children.iter_mut().zip(running.iter_mut()) {
                    child.initialize();
                    *running = true;
                }
            },
            CompositeKind::Race {
                body,
                timeout,
                body_finished,
                triggered,
                ..
            } => {
                *body_finished = false;
                *triggered = false;
                if let Some(timeout) = timeout.as_mut() {
                    timeout.start();
                }
                body.initialize();
            },
            CompositeKind::Branch {
                condition,
                on_true,
                on_false,
                selected,
            } => {
                let choice = condition();
                trace!("{}: condition evaluated to {}", self.name, choice);
                *selected = Some(choice);
                if choice {
                    on_true.initialize();
                } else {
                    on_false.initialize();
                }
            },
            CompositeKind::Hold => {},
        }
    }

    fn tick(&mut self) {
        match &mut self.kind {
            CompositeKind::Sequence { children, index } => {
                let Some(current) = children.get_mut(*index) else {
                    return;
                };
                current.tick();
                if current.is_finished() {
                    current.end(false);
                    *index += 1;
                    if let Some(next) = children.get_mut(*index) {
                        trace!("{}: step {} -> {}", self.name, *index, next.name());
                        next.initialize();
                    }
                }
            },
            CompositeKind::Parallel { children, running } => {
                for (child, running) in children.iter_mut().zip(running.iter_mut()) {
                    if !*running {
                        continue;
                    }
                    child.tick();
                    if child.is_finished() {
                        child.end(false);
                        *running = false;
                    }
                }
            },
            CompositeKind::Race {
                body,
                until,
                timeout,
                body_finished,
                triggered,
            } => {
                if *body_finished || *triggered {
                    return;
                }
                body.tick();
                if body.is_finished() {
                    *body_finished = true;
                    return;
                }
                if let Some(until) = until.as_mut()
                    && until()
                {
                    trace!("{}: until condition met", self.name);
                    *triggered = true;
                } else if let Some(timeout) = timeout.as_ref()
                    && timeout.expired()
                {
                    trace!("{}: timed out after {:?}", self.name, timeout.elapsed());
                    *triggered = true;
                }
            },
            CompositeKind::Branch {
                on_true,
                on_false,
                selected,
                ..
            } => match selected {
                Some(true) => on_true.tick(),
                Some(false) => on_false.tick(),
                None => {},
            },
            CompositeKind::Hold => {},
        }
    }

    fn is_finished(&self) -> bool {
        match &self.kind {
            CompositeKind::Sequence { children, index } => *index >= children.len(),
            CompositeKind::Parallel { running, .. } => !running.iter().any(|r| *r),
            CompositeKind::Race {
                body_finished,
                triggered,
                ..
            } => *body_finished || *triggered,
            CompositeKind::Branch {
                on_true,
                on_false,
                selected,
                ..
            } => match selected {
                Some(true) => on_true.is_finished(),
                Some(false) => on_false.is_finished(),
                None => false,
            },
            CompositeKind::Hold => false,
        }
    }

    fn end(&mut self, interrupted: bool) {
        match &mut self.kind {
            CompositeKind::Sequence { children, index } => {
                if interrupted && let Some(current) = children.get_mut(*index) {
                    current.end(true);
                }
                *index = children.len();
            },
            CompositeKind::Parallel { children, running } => {
                for (child, running) in children.iter_mut().zip(running.iter_mut()) {
                    if *running {
                        child.end(true);
                        *running = false;
                    }
                }
            },
            CompositeKind::Race {
                body,
                body_finished,
                ..
            } => {
                body.end(!*body_finished);
            },
            CompositeKind::Branch {
                on_true,
                on_false,
                selected,
                ..
            } => match selected.take() {
                Some(true) => on_true.end(interrupted),
                Some(false) => on_false.end(interrupted),
                None => {},
            },
            CompositeKind::Hold => {},
        }
    }
}
