//! 原子动作与叶子构造函数
//!
//! [`Action`] 由闭包组成：initialize / tick / 完成谓词 / end。闭包在构建时
//! 捕获固定的子系统句柄，不需要任何运行时反射。

use crate::clock::SharedClock;
use crate::command::{BoxedCommand, Command, CommandExt};
use crate::composite::Composite;
use crate::resource::{ResourceId, ResourceSet};
use std::borrow::Cow;
use std::time::Duration;

type Effect = Box<dyn FnMut()>;

/// 闭包驱动的原子动作
pub struct Action {
    name: Cow<'static, str>,
    requirements: ResourceSet,
    on_initialize: Option<Effect>,
    on_tick: Option<Effect>,
    finished_when: Box<dyn Fn() -> bool>,
    on_end: Option<Box<dyn FnMut(bool)>>,
}

impl Action {
    /// 创建一个永不自行结束、无副作用的动作
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        requirements: impl IntoIterator<Item = ResourceId>,
    ) -> Self {
        Self {
            name: name.into(),
            requirements: requirements.into_iter().collect(),
            on_initialize: None,
            on_tick: None,
            finished_when: Box::new(|| false),
            on_end: None,
        }
    }

    pub fn with_initialize(mut self, effect: impl FnMut() + 'static) -> Self {
        self.on_initialize = Some(Box::new(effect));
        self
    }

    pub fn with_tick(mut self, effect: impl FnMut() + 'static) -> Self {
        self.on_tick = Some(Box::new(effect));
        self
    }

    /// 完成谓词，只应读取传感器状态
    pub fn finished_when(mut self, predicate: impl Fn() -> bool + 'static) -> Self {
        self.finished_when = Box::new(predicate);
        self
    }

    pub fn with_end(mut self, effect: impl FnMut(bool) + 'static) -> Self {
        self.on_end = Some(Box::new(effect));
        self
    }

    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }
}

impl Command for Action {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &ResourceSet {
        &self.requirements
    }

    fn initialize(&mut self) {
        if let Some(effect) = self.on_initialize.as_mut() {
            effect();
        }
    }

    fn tick(&mut self) {
        if let Some(effect) = self.on_tick.as_mut() {
            effect();
        }
    }

    fn is_finished(&self) -> bool {
        (self.finished_when)()
    }

    fn end(&mut self, interrupted: bool) {
        if let Some(effect) = self.on_end.as_mut() {
            effect(interrupted);
        }
    }
}

/// 执行一次即完成
pub fn run_once(
    effect: impl FnMut() + 'static,
    requirements: impl IntoIterator<Item = ResourceId>,
) -> Action {
    Action::new("RunOnce", requirements)
        .with_initialize(effect)
        .finished_when(|| true)
}

/// 每周期执行，永不自行结束
pub fn run(
    effect: impl FnMut() + 'static,
    requirements: impl IntoIterator<Item = ResourceId>,
) -> Action {
    Action::new("Run", requirements).with_tick(effect)
}

/// 空操作，立即完成，无需求
pub fn none() -> Action {
    Action::new("None", []).finished_when(|| true)
}

/// 保持资源占有，不做任何事，永不自行结束
pub fn idle(requirements: impl IntoIterator<Item = ResourceId>) -> Composite {
    Composite::hold(requirements)
}

/// 等待条件成立，无需求
pub fn wait_until(condition: impl Fn() -> bool + 'static) -> Action {
    Action::new("WaitUntil", []).finished_when(condition)
}

/// 等待固定时长，无需求
pub fn wait(duration: Duration, clock: SharedClock) -> Composite {
    idle([]).with_timeout(duration, clock).with_name("Wait")
}

/// 顺序组合
pub fn sequence(children: Vec<BoxedCommand>) -> Composite {
    Composite::sequence(children)
}

/// 并行组合（全部完成才结束）
pub fn parallel(children: Vec<BoxedCommand>) -> Composite {
    Composite::parallel(children)
}

/// 条件分支（激活时求值一次）
pub fn either(
    on_true: BoxedCommand,
    on_false: BoxedCommand,
    condition: impl FnMut() -> bool + 'static,
) -> Composite {
    Composite::branch(Box::new(condition), on_true, on_false)
}
