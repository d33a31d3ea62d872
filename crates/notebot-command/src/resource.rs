//! 资源标识与需求集合
//!
//! 每个物理子系统（intake、indexer、shooter、arm）在进程启动时分配一个
//! [`ResourceId`]。命令只声明需求（[`ResourceSet`]），从不持有子系统本身；
//! 独占关系由调度器维护。

use smallvec::SmallVec;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_RESOURCE_ID: AtomicU32 = AtomicU32::new(1);

/// 资源标识（进程内唯一）
///
/// 比较和排序只看数字 id，名称仅用于日志。
#[derive(Clone, Copy)]
pub struct ResourceId {
    id: u32,
    name: &'static str,
}

impl ResourceId {
    /// 分配一个新的资源标识
    ///
    /// 每次调用都会得到不同的 id，即使名称相同。
    pub fn new(name: &'static str) -> Self {
        Self {
            id: NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed),
            name,
        }
    }

    /// 资源名称
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ResourceId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ResourceId {}

impl PartialOrd for ResourceId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ResourceId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl std::hash::Hash for ResourceId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// 拥有资源标识的对象（子系统）
pub trait Resource {
    /// 返回该子系统的资源标识
    fn resource(&self) -> ResourceId;
}

/// 需求集合
///
/// 有序、去重。绝大多数命令只需要 1-2 个资源，最多 4 个（整台机构），
/// 所以用 `SmallVec` 预留 4 个栈上位置，避免堆分配。
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ResourceSet {
    ids: SmallVec<[ResourceId; 4]>,
}

impl ResourceSet {
    /// 空集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入资源，已存在时返回 false
    pub fn insert(&mut self, id: ResourceId) -> bool {
        match self.ids.binary_search(&id) {
            Ok(_) => false,
            Err(pos) => {
                self.ids.insert(pos, id);
                true
            },
        }
    }

    /// 并入另一个集合
    pub fn extend_from(&mut self, other: &ResourceSet) {
        for id in other.iter() {
            self.insert(id);
        }
    }

    pub fn contains(&self, id: ResourceId) -> bool {
        self.ids.binary_search(&id).is_ok()
    }

    /// 两个集合是否有交集
    pub fn intersects(&self, other: &ResourceSet) -> bool {
        other.iter().any(|id| self.contains(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.ids.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<ResourceId> for ResourceSet {
    fn from_iter<I: IntoIterator<Item = ResourceId>>(iter: I) -> Self {
        let mut set = ResourceSet::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

impl fmt::Debug for ResourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.ids.iter()).finish()
    }
}
