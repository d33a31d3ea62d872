//! 仿真动作日志
//!
//! 每一次命令式调用都带时间戳记录下来（包括重复的 `disable()`），
//! 测试据此校验动作顺序与最终状态。
//!
//! 日志有容量上限，写满后丢弃最旧的条目并计数，长时间的实时运行
//! 不会无限增长。

use notebot_command::SharedClock;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// 默认容量（条目数）
pub const DEFAULT_JOURNAL_CAPACITY: usize = 65_536;

/// 仿真子系统收到的动作
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimAction {
    IntakeIn,
    IntakeOut,
    IntakeDisable,
    IndexerIntake,
    IndexerOuttake,
    IndexerFeed,
    IndexerDisable,
    ShooterSetRpm(f64),
    ShooterDisable,
    ShooterVoltage(f64),
    ArmSetGoal(f64),
    ArmDisable,
}

/// 日志条目
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    pub at: Duration,
    pub action: SimAction,
}

/// 共享动作日志
#[derive(Clone)]
pub struct Journal {
    entries: Arc<Mutex<VecDeque<JournalEntry>>>,
    capacity: usize,
    evicted: Arc<AtomicU64>,
    clock: SharedClock,
}

impl Journal {
    pub fn new(clock: SharedClock) -> Self {
        Self::with_capacity(clock, DEFAULT_JOURNAL_CAPACITY)
    }

    /// 指定容量（至少 1）
    pub fn with_capacity(clock: SharedClock, capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::new())),
            capacity: capacity.max(1),
            evicted: Arc::new(AtomicU64::new(0)),
            clock,
        }
    }

    pub(crate) fn record(&self, action: SimAction) {
        let at = self.clock.now();
        tracing::trace!("sim {:?} @ {:?}", action, at);
        let mut entries = self.entries.lock();
        if entries.len() >= self.capacity {
            entries.pop_front();
            if self.evicted.fetch_add(1, Ordering::Relaxed) == 0 {
                tracing::warn!("sim journal full ({} entries), evicting oldest", self.capacity);
            }
        }
        entries.push_back(JournalEntry { at, action });
    }

    /// 因容量上限被丢弃的条目数
    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    /// 所有条目（快照）
    pub fn entries(&self) -> Vec<JournalEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    /// 所有动作（不含时间戳）
    pub fn actions(&self) -> Vec<SimAction> {
        self.entries.lock().iter().map(|e| e.action).collect()
    }

    /// 是否出现过满足条件的动作
    pub fn contains(&self, predicate: impl Fn(&SimAction) -> bool) -> bool {
        self.entries.lock().iter().any(|e| predicate(&e.action))
    }

    /// 满足条件的最后一个动作
    pub fn last_matching(&self, predicate: impl Fn(&SimAction) -> bool) -> Option<JournalEntry> {
        self.entries
            .lock()
            .iter()
            .rev()
            .find(|e| predicate(&e.action))
            .cloned()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notebot_command::ManualClock;

    #[test]
    fn test_journal_records_with_timestamps() {
        let clock = ManualClock::new();
        let journal = Journal::new(clock.shared());

        journal.record(SimAction::IntakeIn);
        clock.advance(Duration::from_millis(20));
        journal.record(SimAction::IntakeDisable);

        let entries = journal.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].at, Duration::from_millis(20));
        assert!(journal.contains(|a| *a == SimAction::IntakeIn));
        assert_eq!(
            journal.last_matching(|a| matches!(a, SimAction::IntakeIn)).map(|e| e.at),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn test_journal_evicts_oldest_when_full() {
        let clock = ManualClock::new();
        let journal = Journal::with_capacity(clock.shared(), 3);

        for degrees in [10.0, 20.0, 30.0, 40.0, 50.0] {
            journal.record(SimAction::ArmSetGoal(degrees));
        }

        assert_eq!(journal.len(), 3);
        assert_eq!(journal.evicted(), 2);
        assert_eq!(
            journal.actions(),
            vec![
                SimAction::ArmSetGoal(30.0),
                SimAction::ArmSetGoal(40.0),
                SimAction::ArmSetGoal(50.0),
            ]
        );
    }

    #[test]
    fn test_journal_clear() {
        let journal = Journal::new(ManualClock::new().shared());
        journal.record(SimAction::ArmDisable);
        assert!(!journal.is_empty());
        journal.clear();
        assert!(journal.is_empty());
    }
}
