//! 定时器条目实现
//! Timer entry implementation
//!
//! 条目是参与堆排序的记录：截止时间、堆链接（自身在堆中的索引）、生命周期状态，
//! 以及标识拥有者类型的标签。条目嵌入在具体的定时器对象中。
//!
//! An entry is the heap-participating record: deadline, heap link (its own index
//! in the heap), lifecycle state, and a tag naming the kind of object that owns
//! it. Entries are embedded in the concrete timer objects.

use crate::timer::time::TimeSpec;
use std::cell::Cell;
use std::fmt;

/// 进程范围的定时器ID，从1开始，溢出后回绕
/// Process-wide timer ID, starts at 1 and wraps on overflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(i32);

impl TimerId {
    pub const FIRST: TimerId = TimerId(1);

    pub fn new(raw: i32) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> i32 {
        self.0
    }

    /// The id allocated after this one. Wraps back to 1 rather than into
    /// negative ids; collisions after wraparound are accepted.
    ///
    /// 此ID之后分配的ID。回绕到1而不是负数；回绕后的冲突是可接受的。
    pub fn successor(self) -> Self {
        match self.0.checked_add(1) {
            Some(next) => Self(next),
            None => Self::FIRST,
        }
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 定时器种类
/// Timer kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// 一次性超时
    /// One-shot timeout
    Timeout,
    /// 重复间隔
    /// Repeating interval
    Interval,
    /// 零延迟的立即任务，通过FIFO队列处理，从不进入堆
    /// Zero-delay immediate, serviced by a FIFO and never heap-resident
    Immediate,
}

/// 条目生命周期状态
/// Entry lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    /// 已构造但不在堆中（排队中的立即任务）
    /// Constructed, not heap-resident (a queued immediate)
    Pending,
    /// 在堆中，将会触发
    /// Heap-resident, will fire
    Active,
    /// 已弹出，回调正在执行或已退役
    /// Popped; callback executing or retired
    Fired,
    /// 已取消，终态
    /// Cancelled, terminal
    Cancelled,
}

/// 拥有条目的对象类型，堆根据它分派 `fire()`
/// Kind of object owning the entry; the heap dispatches `fire()` on it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryTag {
    Timeout,
    Interval,
    Immediate,
    /// 宿主内部使用的截止时间任务
    /// Deadline work scheduled by the host itself
    Internal,
}

impl From<TimerKind> for EntryTag {
    fn from(kind: TimerKind) -> Self {
        match kind {
            TimerKind::Timeout => EntryTag::Timeout,
            TimerKind::Interval => EntryTag::Interval,
            TimerKind::Immediate => EntryTag::Immediate,
        }
    }
}

/// 堆中的定时器条目
/// Timer entry in the heap
#[derive(Debug)]
pub struct TimerEntry {
    /// 到期时间
    /// Expiration time
    deadline: Cell<TimeSpec>,
    /// 创建序号，用于相同截止时间的排序
    /// Creation sequence, breaks ties between equal deadlines
    seq: u64,
    /// 在堆中的索引，不在堆中时为 `None`
    /// Index in the heap, `None` while not heap-resident
    heap_index: Cell<Option<usize>>,
    state: Cell<EntryState>,
    tag: EntryTag,
}

impl TimerEntry {
    /// 创建新的定时器条目
    /// Create new timer entry
    pub fn new(tag: EntryTag, seq: u64) -> Self {
        Self {
            deadline: Cell::new(TimeSpec::ZERO),
            seq,
            heap_index: Cell::new(None),
            state: Cell::new(EntryState::Pending),
            tag,
        }
    }

    pub fn deadline(&self) -> TimeSpec {
        self.deadline.get()
    }

    pub(crate) fn set_deadline(&self, deadline: TimeSpec) {
        // 堆内条目的键不能原地修改
        // The key of a heap-resident entry must not change in place
        debug_assert!(
            self.heap_index.get().is_none(),
            "deadline changed while heap-resident"
        );
        self.deadline.set(deadline);
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn state(&self) -> EntryState {
        self.state.get()
    }

    pub(crate) fn set_state(&self, state: EntryState) {
        self.state.set(state);
    }

    pub fn tag(&self) -> EntryTag {
        self.tag
    }

    pub fn is_heap_resident(&self) -> bool {
        self.heap_index.get().is_some()
    }

    pub(crate) fn heap_index(&self) -> Option<usize> {
        self.heap_index.get()
    }

    pub(crate) fn set_heap_index(&self, index: Option<usize>) {
        self.heap_index.set(index);
    }

    /// 按截止时间排序，相同时按创建序号升序
    /// Ordered by deadline, ties broken by ascending creation sequence
    pub fn precedes(&self, other: &TimerEntry) -> bool {
        (self.deadline(), self.seq) < (other.deadline(), other.seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_wraps_to_first() {
        assert_eq!(TimerId::new(7).successor(), TimerId::new(8));
        assert_eq!(TimerId::new(i32::MAX).successor(), TimerId::FIRST);
    }

    #[test]
    fn test_precedes_breaks_ties_by_seq() {
        let a = TimerEntry::new(EntryTag::Timeout, 1);
        let b = TimerEntry::new(EntryTag::Timeout, 2);
        a.set_deadline(TimeSpec::from_millis(10));
        b.set_deadline(TimeSpec::from_millis(10));
        assert!(a.precedes(&b));
        assert!(!b.precedes(&a));

        b.set_deadline(TimeSpec::from_millis(5));
        assert!(b.precedes(&a));
    }

    #[test]
    fn test_new_entry_is_pending_and_unlinked() {
        let entry = TimerEntry::new(EntryTag::Interval, 9);
        assert_eq!(entry.state(), EntryState::Pending);
        assert!(!entry.is_heap_resident());
        assert_eq!(entry.tag(), EntryTag::Interval);
    }
}
