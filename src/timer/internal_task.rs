//! 宿主内部截止时间任务
//! Host-internal deadline tasks
//!
//! 宿主自己的截止时间工作（例如休眠或中止超时）与用户定时器共享同一个堆和排序规则，
//! 但从不贡献保活计数，也没有数字ID。
//!
//! The host's own deadline work (a sleep, an abort timeout) shares the heap and
//! its ordering contract with user timers, but never contributes to keep-alive
//! and has no numeric id.

use crate::timer::entry::{EntryState, EntryTag, TimerEntry};
use crate::timer::registry::{Registry, RegistryInner};
use crate::timer::time::TimeSpec;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

pub(crate) type InternalTask = Box<dyn FnOnce(&Registry, TimeSpec)>;

pub(crate) struct InternalTimer {
    pub(crate) entry: TimerEntry,
    task: RefCell<Option<InternalTask>>,
}

impl InternalTimer {
    pub(crate) fn new(seq: u64, deadline: TimeSpec, task: InternalTask) -> Rc<Self> {
        let entry = TimerEntry::new(EntryTag::Internal, seq);
        entry.set_deadline(deadline);
        Rc::new(Self {
            entry,
            task: RefCell::new(Some(task)),
        })
    }

    pub(crate) fn fire(&self, registry: &Registry, now: TimeSpec) {
        let task = self.task.borrow_mut().take();
        if let Some(task) = task {
            task(registry, now);
        }
    }
}

/// 内部任务的句柄
/// Handle to an internal task
#[derive(Clone)]
pub struct InternalTimerHandle {
    timer: Rc<InternalTimer>,
    registry: Weak<RegistryInner>,
}

impl InternalTimerHandle {
    pub(crate) fn new(timer: Rc<InternalTimer>, registry: &Registry) -> Self {
        Self {
            timer,
            registry: registry.downgrade(),
        }
    }

    pub fn deadline(&self) -> TimeSpec {
        self.timer.entry.deadline()
    }

    pub fn is_pending(&self) -> bool {
        self.timer.entry.state() == EntryState::Active
    }

    /// 取消任务；如果任务已运行或已取消则返回 `false`
    /// Cancel the task; returns `false` if it already ran or was cancelled
    pub fn cancel(&self) -> bool {
        if self.timer.entry.state() != EntryState::Active {
            return false;
        }
        let removed = self
            .registry
            .upgrade()
            .map(Registry::from_inner)
            .and_then(|registry| registry.remove(&self.timer.entry));
        self.timer.entry.set_state(EntryState::Cancelled);
        let task = self.timer.task.borrow_mut().take();
        drop(task);
        drop(removed);
        true
    }
}

impl fmt::Debug for InternalTimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InternalTimerHandle")
            .field("seq", &self.timer.entry.seq())
            .field("deadline", &self.timer.entry.deadline())
            .field("state", &self.timer.entry.state())
            .finish()
    }
}
