//! 平台后端
//! Platform backends
//!
//! 两种可互换的策略保证在下一个截止时间之前或当时唤醒：
//! 反应器在每次轮询时查询下一个截止时间作为等待上限；专用后端持有一个
//! 定时器对象，每当最早截止时间变化时重新设置。排序完全由注册表决定，
//! 因此两种后端的触发顺序相同。
//!
//! Two interchangeable strategies guarantee a wake-up at or before the next
//! deadline: the reactor queries the next deadline on every poll and uses it as
//! its wait bound; the dedicated backend owns a timer object re-armed whenever
//! the earliest deadline changes. Ordering is decided by the registry alone, so
//! both backends fire in the same order.

mod dedicated;
mod reactor;

pub use dedicated::DedicatedBackend;
pub use reactor::ReactorBackend;

use crate::config::BackendKind;
use crate::timer::time::{MonotonicClock, TimeSpec};
use async_trait::async_trait;
use std::cell::Cell;
use std::rc::Rc;
use tracing::trace;

/// 平台后端接口
/// Platform backend interface
#[async_trait(?Send)]
pub trait TimerBackend {
    fn kind(&self) -> BackendKind;

    /// 记录最早的截止时间；`None` 表示解除
    /// Record the earliest deadline; `None` disarms
    fn arm(&self, deadline: Option<TimeSpec>);

    fn armed_deadline(&self) -> Option<TimeSpec>;

    /// 保活计数从0变为正数时调用
    /// Called on a 0 -> positive keep-alive transition
    fn ref_keep_alive(&self);

    /// 保活计数从正数变为0时调用
    /// Called on a positive -> 0 keep-alive transition
    fn unref_keep_alive(&self);

    /// 后端是否持有阻止宿主退出的引用
    /// Whether the backend holds a reference preventing host exit
    fn holds_keep_alive(&self) -> bool;

    /// 等待直到 `next_deadline`（由轮询循环从注册表查询得到）
    /// Wait until `next_deadline`, as queried from the registry by the poll loop
    async fn wait(&self, next_deadline: Option<TimeSpec>);
}

/// 为给定种类构造后端
/// Construct the backend for the given kind
pub fn backend_for(kind: BackendKind, clock: MonotonicClock) -> Rc<dyn TimerBackend> {
    match kind {
        BackendKind::Reactor => Rc::new(ReactorBackend::new(clock)),
        BackendKind::Dedicated => Rc::new(DedicatedBackend::new(clock)),
    }
}

/// 后端的保活引用，两种后端共用
/// The backend's keep-alive reference, shared by both backends
#[derive(Debug, Default)]
pub(crate) struct KeepAliveRef {
    held: Cell<bool>,
    transitions: Cell<u64>,
}

impl KeepAliveRef {
    pub(crate) fn acquire(&self) {
        debug_assert!(!self.held.get(), "backend keep-alive acquired twice");
        self.held.set(true);
        self.transitions.set(self.transitions.get() + 1);
        trace!("Backend keep-alive acquired");
    }

    pub(crate) fn release(&self) {
        debug_assert!(self.held.get(), "backend keep-alive released while not held");
        self.held.set(false);
        self.transitions.set(self.transitions.get() + 1);
        trace!("Backend keep-alive released");
    }

    pub(crate) fn is_held(&self) -> bool {
        self.held.get()
    }

    /// 获取和释放的总次数
    /// Total number of acquires plus releases
    pub(crate) fn transitions(&self) -> u64 {
        self.transitions.get()
    }
}
