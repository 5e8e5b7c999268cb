//! 定时器内部状态与状态机
//! Timer internals and state machine
//!
//! 每个超时、间隔和立即任务都由一个 `TimerObject` 表示：嵌入的堆条目加上业务状态
//! （ID、种类、周期、取消/保活标志、回调）。状态转换如下：
//!
//! Every timeout, interval and immediate is a `TimerObject`: the embedded heap
//! entry plus business state (id, kind, period, cancellation/keep-alive flags,
//! the callback). Transitions:
//!
//! ```text
//! PENDING ──▶ ACTIVE ──▶ FIRED ──▶ ACTIVE     (interval rearm / refresh)
//!    │           │         ├────▶ retired     (one-shot done)
//!    └───────────┴─────────┴────▶ CANCELLED   (terminal)
//! ```
//!
//! 对象本身由 `Rc` 拥有。堆节点、立即队列和正在进行的 `fire()` 各持有一个引用，
//! 因此回调对自身做任何事情都不会在触发期间释放对象。
//!
//! Objects are owned through `Rc`. The heap node, the immediate queue and an
//! in-progress `fire()` each hold a reference, so nothing a callback does to
//! its own timer can free it mid-fire.

use crate::config::{DelayConfig, DelayOverflowPolicy};
use crate::timer::callback::{FireContext, SharedCallback};
use crate::timer::entry::{EntryState, TimerEntry, TimerId, TimerKind};
use crate::timer::handle::TimerHandle;
use crate::timer::registry::{HeapNode, Registry, RegistryInner};
use crate::timer::time::TimeSpec;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::trace;

/// 将宿主传入的原始延迟规范化为毫秒数
/// Normalize a raw host delay into whole milliseconds
///
/// 有限且在范围内的值向零截断，负值视为零。非有限或超出范围的值按策略处理。
/// 结果为零只可能出现在一次性超时且启用了 `zero_delay_as_immediate` 时；
/// 否则至少为 `min_delay_ms`。
///
/// Finite in-range values truncate toward zero and negatives count as zero.
/// Non-finite or out-of-range values follow the overflow policy. A zero result
/// only happens for one-shot timeouts with `zero_delay_as_immediate`; anything
/// else is at least `min_delay_ms`.
pub fn normalize_delay(raw: f64, repeating: bool, config: &DelayConfig) -> u32 {
    let max = f64::from(config.max_delay_ms);
    let ms = if raw.is_nan() || raw < f64::from(i32::MIN) {
        config.min_delay_ms
    } else if raw > max {
        match config.overflow_policy {
            DelayOverflowPolicy::ClampToMin => config.min_delay_ms,
            DelayOverflowPolicy::Saturate => config.max_delay_ms,
        }
    } else if raw < 1.0 {
        0
    } else {
        // 在 [1, max] 范围内，截断是精确的
        // Within [1, max], truncation is exact
        raw.trunc() as u32
    };

    if ms == 0 && !(config.zero_delay_as_immediate && !repeating) {
        config.min_delay_ms
    } else {
        ms
    }
}

/// 定时器对象：堆条目加业务逻辑
/// Timer object: heap entry plus business logic
pub(crate) struct TimerObject {
    pub(crate) entry: TimerEntry,
    id: TimerId,
    kind: TimerKind,
    /// 规范化后的延迟或周期；为零表示通过立即队列处理
    /// Normalized delay or period; zero means serviced via the immediate queue
    period_ms: u32,
    /// 由 `cancel()` 设置，永久有效
    /// Set by `cancel()`, permanent
    cleared: Cell<bool>,
    /// 当前是否向注册表保活计数贡献了一个单位
    /// Whether this timer currently contributes one unit to the keep-alive counter
    keeping_alive: Cell<bool>,
    /// 外部代码是否以数字形式观察过ID
    /// Whether outside code has observed the id as a number
    observed: Cell<bool>,
    /// 用户的 ref()/unref() 选择
    /// The user's ref()/unref() choice
    user_ref: Cell<bool>,
    callback: RefCell<Option<SharedCallback>>,
    registry: Weak<RegistryInner>,
}

impl TimerObject {
    pub(crate) fn new(
        registry: &Registry,
        id: TimerId,
        seq: u64,
        kind: TimerKind,
        period_ms: u32,
        callback: SharedCallback,
    ) -> Rc<Self> {
        Rc::new(Self {
            entry: TimerEntry::new(kind.into(), seq),
            id,
            kind,
            period_ms,
            cleared: Cell::new(false),
            keeping_alive: Cell::new(false),
            observed: Cell::new(false),
            user_ref: Cell::new(true),
            callback: RefCell::new(Some(callback)),
            registry: registry.downgrade(),
        })
    }

    pub(crate) fn id(&self) -> TimerId {
        self.id
    }

    pub(crate) fn kind(&self) -> TimerKind {
        self.kind
    }

    pub(crate) fn period_ms(&self) -> u32 {
        self.period_ms
    }

    pub(crate) fn is_cleared(&self) -> bool {
        self.cleared.get()
    }

    pub(crate) fn has_user_ref(&self) -> bool {
        self.user_ref.get()
    }

    pub(crate) fn is_keeping_alive(&self) -> bool {
        self.keeping_alive.get()
    }

    #[cfg(test)]
    pub(crate) fn has_callback(&self) -> bool {
        self.callback.borrow().is_some()
    }

    pub(crate) fn registry(&self) -> Option<Registry> {
        self.registry.upgrade().map(Registry::from_inner)
    }

    fn uses_immediate_queue(&self) -> bool {
        self.kind == TimerKind::Immediate || self.period_ms == 0
    }

    /// 定时器是否还会触发（包括正在触发、尚未重新调度的间隔）
    /// Whether the timer will still fire (including an interval mid-fire that
    /// has not been rearmed yet)
    pub(crate) fn is_scheduled(&self) -> bool {
        match self.entry.state() {
            EntryState::Active | EntryState::Pending => !self.cleared.get(),
            EntryState::Fired => self.kind == TimerKind::Interval && !self.cleared.get(),
            EntryState::Cancelled => false,
        }
    }

    fn set_keep_alive(&self, registry: &Registry, keep_alive: bool) {
        if self.keeping_alive.replace(keep_alive) != keep_alive {
            registry.increment_keep_alive(if keep_alive { 1 } else { -1 });
        }
    }

    /// 放入堆（或立即队列）并根据用户引用恢复保活
    /// Put into the heap (or immediate queue) and restore keep-alive per the user ref
    fn arm(self: &Rc<Self>, registry: &Registry, now: TimeSpec) {
        if self.uses_immediate_queue() {
            self.entry.set_deadline(now);
            self.entry.set_state(EntryState::Pending);
            registry.enqueue_immediate(Rc::clone(self));
        } else {
            self.entry.set_deadline(now.add_millis(u64::from(self.period_ms)));
            registry.insert(HeapNode::Timer(Rc::clone(self)));
        }
        if self.user_ref.get() {
            self.set_keep_alive(registry, true);
        }
    }

    /// 首次调度
    /// Initial scheduling
    pub(crate) fn schedule(self: &Rc<Self>, registry: &Registry, now: TimeSpec) {
        self.arm(registry, now);
        registry.note_scheduled(self.id, self.kind, self.period_ms);
        trace!(
            timer_id = %self.id,
            kind = ?self.kind,
            delay_ms = self.period_ms,
            deadline = %self.entry.deadline(),
            "Timer scheduled"
        );
    }

    /// 触发定时器
    /// Fire the timer
    ///
    /// 调用方已将条目从堆或队列中取出并置为 `Fired`，并在整个调用期间持有 `self`。
    /// The caller has taken the entry out of the heap or queue, marked it
    /// `Fired`, and holds `self` for the duration of the call.
    pub(crate) fn fire(self: &Rc<Self>, registry: &Registry, now: TimeSpec) {
        registry.notify_will_fire(self.id, self.kind);

        // 弹出后、调用前到达的取消请求必须抑制回调
        // A cancel that arrived after the pop but before invocation suppresses the callback
        if self.cleared.get() {
            trace!(timer_id = %self.id, "Cancelled timer popped, callback suppressed");
            self.set_keep_alive(registry, false);
            return;
        }

        let repeating = self.kind == TimerKind::Interval;
        if !repeating {
            self.set_keep_alive(registry, false);
        }

        // 克隆出回调，使回调在执行期间释放自身句柄是安全的
        // Clone the callback out so it can release its own slot while running
        let callback = self.callback.borrow().clone();
        if let Some(callback) = callback {
            let handle = TimerHandle::new(Rc::clone(self));
            let cx = FireContext::new(registry, &handle, now);
            let result = callback.borrow_mut().on_fire(&cx);
            registry.note_fired();
            if let Err(error) = result {
                registry.report_exception(self.id, self.kind, error);
            }
        }

        registry.notify_did_fire(self.id, self.kind);

        // 回调可能已经取消或刷新了自己，只有仍处于 Fired 的间隔才重新调度
        // The callback may have cancelled or refreshed itself; only an interval
        // still in Fired is rearmed
        if repeating && self.entry.state() == EntryState::Fired && !self.cleared.get() {
            // 下一个截止时间基于回调前的时间戳，与回调耗时无关
            // Next deadline comes from the pre-callback timestamp, independent
            // of how long the callback ran
            self.entry
                .set_deadline(now.add_millis(u64::from(self.period_ms)));
            registry.insert(HeapNode::Timer(Rc::clone(self)));
            registry.note_rearmed();
            if self.user_ref.get() {
                self.set_keep_alive(registry, true);
            }
            trace!(
                timer_id = %self.id,
                deadline = %self.entry.deadline(),
                "Interval rearmed"
            );
        }
    }

    /// 以当前时间为起点重新计算截止时间
    /// Recompute the deadline starting from now
    pub(crate) fn refresh(self: &Rc<Self>, registry: &Registry, now: TimeSpec) {
        if self.kind == TimerKind::Immediate || self.cleared.get() {
            return;
        }

        match self.entry.state() {
            EntryState::Active => {
                let removed = registry.remove(&self.entry);
                debug_assert!(removed.is_some(), "active timer missing from heap");
            }
            EntryState::Pending => {
                // 已在立即队列中，下一个tick就会运行
                // Already queued, it runs on the next tick anyway
                if self.user_ref.get() {
                    self.set_keep_alive(registry, true);
                }
                return;
            }
            EntryState::Fired => {}
            EntryState::Cancelled => return,
        }

        self.arm(registry, now);
        trace!(
            timer_id = %self.id,
            deadline = %self.entry.deadline(),
            "Timer refreshed"
        );
    }

    /// 取消定时器；终态
    /// Cancel the timer; terminal
    ///
    /// # Returns
    /// 如果此调用改变了状态则返回 `true`
    /// Returns `true` if this call changed the state
    pub(crate) fn cancel(self: &Rc<Self>, registry: &Registry) -> bool {
        if self.cleared.replace(true) {
            return false;
        }

        let removed = match self.entry.state() {
            EntryState::Active => registry.remove(&self.entry),
            EntryState::Pending => {
                registry.dequeue_immediate(self);
                None
            }
            EntryState::Fired | EntryState::Cancelled => None,
        };
        self.entry.set_state(EntryState::Cancelled);
        self.set_keep_alive(registry, false);

        let released = self.callback.borrow_mut().take();
        drop(released);
        drop(removed);

        registry.note_cancelled(self.id, self.kind);
        trace!(timer_id = %self.id, kind = ?self.kind, "Timer cancelled");
        true
    }

    pub(crate) fn set_ref(&self, registry: Option<&Registry>, user_ref: bool) {
        self.user_ref.set(user_ref);
        let keep_alive = user_ref && self.is_scheduled();
        match registry {
            Some(registry) => self.set_keep_alive(registry, keep_alive),
            None => self.keeping_alive.set(keep_alive),
        }
    }

    /// 以数字形式读取ID，并在首次读取时登记到查找表
    /// Read the id as a number, registering it in the lookup map the first time
    pub(crate) fn observe_id(self: &Rc<Self>) -> i32 {
        if !self.observed.replace(true) {
            if let Some(registry) = self.registry() {
                registry.register_lookup(self);
            }
        }
        self.id.get()
    }
}

impl Drop for TimerObject {
    fn drop(&mut self) {
        if !self.observed.get() {
            return;
        }
        if let Some(inner) = self.registry.upgrade() {
            Registry::from_inner(inner).unregister_lookup(self.kind, self.id, self);
        }
    }
}

impl fmt::Debug for TimerObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerObject")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("period_ms", &self.period_ms)
            .field("state", &self.entry.state())
            .field("deadline", &self.entry.deadline())
            .field("cleared", &self.cleared.get())
            .field("keeping_alive", &self.keeping_alive.get())
            .field("user_ref", &self.user_ref.get())
            .finish()
    }
}
