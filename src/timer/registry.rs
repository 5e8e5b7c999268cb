//! 定时器注册表
//! Timer registry
//!
//! 每个事件循环一个注册表。它拥有截止时间堆、立即任务队列、ID分配器、
//! 按ID取消所用的查找表，以及决定宿主是否应保持存活的保活计数。
//!
//! One registry per event loop. It owns the deadline heap, the immediate
//! queue, the id allocator, the lookup maps used by cancel-by-id, and the
//! keep-alive counter that decides whether the host should stay alive.
//!
//! 所有状态都是单线程的，通过 `Cell`/`RefCell` 修改。用户代码（回调、钩子、
//! 异常接收器）运行时不持有任何内部借用，因此它们可以随意回调注册表。
//!
//! All state is single-threaded and mutated through `Cell`/`RefCell`. User
//! code (callbacks, hooks, the exception sink) never runs while an internal
//! borrow is held, so it may call back into the registry freely.

use crate::config::TimerConfig;
use crate::error::{CallbackError, Result};
use crate::timer::backend::{TimerBackend, backend_for};
use crate::timer::callback::{CallbackResult, FireContext, SharedCallback};
use crate::timer::entry::{EntryState, TimerEntry, TimerId, TimerKind};
use crate::timer::handle::{ClearTarget, TimerHandle, id_from_number, parse_timer_id};
use crate::timer::heap::{HeapMember, TimerHeap};
use crate::timer::host::{DebuggerHook, ExceptionSink, TracingExceptionSink};
use crate::timer::internal_task::{InternalTimer, InternalTimerHandle};
use crate::timer::internals::{TimerObject, normalize_delay};
use crate::timer::stats::TimerStats;
use crate::timer::time::{MonotonicClock, TimeSpec};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// 堆节点：用户定时器或宿主内部任务
/// Heap node: a user timer or a host-internal task
#[derive(Clone)]
pub(crate) enum HeapNode {
    Timer(Rc<TimerObject>),
    Internal(Rc<InternalTimer>),
}

impl HeapMember for HeapNode {
    fn entry(&self) -> &TimerEntry {
        match self {
            HeapNode::Timer(timer) => &timer.entry,
            HeapNode::Internal(task) => &task.entry,
        }
    }
}

/// 一个tick中运行的工作量
/// Work performed during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// 运行的立即任务（包括零延迟超时）
    /// Immediates run, zero-delay timeouts included
    pub immediates: usize,
    /// 从堆中弹出并分派的条目
    /// Entries popped from the heap and dispatched
    pub timers: usize,
}

impl TickReport {
    pub fn total(&self) -> usize {
        self.immediates + self.timers
    }
}

/// 按种类分开的ID查找表
/// Per-kind id lookup maps
///
/// 只保存弱引用：查找表从不延长定时器的生命周期。
/// Only weak references are kept: the maps never extend a timer's lifetime.
#[derive(Default)]
struct LookupMaps {
    timeouts: HashMap<TimerId, Weak<TimerObject>>,
    intervals: HashMap<TimerId, Weak<TimerObject>>,
    immediates: HashMap<TimerId, Weak<TimerObject>>,
}

impl LookupMaps {
    fn map(&self, kind: TimerKind) -> &HashMap<TimerId, Weak<TimerObject>> {
        match kind {
            TimerKind::Timeout => &self.timeouts,
            TimerKind::Interval => &self.intervals,
            TimerKind::Immediate => &self.immediates,
        }
    }

    fn map_mut(&mut self, kind: TimerKind) -> &mut HashMap<TimerId, Weak<TimerObject>> {
        match kind {
            TimerKind::Timeout => &mut self.timeouts,
            TimerKind::Interval => &mut self.intervals,
            TimerKind::Immediate => &mut self.immediates,
        }
    }

    fn len(&self) -> usize {
        self.timeouts.len() + self.intervals.len() + self.immediates.len()
    }
}

#[derive(Default)]
struct Counters {
    scheduled: Cell<u64>,
    fired: Cell<u64>,
    cancelled: Cell<u64>,
    rearmed: Cell<u64>,
    callback_errors: Cell<u64>,
}

fn bump(counter: &Cell<u64>) {
    counter.set(counter.get() + 1);
}

pub(crate) struct RegistryInner {
    config: TimerConfig,
    clock: MonotonicClock,
    heap: RefCell<TimerHeap<HeapNode>>,
    immediates: RefCell<VecDeque<Rc<TimerObject>>>,
    /// 正在触发的定时器；回调可以嵌套调用 tick，因此是一个栈
    /// Timers currently firing; a callback may tick reentrantly, hence a stack
    firing: RefCell<Vec<Rc<TimerObject>>>,
    next_id: Cell<TimerId>,
    next_seq: Cell<u64>,
    lookup: RefCell<LookupMaps>,
    keep_alive: Cell<i64>,
    backend: Rc<dyn TimerBackend>,
    debugger: RefCell<Option<Rc<dyn DebuggerHook>>>,
    sink: RefCell<Rc<dyn ExceptionSink>>,
    counters: Counters,
}

/// 定时器注册表
/// Timer registry
///
/// 克隆得到的是同一个注册表的另一个句柄。
/// Cloning yields another handle to the same registry.
#[derive(Clone)]
pub struct Registry {
    inner: Rc<RegistryInner>,
}

impl Registry {
    /// 用给定配置和匹配的后端创建注册表
    /// Create a registry with the given configuration and its matching backend
    pub fn new(config: TimerConfig) -> Result<Self> {
        config.validate()?;
        let clock = MonotonicClock::new();
        let backend = backend_for(config.backend, clock);
        Ok(Self::from_parts(config, clock, backend))
    }

    /// 用调用方提供的后端创建注册表；后端必须使用同一个时钟
    /// Create a registry around a caller-supplied backend; the backend must
    /// share the same clock
    pub fn with_backend(
        config: TimerConfig,
        clock: MonotonicClock,
        backend: Rc<dyn TimerBackend>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(config, clock, backend))
    }

    fn from_parts(config: TimerConfig, clock: MonotonicClock, backend: Rc<dyn TimerBackend>) -> Self {
        debug!(
            backend = ?backend.kind(),
            min_delay_ms = config.delay.min_delay_ms,
            max_delay_ms = config.delay.max_delay_ms,
            "Timer registry created"
        );
        Self {
            inner: Rc::new(RegistryInner {
                config,
                clock,
                heap: RefCell::new(TimerHeap::new()),
                immediates: RefCell::new(VecDeque::new()),
                firing: RefCell::new(Vec::new()),
                next_id: Cell::new(TimerId::FIRST),
                next_seq: Cell::new(0),
                lookup: RefCell::new(LookupMaps::default()),
                keep_alive: Cell::new(0),
                backend,
                debugger: RefCell::new(None),
                sink: RefCell::new(Rc::new(TracingExceptionSink)),
                counters: Counters::default(),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Rc<RegistryInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<RegistryInner> {
        Rc::downgrade(&self.inner)
    }

    /// 当前单调时间
    /// Current monotonic time
    pub fn now(&self) -> TimeSpec {
        self.inner.clock.now()
    }

    pub fn clock(&self) -> &MonotonicClock {
        &self.inner.clock
    }

    pub fn config(&self) -> &TimerConfig {
        &self.inner.config
    }

    pub fn backend(&self) -> &Rc<dyn TimerBackend> {
        &self.inner.backend
    }

    // ========== 调度 Scheduling ==========

    /// 调度一次性超时
    /// Schedule a one-shot timeout
    ///
    /// 延迟按配置规范化。规范化为零的延迟由立即队列处理，但句柄仍报告
    /// `TimerKind::Timeout`，可以用 `clear_timeout` 取消。
    ///
    /// The delay is normalized per the configuration. A delay normalized to
    /// zero is serviced by the immediate queue, but the handle still reports
    /// `TimerKind::Timeout` and is cancelled with `clear_timeout`.
    ///
    /// 触发后的一次性定时器保留回调以便 `refresh`，直到取消或最后一个句柄释放。
    /// 回调不应捕获自己的 `TimerHandle` 克隆，否则形成永不释放的引用环；
    /// 在回调内使用 `FireContext::timer`。
    ///
    /// A fired one-shot keeps its callback for `refresh` until it is cancelled
    /// or its last handle is dropped. The callback must not capture a clone of
    /// its own `TimerHandle`, which would form a cycle that is never freed;
    /// use `FireContext::timer` from inside the callback instead.
    pub fn schedule_timeout<F>(&self, callback: F, delay: f64) -> TimerHandle
    where
        F: FnMut(&FireContext<'_>) -> CallbackResult + 'static,
    {
        let delay_ms = normalize_delay(delay, false, &self.inner.config.delay);
        self.schedule(TimerKind::Timeout, delay_ms, Rc::new(RefCell::new(callback)))
    }

    /// 调度间隔定时器；周期至少为 `min_delay_ms`
    /// Schedule an interval; the period is at least `min_delay_ms`
    pub fn schedule_interval<F>(&self, callback: F, period: f64) -> TimerHandle
    where
        F: FnMut(&FireContext<'_>) -> CallbackResult + 'static,
    {
        let period_ms = normalize_delay(period, true, &self.inner.config.delay);
        self.schedule(TimerKind::Interval, period_ms, Rc::new(RefCell::new(callback)))
    }

    /// 调度立即任务，在下一个tick的定时器之前运行
    /// Schedule an immediate, run on the next tick before any timer
    pub fn schedule_immediate<F>(&self, callback: F) -> TimerHandle
    where
        F: FnMut(&FireContext<'_>) -> CallbackResult + 'static,
    {
        self.schedule(TimerKind::Immediate, 0, Rc::new(RefCell::new(callback)))
    }

    fn schedule(&self, kind: TimerKind, period_ms: u32, callback: SharedCallback) -> TimerHandle {
        let id = self.allocate_id();
        let seq = self.allocate_seq();
        let object = TimerObject::new(self, id, seq, kind, period_ms, callback);
        object.schedule(self, self.now());
        TimerHandle::new(object)
    }

    /// 调度宿主内部任务
    /// Schedule a host-internal task
    ///
    /// 内部任务与用户定时器共享堆和排序规则，但不保持宿主存活。
    /// Internal tasks share the heap and its ordering with user timers but do
    /// not keep the host alive.
    pub fn schedule_internal<F>(&self, delay: Duration, task: F) -> InternalTimerHandle
    where
        F: FnOnce(&Registry, TimeSpec) + 'static,
    {
        let deadline = self.now().saturating_add(delay);
        let timer = InternalTimer::new(self.allocate_seq(), deadline, Box::new(task));
        self.insert(HeapNode::Internal(Rc::clone(&timer)));
        trace!(deadline = %deadline, "Internal task scheduled");
        InternalTimerHandle::new(timer, self)
    }

    fn allocate_id(&self) -> TimerId {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id.successor());
        id
    }

    fn allocate_seq(&self) -> u64 {
        let seq = self.inner.next_seq.get();
        self.inner.next_seq.set(seq.wrapping_add(1));
        seq
    }

    // ========== 取消 Cancellation ==========

    /// 取消超时或间隔
    /// Cancel a timeout or an interval
    ///
    /// 与宿主行为一致，`clear_timeout` 和 `clear_interval` 可以互换。
    /// 未知、已取消或格式错误的目标都是空操作。
    ///
    /// Matching host behavior, `clear_timeout` and `clear_interval` are
    /// interchangeable. Unknown, already-cancelled or malformed targets are
    /// no-ops.
    ///
    /// # Returns
    /// 如果此调用取消了定时器则返回 `true`
    /// Returns `true` if this call cancelled a timer
    pub fn clear_timeout<'a>(&self, target: impl Into<ClearTarget<'a>>) -> bool {
        self.clear(target.into(), &[TimerKind::Timeout, TimerKind::Interval])
    }

    /// 取消间隔或超时
    /// Cancel an interval or a timeout
    pub fn clear_interval<'a>(&self, target: impl Into<ClearTarget<'a>>) -> bool {
        self.clear(target.into(), &[TimerKind::Interval, TimerKind::Timeout])
    }

    /// 取消立即任务
    /// Cancel an immediate
    pub fn clear_immediate<'a>(&self, target: impl Into<ClearTarget<'a>>) -> bool {
        self.clear(target.into(), &[TimerKind::Immediate])
    }

    fn clear(&self, target: ClearTarget<'_>, kinds: &[TimerKind]) -> bool {
        let id = match target {
            ClearTarget::Handle(handle) => {
                return kinds.contains(&handle.kind()) && handle.cancel();
            }
            ClearTarget::Number(value) => id_from_number(value),
            ClearTarget::Text(text) => parse_timer_id(text),
        };
        let Some(id) = id else {
            trace!(?target, "Malformed timer id ignored");
            return false;
        };

        let found = kinds
            .iter()
            .find_map(|kind| self.lookup_object(*kind, TimerId::new(id)));
        match found {
            Some(object) => object.cancel(self),
            None => {
                trace!(timer_id = id, "No timer registered under id");
                false
            }
        }
    }

    /// 按数字ID查找已被观察过的定时器
    /// Look up an observed timer by numeric id
    ///
    /// 只有ID被 `TimerHandle::value_of` 读取过的定时器才能找到。
    /// Only timers whose id was read through `TimerHandle::value_of` are found.
    pub fn lookup_by_id(&self, kind: TimerKind, id: i32) -> Option<TimerHandle> {
        self.lookup_object(kind, TimerId::new(id)).map(TimerHandle::new)
    }

    fn lookup_object(&self, kind: TimerKind, id: TimerId) -> Option<Rc<TimerObject>> {
        let lookup = self.inner.lookup.borrow();
        lookup.map(kind).get(&id).and_then(Weak::upgrade)
    }

    // ========== 驱动 Driving ==========

    /// 最早的截止时间；堆为空时为 `None`
    /// The earliest deadline; `None` when the heap is empty
    pub fn next_deadline(&self) -> Option<TimeSpec> {
        self.inner
            .heap
            .borrow()
            .peek()
            .map(|node| node.entry().deadline())
    }

    /// 触发所有截止时间不晚于 `now` 的条目
    /// Fire every entry whose deadline is at or before `now`
    ///
    /// 每次触发后都重新查看堆顶，因此回调调度的、截止时间不晚于 `now` 的条目
    /// 会在同一次排空中触发。反复以零延迟重新调度自身的内部任务会使排空无法结束。
    ///
    /// The root is re-peeked after every fire, so entries a callback schedules
    /// with a deadline at or before `now` fire in the same drain. An internal
    /// task that keeps rescheduling itself with zero delay never lets the
    /// drain finish.
    ///
    /// # Returns
    /// 分派的条目数
    /// Number of entries dispatched
    pub fn drain(&self, now: TimeSpec) -> usize {
        let mut dispatched = 0;
        loop {
            let node = {
                let mut heap = self.inner.heap.borrow_mut();
                let due = heap
                    .peek()
                    .is_some_and(|root| root.entry().deadline() <= now);
                if due { heap.pop() } else { None }
            };
            let Some(node) = node else {
                break;
            };

            node.entry().set_state(EntryState::Fired);
            match &node {
                HeapNode::Timer(timer) => self.fire_tracked(timer, now),
                HeapNode::Internal(task) => task.fire(self, now),
            }
            dispatched += 1;
            // 节点在堆借用之外释放
            // The node is released outside the heap borrow
            drop(node);
        }
        self.rearm_backend();
        dispatched
    }

    /// 运行当前排队的立即任务
    /// Run the immediates queued so far
    ///
    /// 只运行调用时已排队的批次；批次中调度的立即任务留到下一个tick。
    /// 批次中被取消的条目会被跳过。
    ///
    /// Only the batch queued at call time runs; immediates scheduled during
    /// the batch wait for the next tick. Entries cancelled mid-batch are
    /// skipped.
    pub fn run_immediates(&self, now: TimeSpec) -> usize {
        let batch = std::mem::take(&mut *self.inner.immediates.borrow_mut());
        let mut ran = 0;
        for timer in batch {
            if timer.entry.state() != EntryState::Pending {
                continue;
            }
            timer.entry.set_state(EntryState::Fired);
            self.fire_tracked(&timer, now);
            ran += 1;
        }
        ran
    }

    /// 触发期间让 `shutdown` 能找到该定时器
    /// Keep the timer reachable by `shutdown` while it fires
    fn fire_tracked(&self, timer: &Rc<TimerObject>, now: TimeSpec) {
        self.inner.firing.borrow_mut().push(Rc::clone(timer));
        timer.fire(self, now);
        let finished = self.inner.firing.borrow_mut().pop();
        drop(finished);
    }

    /// 一个事件循环tick：先运行立即任务，再排空到期的定时器
    /// One event loop tick: run immediates, then drain due timers
    pub fn tick(&self, now: TimeSpec) -> TickReport {
        let immediates = self.run_immediates(now);
        let timers = self.drain(now);
        let report = TickReport { immediates, timers };
        trace!(now = %now, immediates, timers, "Tick complete");
        report
    }

    // ========== 查询 Queries ==========

    /// 是否有保持宿主存活的定时器
    /// Whether any timer keeps the host alive
    pub fn is_alive(&self) -> bool {
        self.inner.keep_alive.get() > 0
    }

    pub fn keep_alive_count(&self) -> i64 {
        self.inner.keep_alive.get()
    }

    /// 堆中的条目数
    /// Number of heap-resident entries
    pub fn active_count(&self) -> usize {
        self.inner.heap.borrow().len()
    }

    /// 等待运行的立即任务数（不含已取消的）
    /// Immediates waiting to run, cancelled ones excluded
    pub fn pending_immediates(&self) -> usize {
        self.inner
            .immediates
            .borrow()
            .iter()
            .filter(|timer| timer.entry.state() == EntryState::Pending)
            .count()
    }

    pub fn has_pending_immediates(&self) -> bool {
        self.pending_immediates() > 0
    }

    pub fn stats(&self) -> TimerStats {
        let counters = &self.inner.counters;
        TimerStats {
            active_timers: self.active_count(),
            pending_immediates: self.pending_immediates(),
            keep_alive: self.keep_alive_count(),
            scheduled: counters.scheduled.get(),
            fired: counters.fired.get(),
            cancelled: counters.cancelled.get(),
            rearmed: counters.rearmed.get(),
            callback_errors: counters.callback_errors.get(),
        }
    }

    // ========== 宿主协作者 Host collaborators ==========

    pub fn set_debugger_hook(&self, hook: Option<Rc<dyn DebuggerHook>>) {
        *self.inner.debugger.borrow_mut() = hook;
    }

    pub fn set_exception_sink(&self, sink: Rc<dyn ExceptionSink>) {
        *self.inner.sink.borrow_mut() = sink;
    }

    /// 取消所有定时器和内部任务
    /// Cancel every timer and internal task
    ///
    /// 包括堆中、立即队列中以及正在触发的定时器；在回调内调用时，正在运行的间隔
    /// 不会被重新调度。回调释放后，回调中捕获的注册表句柄形成的引用环也随之断开。
    ///
    /// This covers the heap, the immediate queue and any timer that is firing;
    /// called from a callback, the running interval is not rearmed. Releasing
    /// the callbacks also breaks reference cycles formed by registry handles
    /// captured inside them.
    pub fn shutdown(&self) {
        let in_flight: Vec<Rc<TimerObject>> = self.inner.firing.borrow().clone();
        let nodes: Vec<HeapNode> = self.inner.heap.borrow().iter().cloned().collect();
        let queued: Vec<Rc<TimerObject>> = self.inner.immediates.borrow_mut().drain(..).collect();

        let mut cancelled = 0;
        for timer in in_flight {
            if timer.cancel(self) {
                cancelled += 1;
            }
        }
        for node in nodes {
            match node {
                HeapNode::Timer(timer) => {
                    if timer.cancel(self) {
                        cancelled += 1;
                    }
                }
                HeapNode::Internal(task) => {
                    if InternalTimerHandle::new(task, self).cancel() {
                        cancelled += 1;
                    }
                }
            }
        }
        for timer in queued {
            if timer.cancel(self) {
                cancelled += 1;
            }
        }
        debug!(cancelled, "Timer registry shut down");
    }

    // ========== 内部接口 Crate-internal interface ==========

    /// 将节点插入堆并置为 `Active`
    /// Insert a node into the heap and mark it `Active`
    pub(crate) fn insert(&self, node: HeapNode) {
        node.entry().set_state(EntryState::Active);
        let earliest = {
            let mut heap = self.inner.heap.borrow_mut();
            heap.insert(node);
            heap.peek().map(|root| root.entry().deadline())
        };
        self.inner.backend.arm(earliest);
    }

    /// 从堆中删除条目；返回的节点由调用方在借用之外释放
    /// Remove an entry from the heap; the caller releases the returned node
    /// outside any borrow
    pub(crate) fn remove(&self, entry: &TimerEntry) -> Option<HeapNode> {
        let removed = self.inner.heap.borrow_mut().remove(entry);
        if removed.is_some() {
            self.rearm_backend();
        }
        removed
    }

    fn rearm_backend(&self) {
        let earliest = self.next_deadline();
        if self.inner.backend.armed_deadline() != earliest {
            self.inner.backend.arm(earliest);
        }
    }

    pub(crate) fn enqueue_immediate(&self, timer: Rc<TimerObject>) {
        self.inner.immediates.borrow_mut().push_back(timer);
    }

    /// 从立即队列中移除已取消的条目；正在运行的批次已不在队列中
    /// Drop a cancelled entry from the immediate queue; a running batch is no
    /// longer queued
    pub(crate) fn dequeue_immediate(&self, timer: &TimerObject) {
        let removed = {
            let mut queue = self.inner.immediates.borrow_mut();
            queue
                .iter()
                .position(|queued| std::ptr::eq(Rc::as_ptr(queued), timer))
                .and_then(|index| queue.remove(index))
        };
        drop(removed);
    }

    /// 调整保活计数，并在0与正数之间转换时通知后端
    /// Adjust the keep-alive counter, telling the backend on 0 <-> positive
    /// transitions
    pub(crate) fn increment_keep_alive(&self, delta: i64) {
        let before = self.inner.keep_alive.get();
        let after = before + delta;
        debug_assert!(after >= 0, "keep-alive counter went negative: {before} + {delta}");
        if after < 0 {
            warn!(before, delta, "Keep-alive counter underflow, clamping to zero");
            self.inner.keep_alive.set(0);
            return;
        }
        self.inner.keep_alive.set(after);

        if before == 0 && after > 0 {
            self.inner.backend.ref_keep_alive();
        } else if before > 0 && after == 0 {
            self.inner.backend.unref_keep_alive();
        }
    }

    pub(crate) fn register_lookup(&self, timer: &Rc<TimerObject>) {
        let previous = self
            .inner
            .lookup
            .borrow_mut()
            .map_mut(timer.kind())
            .insert(timer.id(), Rc::downgrade(timer));
        if previous.is_some_and(|weak| weak.strong_count() > 0) {
            // 只有ID回绕后才会发生
            // Only happens after the id counter wrapped
            warn!(timer_id = %timer.id(), "Timer id reused while the previous owner is alive");
        }
    }

    /// 只有查找表中的条目仍指向 `timer` 时才删除
    /// Remove the lookup entry only if it still points at `timer`
    pub(crate) fn unregister_lookup(&self, kind: TimerKind, id: TimerId, timer: &TimerObject) {
        let mut lookup = self.inner.lookup.borrow_mut();
        let map = lookup.map_mut(kind);
        if map
            .get(&id)
            .is_some_and(|weak| std::ptr::eq(weak.as_ptr(), timer))
        {
            map.remove(&id);
        }
    }

    #[cfg(test)]
    pub(crate) fn lookup_len(&self) -> usize {
        self.inner.lookup.borrow().len()
    }

    #[cfg(test)]
    pub(crate) fn queued_immediates(&self) -> usize {
        self.inner.immediates.borrow().len()
    }

    #[cfg(test)]
    pub(crate) fn set_next_id(&self, id: TimerId) {
        self.inner.next_id.set(id);
    }

    fn debugger(&self) -> Option<Rc<dyn DebuggerHook>> {
        self.inner.debugger.borrow().clone()
    }

    pub(crate) fn note_scheduled(&self, id: TimerId, kind: TimerKind, delay_ms: u32) {
        bump(&self.inner.counters.scheduled);
        if let Some(hook) = self.debugger() {
            hook.did_schedule(id, kind, delay_ms);
        }
    }

    pub(crate) fn note_fired(&self) {
        bump(&self.inner.counters.fired);
    }

    pub(crate) fn note_rearmed(&self) {
        bump(&self.inner.counters.rearmed);
    }

    pub(crate) fn note_cancelled(&self, id: TimerId, kind: TimerKind) {
        bump(&self.inner.counters.cancelled);
        if let Some(hook) = self.debugger() {
            hook.did_cancel(id, kind);
        }
    }

    pub(crate) fn notify_will_fire(&self, id: TimerId, kind: TimerKind) {
        if let Some(hook) = self.debugger() {
            hook.will_fire(id, kind);
        }
    }

    pub(crate) fn notify_did_fire(&self, id: TimerId, kind: TimerKind) {
        if let Some(hook) = self.debugger() {
            hook.did_fire(id, kind);
        }
    }

    /// 将回调异常转发给接收器；排空继续进行
    /// Forward a callback exception to the sink; the drain carries on
    pub(crate) fn report_exception(&self, id: TimerId, kind: TimerKind, error: CallbackError) {
        bump(&self.inner.counters.callback_errors);
        let sink = Rc::clone(&*self.inner.sink.borrow());
        sink.report(id, kind, &error);
    }
}

impl Default for Registry {
    fn default() -> Self {
        let config = TimerConfig::default();
        let clock = MonotonicClock::new();
        let backend = backend_for(config.backend, clock);
        Self::from_parts(config, clock, backend)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("backend", &self.inner.backend.kind())
            .field("stats", &self.stats())
            .finish()
    }
}
