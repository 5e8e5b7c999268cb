//! 事件循环定时器模块
//! Event loop timer module
//!
//! 该模块实现了基于侵入式最小堆的单线程定时器子系统：超时、间隔和立即任务
//! 按截止时间排序，在每个事件循环tick中触发，并由一个平台后端保证唤醒。
//!
//! This module implements a single-threaded timer subsystem built on an
//! intrusive min-heap: timeouts, intervals and immediates are ordered by
//! deadline, fired on every event loop tick, and woken up by a platform
//! backend.

pub mod backend;
pub mod callback;
pub mod entry;
pub mod handle;
pub mod heap;
pub mod host;
mod internal_task;
mod internals;
pub mod registry;
pub mod stats;
pub mod time;


pub use backend::{DedicatedBackend, ReactorBackend, TimerBackend, backend_for};
pub use callback::{CallbackResult, FireContext, TimerCallback};
pub use entry::{EntryState, EntryTag, TimerEntry, TimerId, TimerKind};
pub use handle::{ClearTarget, TimerHandle, parse_timer_id};
pub use heap::{HeapMember, TimerHeap};
pub use host::{DebuggerHook, ExceptionSink, TracingExceptionSink};
pub use internal_task::InternalTimerHandle;
pub use internals::normalize_delay;
pub use registry::{Registry, TickReport};
pub use stats::TimerStats;
pub use time::{MonotonicClock, TimeSpec};
