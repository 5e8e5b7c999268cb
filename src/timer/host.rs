//! 宿主协作者接口
//! Host collaborator interfaces
//!
//! 定时器子系统只通过这些窄接口使用宿主：脚本异常接收器和尽力而为的调试器钩子。
//! 钩子的缺失不得改变定时器语义。
//!
//! The timer subsystem consumes the host only through these narrow interfaces:
//! a script-exception sink and a best-effort debugger hook. Absence of the hook
//! must not change timer semantics.

use crate::error::CallbackError;
use crate::timer::entry::{TimerId, TimerKind};
use tracing::error;

/// 回调抛出异常时调用的接收器
/// Sink invoked when a callback raises an exception
pub trait ExceptionSink {
    fn report(&self, id: TimerId, kind: TimerKind, error: &CallbackError);
}

/// 默认接收器：通过 tracing 记录异常
/// Default sink: logs the exception through tracing
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingExceptionSink;

impl ExceptionSink for TracingExceptionSink {
    fn report(&self, id: TimerId, kind: TimerKind, error: &CallbackError) {
        error!(timer_id = %id, kind = ?kind, error = %error, "Timer callback raised an exception");
    }
}

/// 调度、触发和取消时的调试器通知
/// Debugger notifications on schedule, fire and cancel
///
/// 所有方法默认为空操作。钩子在没有持有任何注册表借用时被调用，
/// 因此可以回调注册表。
///
/// Every method defaults to a no-op. Hooks are called with no registry borrow
/// held, so they may call back into the registry.
pub trait DebuggerHook {
    fn did_schedule(&self, _id: TimerId, _kind: TimerKind, _delay_ms: u32) {}

    /// 条目已弹出，回调尚未调用
    /// The entry was popped and its callback is about to run
    fn will_fire(&self, _id: TimerId, _kind: TimerKind) {}

    fn did_fire(&self, _id: TimerId, _kind: TimerKind) {}

    fn did_cancel(&self, _id: TimerId, _kind: TimerKind) {}
}
