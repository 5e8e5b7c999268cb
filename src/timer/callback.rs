//! 定时器回调类型定义
//! Timer callback type definitions

use crate::error::CallbackError;
use crate::timer::handle::TimerHandle;
use crate::timer::registry::Registry;
use crate::timer::time::TimeSpec;
use std::cell::RefCell;
use std::rc::Rc;

/// 回调的返回值；`Err` 表示回调抛出了异常
/// Callback return value; `Err` means the callback raised an exception
pub type CallbackResult = Result<(), CallbackError>;

/// 定时器回调 trait
/// Timer callback trait
///
/// 回调及其捕获的参数由定时器对象拥有；取消时释放。
/// The callback and the arguments it captured are owned by the timer object
/// and released on cancel.
pub trait TimerCallback: 'static {
    /// 处理定时器触发
    /// Handle a timer firing
    fn on_fire(&mut self, cx: &FireContext<'_>) -> CallbackResult;
}

impl<F> TimerCallback for F
where
    F: FnMut(&FireContext<'_>) -> CallbackResult + 'static,
{
    fn on_fire(&mut self, cx: &FireContext<'_>) -> CallbackResult {
        self(cx)
    }
}

pub(crate) type SharedCallback = Rc<RefCell<dyn TimerCallback>>;

/// 触发期间传给回调的上下文
/// Context handed to a callback while it fires
///
/// 回调可以通过它同步地取消、刷新或创建定时器，包括它自己。
/// Through it a callback may synchronously cancel, refresh or create timers,
/// including its own.
pub struct FireContext<'a> {
    registry: &'a Registry,
    timer: &'a TimerHandle,
    now: TimeSpec,
}

impl<'a> FireContext<'a> {
    pub(crate) fn new(registry: &'a Registry, timer: &'a TimerHandle, now: TimeSpec) -> Self {
        Self {
            registry,
            timer,
            now,
        }
    }

    pub fn registry(&self) -> &Registry {
        self.registry
    }

    /// 正在触发的定时器
    /// The timer that is firing
    pub fn timer(&self) -> &TimerHandle {
        self.timer
    }

    /// 本次排空开始前捕获的时间戳
    /// Timestamp captured before this drain started
    pub fn now(&self) -> TimeSpec {
        self.now
    }
}
