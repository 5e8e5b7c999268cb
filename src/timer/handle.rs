//! 定时器句柄
//! Timer handle
//!
//! 本模块包含外部可见的定时器句柄、按句柄/数字/字符串取消的目标类型，
//! 以及字符串ID的严格整数语法。
//!
//! This module contains the externally visible timer handle, the target type
//! for cancel-by-handle/number/string, and the strict integer grammar for
//! string ids.

use crate::timer::entry::{EntryState, TimerId, TimerKind};
use crate::timer::internals::TimerObject;
use crate::timer::time::TimeSpec;
use std::fmt;
use std::rc::Rc;

/// 外部可见的定时器句柄，与内部堆条目不同
/// Externally visible timer handle, distinct from the internal heap entry
///
/// 句柄可以克隆；所有克隆指向同一个定时器。
/// Handles are cheap to clone; every clone refers to the same timer.
#[derive(Clone)]
pub struct TimerHandle {
    object: Rc<TimerObject>,
}

impl TimerHandle {
    pub(crate) fn new(object: Rc<TimerObject>) -> Self {
        Self { object }
    }

    #[cfg(test)]
    pub(crate) fn object(&self) -> &Rc<TimerObject> {
        &self.object
    }

    /// 不登记查找表的ID访问器，用于日志
    /// Id accessor that does not register the lookup map, for logging
    pub fn id(&self) -> TimerId {
        self.object.id()
    }

    /// 以数字形式读取ID
    /// Read the id as a number
    ///
    /// 首次调用会将定时器登记到注册表的查找表中，之后按ID取消才能找到它。
    /// The first call registers the timer in the registry lookup map; only
    /// after that does cancel-by-id find it.
    pub fn value_of(&self) -> i32 {
        self.object.observe_id()
    }

    pub fn kind(&self) -> TimerKind {
        self.object.kind()
    }

    pub fn state(&self) -> EntryState {
        self.object.entry.state()
    }

    /// 最近一次计算出的截止时间
    /// The most recently computed deadline
    pub fn deadline(&self) -> TimeSpec {
        self.object.entry.deadline()
    }

    /// 规范化后的延迟或周期（毫秒）
    /// Normalized delay or period in milliseconds
    pub fn period_ms(&self) -> u32 {
        self.object.period_ms()
    }

    /// 定时器是否还会触发
    /// Whether the timer will still fire
    pub fn is_scheduled(&self) -> bool {
        self.object.is_scheduled()
    }

    pub fn is_cancelled(&self) -> bool {
        self.object.is_cleared()
    }

    /// 用户是否希望此定时器保持进程存活
    /// Whether the user wants this timer to keep the process alive
    pub fn has_ref(&self) -> bool {
        self.object.has_user_ref()
    }

    /// 此定时器当前是否计入保活计数
    /// Whether this timer currently counts toward keep-alive
    pub fn is_keeping_alive(&self) -> bool {
        self.object.is_keeping_alive()
    }

    /// 让定时器保持进程存活；幂等，不影响触发
    /// Make the timer keep the process alive; idempotent, never affects firing
    ///
    /// # Returns
    /// 调用后的保活成员资格
    /// Keep-alive membership after the call
    pub fn ref_timer(&self) -> bool {
        let registry = self.object.registry();
        self.object.set_ref(registry.as_ref(), true);
        self.object.is_keeping_alive()
    }

    /// 不让定时器阻止进程退出；幂等，不影响触发
    /// Stop the timer from holding the process open; idempotent, never affects firing
    ///
    /// # Returns
    /// 调用后的保活成员资格
    /// Keep-alive membership after the call
    pub fn unref_timer(&self) -> bool {
        let registry = self.object.registry();
        self.object.set_ref(registry.as_ref(), false);
        self.object.is_keeping_alive()
    }

    /// 将截止时间重置为 `now + period`，保留ID和引用标志
    /// Reset the deadline to `now + period`, keeping id and ref flag
    ///
    /// 对立即任务或已取消的定时器无效。
    /// No-op for immediates and cancelled timers.
    pub fn refresh(&self) -> &Self {
        if let Some(registry) = self.object.registry() {
            let now = registry.now();
            self.object.refresh(&registry, now);
        }
        self
    }

    /// 取消定时器
    /// Cancel the timer
    ///
    /// # Returns
    /// 如果此调用取消了定时器则返回 `true`
    /// Returns `true` if this call cancelled the timer
    pub fn cancel(&self) -> bool {
        match self.object.registry() {
            Some(registry) => self.object.cancel(&registry),
            None => false,
        }
    }

    pub fn ptr_eq(&self, other: &TimerHandle) -> bool {
        Rc::ptr_eq(&self.object, &other.object)
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TimerHandle").field(&*self.object).finish()
    }
}

/// 取消目标：句柄、数字ID或字符串ID
/// Cancel target: a handle, a numeric id, or a string id
#[derive(Debug, Clone, Copy)]
pub enum ClearTarget<'a> {
    Handle(&'a TimerHandle),
    Number(f64),
    Text(&'a str),
}

impl<'a> From<&'a TimerHandle> for ClearTarget<'a> {
    fn from(handle: &'a TimerHandle) -> Self {
        ClearTarget::Handle(handle)
    }
}

impl From<f64> for ClearTarget<'_> {
    fn from(value: f64) -> Self {
        ClearTarget::Number(value)
    }
}

impl From<i32> for ClearTarget<'_> {
    fn from(value: i32) -> Self {
        ClearTarget::Number(f64::from(value))
    }
}

impl From<TimerId> for ClearTarget<'_> {
    fn from(id: TimerId) -> Self {
        ClearTarget::Number(f64::from(id.get()))
    }
}

impl<'a> From<&'a str> for ClearTarget<'a> {
    fn from(text: &'a str) -> Self {
        ClearTarget::Text(text)
    }
}

/// 按严格整数语法解析字符串ID
/// Parse a string id under the strict integer grammar
///
/// 只接受十进制数字；拒绝前导零（"0" 本身除外）、空白、符号和其他字符。
/// 不匹配时返回 `None`，调用方视为"没有此定时器"。
///
/// Only decimal digits are accepted; leading zeros (except "0" itself),
/// whitespace, signs and any other character are rejected. A mismatch yields
/// `None`, which callers treat as "no such timer".
pub fn parse_timer_id(text: &str) -> Option<i32> {
    match text.as_bytes() {
        [] => None,
        [b'0'] => Some(0),
        [b'0', ..] => None,
        bytes if bytes.iter().all(u8::is_ascii_digit) => text.parse().ok(),
        _ => None,
    }
}

/// 只接受可以精确表示为 i32 的整数值
/// Only integral values exactly representable as an i32 are accepted
pub(crate) fn id_from_number(value: f64) -> Option<i32> {
    let in_range = value >= f64::from(i32::MIN) && value <= f64::from(i32::MAX);
    (in_range && value.fract() == 0.0).then_some(value as i32)
}
