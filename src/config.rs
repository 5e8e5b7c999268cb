//! 定义了定时器子系统的可配置参数。
//! Defines configurable parameters for the timer subsystem.

use crate::error::{Error, Result};

/// The largest delay a host timer accepts, in milliseconds (2^31 - 1).
/// 宿主定时器接受的最大延迟（毫秒）。
pub const TIMEOUT_MAX_MS: u32 = i32::MAX as u32;

/// A structure containing all configurable parameters for a registry.
///
/// 包含注册表所有可配置参数的结构体。
#[derive(Debug, Clone, Default)]
pub struct TimerConfig {
    /// Delay normalization parameters.
    /// 延迟规范化参数。
    pub delay: DelayConfig,

    /// Which platform backend guarantees the wake-up.
    /// 由哪个平台后端保证唤醒。
    pub backend: BackendKind,

    /// Parameters of the embedding poll loop.
    /// 嵌入式轮询循环的参数。
    pub event_loop: EventLoopConfig,
}

/// How out-of-range delays are normalized.
///
/// 超出范围的延迟如何被规范化。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelayOverflowPolicy {
    /// Non-finite or out-of-range delays become `min_delay_ms`.
    /// 非有限或超出范围的延迟变为 `min_delay_ms`。
    #[default]
    ClampToMin,
    /// Delays above the range saturate to `max_delay_ms`. NaN and negative
    /// overflow still clamp to the minimum.
    ///
    /// 超出上限的延迟饱和为 `max_delay_ms`。NaN 和负向溢出仍然钳制为最小值。
    Saturate,
}

/// The platform strategy that guarantees a wake-up at or before the next deadline.
///
/// 保证在下一个截止时间之前或当时唤醒的平台策略。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// The poll loop queries the next deadline and uses it as its wait bound.
    /// 轮询循环查询下一个截止时间并将其用作等待上限。
    #[default]
    Reactor,
    /// A dedicated timer object is re-armed whenever the earliest deadline changes.
    /// 每当最早截止时间变化时重新设置一个专用定时器对象。
    Dedicated,
}

/// Delay normalization parameters.
///
/// 延迟规范化参数。
#[derive(Debug, Clone)]
pub struct DelayConfig {
    /// What happens to non-finite or out-of-range delays.
    /// 非有限或超出范围的延迟如何处理。
    pub overflow_policy: DelayOverflowPolicy,
    /// The smallest delay a heap timer is scheduled with.
    /// 堆定时器调度时的最小延迟。
    pub min_delay_ms: u32,
    /// The largest representable delay.
    /// 可表示的最大延迟。
    pub max_delay_ms: u32,
    /// Whether a one-shot timeout whose delay normalizes to zero is serviced
    /// through the immediate queue instead of the heap.
    ///
    /// 延迟规范化为零的一次性超时是否通过立即队列而不是堆来处理。
    pub zero_delay_as_immediate: bool,
}

/// Parameters of the embedding poll loop.
///
/// 嵌入式轮询循环的参数。
#[derive(Debug, Clone, Default)]
pub struct EventLoopConfig {
    /// Upper bound on ticks per `run`, guarding against timers that keep
    /// rescheduling themselves forever. `None` means unbounded.
    ///
    /// 每次 `run` 的tick上限，防止定时器永远重新调度自身。`None` 表示无上限。
    pub max_ticks: Option<u64>,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            overflow_policy: DelayOverflowPolicy::ClampToMin,
            min_delay_ms: 1,
            max_delay_ms: TIMEOUT_MAX_MS,
            zero_delay_as_immediate: true,
        }
    }
}

impl TimerConfig {
    /// Check the configuration for internal consistency.
    /// 检查配置的内部一致性。
    pub fn validate(&self) -> Result<()> {
        let delay = &self.delay;
        if delay.min_delay_ms == 0 {
            return Err(Error::InvalidConfig(
                "min_delay_ms must be at least 1".to_string(),
            ));
        }
        if delay.min_delay_ms > delay.max_delay_ms {
            return Err(Error::InvalidConfig(format!(
                "min_delay_ms ({}) exceeds max_delay_ms ({})",
                delay.min_delay_ms, delay.max_delay_ms
            )));
        }
        if delay.max_delay_ms > TIMEOUT_MAX_MS {
            return Err(Error::InvalidConfig(format!(
                "max_delay_ms ({}) exceeds {}",
                delay.max_delay_ms, TIMEOUT_MAX_MS
            )));
        }
        if self.event_loop.max_ticks == Some(0) {
            return Err(Error::InvalidConfig(
                "max_ticks must be positive when set".to_string(),
            ));
        }
        Ok(())
    }
}
