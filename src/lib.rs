#![deny(clippy::expect_used, clippy::unwrap_used)]

//! The root of the event loop timer library.
//! 事件循环定时器库的根。
//!
//! A [`Registry`] owns the deadline heap and the immediate queue of one event
//! loop; an [`EventLoop`] drives it with a platform backend until no timer keeps
//! it alive.
//!
//! 一个 [`Registry`] 拥有一个事件循环的截止时间堆和立即任务队列；
//! [`EventLoop`] 使用平台后端驱动它，直到没有定时器保持其存活。

pub mod config;
pub mod error;
pub mod event_loop;
pub mod timer;

pub use config::{BackendKind, DelayConfig, DelayOverflowPolicy, EventLoopConfig, TimerConfig};
pub use error::{CallbackError, Error, Result};
pub use event_loop::EventLoop;
pub use timer::{
    ClearTarget, FireContext, Registry, TickReport, TimeSpec, TimerHandle, TimerId, TimerKind,
    TimerStats,
};
