//! 定义了库中所有可能的错误类型。
//! Defines all possible error types in the library.
//!
//! 调度、取消、引用计数和刷新在正确使用下不会失败，因此这里只包含
//! 外层表面（配置、事件循环驱动）的错误，以及用户回调抛出的异常。
//!
//! Scheduling, cancellation, ref/unref and refresh never fail under correct
//! usage, so this only covers the outer surfaces (configuration, the event
//! loop driver) plus the exceptions user callbacks raise.

use thiserror::Error;

/// The primary error type for the timer library.
/// 定时器库的主要错误类型。
#[derive(Debug, Error)]
pub enum Error {
    /// The supplied configuration is inconsistent.
    /// 提供的配置不一致。
    #[error("invalid timer configuration: {0}")]
    InvalidConfig(String),

    /// The event loop ran for the configured maximum number of ticks while
    /// timers were still keeping it alive.
    ///
    /// 事件循环运行了配置的最大tick数，但仍有定时器保持其存活。
    #[error("event loop exceeded the tick limit of {0}")]
    TickLimitExceeded(u64),

    /// The keep-alive counter is positive but there is neither a deadline nor
    /// an immediate to wait for.
    ///
    /// 保活计数为正，但既没有截止时间也没有立即任务可等待。
    #[error("event loop is alive but has nothing to wait for")]
    Stalled,
}

/// A specialized `Result` type for this library.
/// 本库专用的 `Result` 类型。
pub type Result<T> = std::result::Result<T, Error>;

/// An exception raised by a user callback.
///
/// 用户回调抛出的异常。它在调用边界被捕获并转发给宿主异常接收器，
/// 永远不会中断排空过程。
///
/// It is caught at the invocation boundary and forwarded to the host
/// exception sink; it never aborts a drain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CallbackError {
    message: String,
}

impl CallbackError {
    /// Create a new callback error with the given message.
    /// 使用给定消息创建回调错误。
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message the callback raised.
    /// 回调抛出的消息。
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for CallbackError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for CallbackError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}
