//! 事件循环驱动
//! Event loop driver
//!
//! 一个最小的宿主轮询循环：每个tick先运行立即任务，再排空到期的定时器；
//! 没有立即任务时通过平台后端等待下一个截止时间。只要保活计数为正，循环就继续。
//!
//! A minimal host poll loop: every tick runs the immediates, then drains the
//! due timers; with no immediate pending it waits for the next deadline through
//! the platform backend. The loop goes on while the keep-alive counter is
//! positive.

use crate::config::{EventLoopConfig, TimerConfig};
use crate::error::{Error, Result};
use crate::timer::{Registry, TickReport};
use tracing::{debug, info, warn};

/// 驱动一个注册表的事件循环
/// Event loop driving one registry
#[derive(Debug, Clone)]
pub struct EventLoop {
    registry: Registry,
    config: EventLoopConfig,
}

impl EventLoop {
    /// 围绕已有的注册表创建事件循环
    /// Create an event loop around an existing registry
    pub fn new(registry: Registry) -> Self {
        let config = registry.config().event_loop.clone();
        Self { registry, config }
    }

    /// 创建新的注册表及其事件循环
    /// Create a fresh registry and its event loop
    pub fn with_config(config: TimerConfig) -> Result<Self> {
        Ok(Self::new(Registry::new(config)?))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// 运行一个tick，必要时先等待下一个截止时间
    /// Run one tick, waiting for the next deadline first when needed
    ///
    /// # Errors
    /// 既没有立即任务也没有截止时间时返回 `Error::Stalled`
    /// Returns `Error::Stalled` when there is neither an immediate nor a deadline
    pub async fn run_once(&self) -> Result<TickReport> {
        if !self.registry.has_pending_immediates() {
            let Some(deadline) = self.registry.next_deadline() else {
                return Err(Error::Stalled);
            };
            self.registry.backend().wait(Some(deadline)).await;
        }
        let now = self.registry.now();
        Ok(self.registry.tick(now))
    }

    /// 运行直到没有定时器保持循环存活
    /// Run until no timer keeps the loop alive
    ///
    /// # Returns
    /// 运行的tick数
    /// Number of ticks run
    ///
    /// # Errors
    /// 超过配置的tick上限时返回 `Error::TickLimitExceeded`；
    /// 保活计数为正但无事可等时返回 `Error::Stalled`。
    ///
    /// Returns `Error::TickLimitExceeded` past the configured tick limit and
    /// `Error::Stalled` when alive with nothing to wait for.
    pub async fn run(&self) -> Result<u64> {
        info!(
            backend = ?self.registry.backend().kind(),
            keep_alive = self.registry.keep_alive_count(),
            "Event loop started"
        );

        let mut ticks = 0u64;
        while self.registry.is_alive() {
            if self.config.max_ticks.is_some_and(|limit| ticks >= limit) {
                warn!(ticks, stats = %self.registry.stats(), "Event loop hit its tick limit");
                return Err(Error::TickLimitExceeded(ticks));
            }

            let report = self.run_once().await?;
            ticks += 1;
            debug!(
                tick = ticks,
                immediates = report.immediates,
                timers = report.timers,
                keep_alive = self.registry.keep_alive_count(),
                "Event loop tick"
            );
        }

        info!(ticks, stats = %self.registry.stats(), "Event loop finished");
        Ok(ticks)
    }
}
