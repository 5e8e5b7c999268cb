//! 反应器后端：不持有定时器对象，轮询时按下一个截止时间计算等待时长
//! Reactor backend: owns no timer object and derives the wait from the next
//! deadline at poll time

use super::{KeepAliveRef, TimerBackend};
use crate::config::BackendKind;
use crate::timer::time::{MonotonicClock, TimeSpec};
use async_trait::async_trait;
use std::cell::Cell;
use tokio::time::sleep_until;

#[derive(Debug)]
pub struct ReactorBackend {
    clock: MonotonicClock,
    armed: Cell<Option<TimeSpec>>,
    keep_alive: KeepAliveRef,
}

impl ReactorBackend {
    pub fn new(clock: MonotonicClock) -> Self {
        Self {
            clock,
            armed: Cell::new(None),
            keep_alive: KeepAliveRef::default(),
        }
    }

    pub fn keep_alive_transitions(&self) -> u64 {
        self.keep_alive.transitions()
    }
}

#[async_trait(?Send)]
impl TimerBackend for ReactorBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Reactor
    }

    fn arm(&self, deadline: Option<TimeSpec>) {
        self.armed.set(deadline);
    }

    fn armed_deadline(&self) -> Option<TimeSpec> {
        self.armed.get()
    }

    fn ref_keep_alive(&self) {
        self.keep_alive.acquire();
    }

    fn unref_keep_alive(&self) {
        self.keep_alive.release();
    }

    fn holds_keep_alive(&self) -> bool {
        self.keep_alive.is_held()
    }

    async fn wait(&self, next_deadline: Option<TimeSpec>) {
        // 轮询超时 = next_deadline - now；没有截止时间就不阻塞
        // Poll timeout = next_deadline - now; no deadline means no blocking
        if let Some(deadline) = next_deadline {
            sleep_until(self.clock.instant_at(deadline)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_wait_sleeps_until_deadline() {
        let clock = MonotonicClock::new();
        let backend = ReactorBackend::new(clock);

        backend.wait(None).await;
        assert_eq!(clock.now(), TimeSpec::ZERO);

        backend.wait(Some(TimeSpec::from_millis(20))).await;
        assert_eq!(clock.now(), TimeSpec::from_millis(20));
    }

    #[test]
    fn test_keep_alive_transitions_are_counted() {
        let backend = ReactorBackend::new(MonotonicClock::new());
        backend.ref_keep_alive();
        assert!(backend.holds_keep_alive());
        backend.unref_keep_alive();
        assert!(!backend.holds_keep_alive());
        assert_eq!(backend.keep_alive_transitions(), 2);
    }
}
