//! 专用定时器后端
//! Dedicated timer backend
//!
//! 后端拥有一个 `tokio::time::Sleep` 作为操作系统定时器对象。它在首次等待时
//! 创建（创建需要运行时上下文），此后每次 `arm` 改变最早截止时间时原地重置。
//!
//! The backend owns one `tokio::time::Sleep` as its OS timer object. It is
//! created on the first wait (creation needs a runtime context) and reset in
//! place whenever `arm` moves the earliest deadline.

use super::{KeepAliveRef, TimerBackend};
use crate::config::BackendKind;
use crate::timer::time::{MonotonicClock, TimeSpec};
use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::poll_fn;
use std::pin::Pin;
use std::task::Poll;
use tokio::time::{Sleep, sleep_until};
use tracing::trace;

pub struct DedicatedBackend {
    clock: MonotonicClock,
    armed: Cell<Option<TimeSpec>>,
    sleep: RefCell<Option<Pin<Box<Sleep>>>>,
    keep_alive: KeepAliveRef,
    resets: Cell<u64>,
}

impl DedicatedBackend {
    pub fn new(clock: MonotonicClock) -> Self {
        Self {
            clock,
            armed: Cell::new(None),
            sleep: RefCell::new(None),
            keep_alive: KeepAliveRef::default(),
            resets: Cell::new(0),
        }
    }

    /// 定时器对象被重新设置的次数
    /// How many times the timer object was re-armed
    pub fn resets(&self) -> u64 {
        self.resets.get()
    }

    pub fn keep_alive_transitions(&self) -> u64 {
        self.keep_alive.transitions()
    }

    fn reset_to(&self, deadline: TimeSpec) {
        let target = self.clock.instant_at(deadline);
        let mut slot = self.sleep.borrow_mut();
        match slot.as_mut() {
            Some(sleep) if sleep.deadline() == target => {}
            Some(sleep) => {
                sleep.as_mut().reset(target);
                self.resets.set(self.resets.get() + 1);
                trace!(deadline = %deadline, "Dedicated timer re-armed");
            }
            None => *slot = Some(Box::pin(sleep_until(target))),
        }
    }
}

#[async_trait(?Send)]
impl TimerBackend for DedicatedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Dedicated
    }

    fn arm(&self, deadline: Option<TimeSpec>) {
        if self.armed.replace(deadline) == deadline {
            return;
        }
        // 定时器对象尚未创建时，只记录截止时间
        // Before the timer object exists, only the deadline is recorded
        if let Some(deadline) = deadline {
            if self.sleep.borrow().is_some() {
                self.reset_to(deadline);
            }
        }
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
        if self.armed.get() != next_deadline {
            trace!(?next_deadline, "Dedicated timer out of date, re-arming before wait");
            self.arm(next_deadline);
        }
        let Some(deadline) = self.armed.get() else {
            return;
        };
        self.reset_to(deadline);

        // 每次轮询只短暂借用，arm() 可以在等待期间被调用
        // Borrow only per poll so arm() stays callable while waiting
        poll_fn(|cx| match self.sleep.borrow_mut().as_mut() {
            Some(sleep) => sleep.as_mut().poll(cx),
            None => Poll::Ready(()),
        })
        .await;
    }
}

impl fmt::Debug for DedicatedBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DedicatedBackend")
            .field("armed", &self.armed.get())
            .field("has_timer_object", &self.sleep.borrow().is_some())
            .field("keep_alive", &self.keep_alive.is_held())
            .field("resets", &self.resets.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timer_object_is_reset_in_place() {
        let clock = MonotonicClock::new();
        let backend = DedicatedBackend::new(clock);

        // 首次等待之前只记录截止时间
        // Before the first wait only the deadline is recorded
        backend.arm(Some(TimeSpec::from_millis(10)));
        assert_eq!(backend.resets(), 0);
        backend.wait(Some(TimeSpec::from_millis(10))).await;
        assert_eq!(clock.now(), TimeSpec::from_millis(10));

        backend.arm(Some(TimeSpec::from_millis(30)));
        assert_eq!(backend.resets(), 1);
        backend.wait(Some(TimeSpec::from_millis(30))).await;
        assert_eq!(clock.now(), TimeSpec::from_millis(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarmed_wait_returns_immediately() {
        let clock = MonotonicClock::new();
        let backend = DedicatedBackend::new(clock);
        backend.wait(None).await;
        assert_eq!(clock.now(), TimeSpec::ZERO);
    }
}
