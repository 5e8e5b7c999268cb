//! 单调时间点
//! Monotonic time points
//!
//! `TimeSpec` 是相对于注册表时钟原点的绝对单调时间点（秒 + 纳秒）。
//! 时钟基于 `tokio::time::Instant`，因此在测试中暂停的 tokio 时间同样驱动它。
//!
//! `TimeSpec` is an absolute monotonic instant (seconds + nanoseconds) measured
//! from the registry clock's origin. The clock is built on `tokio::time::Instant`,
//! so paused tokio time drives it in tests as well.

use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

const NANOS_PER_SEC: u32 = 1_000_000_000;

/// 可休眠的最远偏移，与 tokio 的 far-future 相同（约30年）
/// Furthest sleepable offset, the same as tokio's far future (about 30 years)
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// An absolute monotonic instant.
/// 绝对单调时间点。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimeSpec {
    sec: u64,
    nsec: u32,
}

impl TimeSpec {
    /// The clock origin.
    /// 时钟原点。
    pub const ZERO: TimeSpec = TimeSpec { sec: 0, nsec: 0 };

    /// Build a time point, carrying whole seconds out of `nsec`.
    /// 构造时间点，将 `nsec` 中的整秒进位。
    pub fn new(sec: u64, nsec: u32) -> Self {
        let carry = u64::from(nsec / NANOS_PER_SEC);
        Self {
            sec: sec.saturating_add(carry),
            nsec: nsec % NANOS_PER_SEC,
        }
    }

    pub fn from_duration(since_origin: Duration) -> Self {
        Self {
            sec: since_origin.as_secs(),
            nsec: since_origin.subsec_nanos(),
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::from_duration(Duration::from_millis(ms))
    }

    pub fn sec(&self) -> u64 {
        self.sec
    }

    pub fn nsec(&self) -> u32 {
        self.nsec
    }

    /// Time elapsed since the clock origin.
    /// 自时钟原点以来经过的时间。
    pub fn as_duration(&self) -> Duration {
        Duration::new(self.sec, self.nsec)
    }

    pub fn saturating_add(self, delta: Duration) -> Self {
        Self::from_duration(self.as_duration().saturating_add(delta))
    }

    pub fn add_millis(self, ms: u64) -> Self {
        self.saturating_add(Duration::from_millis(ms))
    }

    /// How long from `self` until `later`; zero if `later` is not after `self`.
    /// 从 `self` 到 `later` 的时长；如果 `later` 不晚于 `self` 则为零。
    pub fn duration_until(&self, later: TimeSpec) -> Duration {
        later.as_duration().saturating_sub(self.as_duration())
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}s", self.sec, self.nsec)
    }
}

/// The monotonic clock a registry reads its `now` from.
///
/// 注册表读取 `now` 的单调时钟。
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Start a clock whose origin is the current instant.
    /// 创建一个以当前时刻为原点的时钟。
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn now(&self) -> TimeSpec {
        TimeSpec::from_duration(self.origin.elapsed())
    }

    /// Convert a time point back into a tokio instant, for sleeping on it.
    /// Offsets beyond the far future are clamped to it.
    ///
    /// 将时间点转换回 tokio 时刻，用于在其上休眠。超过 far-future 的偏移被钳制。
    pub fn instant_at(&self, at: TimeSpec) -> Instant {
        let offset = at.as_duration().min(FAR_FUTURE);
        self.origin
            .checked_add(offset)
            .unwrap_or_else(|| Instant::now() + FAR_FUTURE)
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nanosecond_carry() {
        let t = TimeSpec::new(1, 2_500_000_000);
        assert_eq!(t.sec(), 3);
        assert_eq!(t.nsec(), 500_000_000);
    }

    #[test]
    fn test_total_order() {
        let a = TimeSpec::new(1, 999_999_999);
        let b = TimeSpec::new(2, 0);
        assert!(a < b);
        assert_eq!(TimeSpec::from_millis(1500), TimeSpec::new(1, 500_000_000));
    }

    #[test]
    fn test_duration_until_saturates() {
        let early = TimeSpec::from_millis(10);
        let late = TimeSpec::from_millis(35);
        assert_eq!(early.duration_until(late), Duration::from_millis(25));
        assert_eq!(late.duration_until(early), Duration::ZERO);
    }

    #[test]
    fn test_display() {
        assert_eq!(TimeSpec::new(3, 42).to_string(), "3.000000042s");
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_follows_paused_time() {
        let clock = MonotonicClock::new();
        assert_eq!(clock.now(), TimeSpec::ZERO);

        tokio::time::advance(Duration::from_millis(250)).await;
        assert_eq!(clock.now(), TimeSpec::from_millis(250));
        assert_eq!(
            clock.instant_at(TimeSpec::from_millis(250)),
            tokio::time::Instant::now()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_instant_at_clamps_unbounded_time_points() {
        let clock = MonotonicClock::new();
        let far = clock.instant_at(TimeSpec::from_duration(Duration::MAX));
        assert_eq!(far, clock.instant_at(TimeSpec::from_duration(FAR_FUTURE)));
        assert!(far > clock.instant_at(TimeSpec::from_millis(u64::from(u32::MAX))));
    }
}
