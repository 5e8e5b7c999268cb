//! 注册表统计信息
//! Registry statistics

/// 注册表统计信息
/// Registry statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerStats {
    /// 堆中的条目数（包括内部任务）
    /// Heap-resident entries, internal tasks included
    pub active_timers: usize,
    /// 等待下一个tick的立即任务数
    /// Immediates waiting for the next tick
    pub pending_immediates: usize,
    /// 保活计数
    /// Keep-alive counter
    pub keep_alive: i64,
    pub scheduled: u64,
    pub fired: u64,
    pub cancelled: u64,
    /// 间隔重新调度次数
    /// Interval rearms
    pub rearmed: u64,
    pub callback_errors: u64,
}

impl std::fmt::Display for TimerStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TimerStats {{ active: {}, immediates: {}, keep_alive: {}, scheduled: {}, fired: {}, cancelled: {}, rearmed: {}, errors: {} }}",
            self.active_timers,
            self.pending_immediates,
            self.keep_alive,
            self.scheduled,
            self.fired,
            self.cancelled,
            self.rearmed,
            self.callback_errors
        )
    }
}
