//! 事件循环集成测试
//! Event loop integration tests

pub mod common;

use common::harness::{FireLog, config, init_tracing};
use loop_timers::{BackendKind, Error, EventLoop, TimerConfig};
use tokio::time::Instant;

/// 构造一个混合场景并运行到结束，返回触发顺序
/// Build a mixed scenario, run it to completion and return the firing order
async fn run_mixed_scenario(backend: BackendKind) -> Vec<String> {
    let event_loop = EventLoop::with_config(config(backend, Some(1_000))).unwrap();
    let registry = event_loop.registry();
    let log = FireLog::default();

    registry.schedule_timeout(log.recorder("a30"), 30.0);
    registry.schedule_timeout(log.recorder("b10"), 10.0);

    let interval_log = log.clone();
    let mut runs = 0;
    registry.schedule_interval(
        move |cx| {
            runs += 1;
            interval_log.push("i20");
            if runs == 3 {
                cx.timer().cancel();
            }
            Ok(())
        },
        20.0,
    );

    let nested_log = log.clone();
    registry.schedule_timeout(
        move |cx| {
            nested_log.push("c10");
            cx.registry()
                .schedule_timeout(nested_log.recorder("nested"), 15.0);
            Ok(())
        },
        10.0,
    );

    registry.schedule_timeout(log.recorder("z0"), 0.0);
    registry.schedule_immediate(log.recorder("immediate"));

    let ticks = event_loop.run().await.unwrap();
    assert!(ticks > 0);
    assert!(!registry.is_alive());
    assert_eq!(registry.active_count(), 0);
    log.entries()
}

#[tokio::test(start_paused = true)]
async fn test_both_backends_fire_in_the_same_order() {
    init_tracing();

    let expected = vec![
        "z0", "immediate", "b10", "c10", "i20", "nested", "a30", "i20", "i20",
    ];
    let reactor = run_mixed_scenario(BackendKind::Reactor).await;
    assert_eq!(reactor, expected);

    let dedicated = run_mixed_scenario(BackendKind::Dedicated).await;
    assert_eq!(dedicated, reactor);
}

#[tokio::test(start_paused = true)]
async fn test_tick_limit_stops_runaway_interval() {
    init_tracing();
    let event_loop = EventLoop::with_config(config(BackendKind::Reactor, Some(5))).unwrap();
    let log = FireLog::default();
    event_loop
        .registry()
        .schedule_interval(log.recorder("forever"), 1.0);

    let result = event_loop.run().await;
    assert!(matches!(result, Err(Error::TickLimitExceeded(5))));
    assert_eq!(log.entries().len(), 5);
    assert!(event_loop.registry().is_alive());

    event_loop.registry().shutdown();
    assert!(!event_loop.registry().is_alive());
}

#[tokio::test(start_paused = true)]
async fn test_unref_timers_do_not_hold_the_loop() {
    init_tracing();
    let event_loop = EventLoop::with_config(TimerConfig::default()).unwrap();
    let log = FireLog::default();
    let registry = event_loop.registry();

    registry.schedule_timeout(log.recorder("timeout"), 10.0).unref_timer();
    registry.schedule_interval(log.recorder("interval"), 5.0).unref_timer();

    assert_eq!(event_loop.run().await.unwrap(), 0);
    assert!(log.entries().is_empty());
    assert_eq!(registry.active_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_run_once_without_work_is_stalled() {
    init_tracing();
    let event_loop = EventLoop::with_config(TimerConfig::default()).unwrap();
    assert!(matches!(event_loop.run_once().await, Err(Error::Stalled)));
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let mut config = TimerConfig::default();
    config.delay.min_delay_ms = 0;
    assert!(matches!(
        EventLoop::with_config(config),
        Err(Error::InvalidConfig(_))
    ));
}

#[tokio::test]
async fn test_wakes_no_earlier_than_deadline_on_real_clock() {
    init_tracing();
    for backend in [BackendKind::Reactor, BackendKind::Dedicated] {
        let event_loop = EventLoop::with_config(config(backend, Some(100))).unwrap();
        let started = Instant::now();
        let fired_at = std::rc::Rc::new(std::cell::Cell::new(None));
        let slot = fired_at.clone();
        event_loop.registry().schedule_timeout(
            move |_| {
                slot.set(Some(Instant::now()));
                Ok(())
            },
            20.0,
        );

        event_loop.run().await.unwrap();
        let fired_at = fired_at.get().unwrap();
        assert!(fired_at.duration_since(started).as_millis() >= 20);
    }
}
