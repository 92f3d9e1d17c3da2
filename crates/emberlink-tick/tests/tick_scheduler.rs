//! Integration tests for the outbound tick scheduler.
//!
//! Timing tests run with `start_paused = true`, so tokio's clock is
//! virtual and auto-advances whenever every task is waiting on a timer.

use std::time::Duration;

use emberlink_tick::{TickConfig, TickScheduler};

// =========================================================================
// TickConfig
// =========================================================================

#[test]
fn test_default_config_ticks_at_20hz() {
    let cfg = TickConfig::default();
    assert_eq!(cfg.tick_rate_hz, 20);
    assert_eq!(cfg.tick_duration(), Some(Duration::from_millis(50)));
}

#[test]
fn test_zero_rate_has_no_duration() {
    assert_eq!(TickConfig::with_rate(0).tick_duration(), None);
}

#[test]
fn test_tick_duration_at_60hz() {
    let dur = TickConfig::with_rate(60).tick_duration().unwrap();
    assert_eq!(dur, Duration::from_secs_f64(1.0 / 60.0));
}

#[test]
fn test_validated_clamps_rate() {
    let cfg = TickConfig::with_rate(1_000).validated();
    assert_eq!(cfg.tick_rate_hz, TickConfig::MAX_TICK_RATE_HZ);
}

// =========================================================================
// Construction
// =========================================================================

#[test]
fn test_fresh_scheduler_has_fired_nothing() {
    let s = TickScheduler::with_rate(10);
    assert_eq!(s.tick_count(), 0);
    assert_eq!(s.tick_rate_hz(), 10);
    assert!(!s.is_event_driven());
    assert!(!s.is_paused());
    assert_eq!(s.tick_duration(), Some(Duration::from_millis(100)));
}

#[test]
fn test_scheduler_without_tick() {
    let s = TickScheduler::with_rate(0);
    assert!(s.is_event_driven());
    assert_eq!(s.tick_duration(), None);
}

#[tokio::test]
async fn test_new_clamps_rate() {
    let s = TickScheduler::with_rate(500);
    assert_eq!(s.tick_rate_hz(), 128);
}

// =========================================================================
// Tick firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_wait_for_tick_fires_after_one_interval() {
    let mut s = TickScheduler::with_rate(20);
    let start = tokio::time::Instant::now();

    let info = s.wait_for_tick().await;
    assert_eq!(info.tick, 1);
    assert_eq!(info.ticks_skipped, 0);
    assert_eq!(start.elapsed(), Duration::from_millis(50));
}

#[tokio::test(start_paused = true)]
async fn test_ticks_increment_monotonically() {
    let mut s = TickScheduler::with_rate(20);
    for expected in 1..=5 {
        assert_eq!(s.wait_for_tick().await.tick, expected);
    }
    assert_eq!(s.tick_count(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_zero_rate_never_fires() {
    let mut s = TickScheduler::with_rate(0);
    let result = tokio::time::timeout(Duration::from_secs(5), s.wait_for_tick()).await;
    assert!(result.is_err(), "a scheduler without a tick should pend forever");
}

// =========================================================================
// Overruns
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_late_tick_skips_missed_beats() {
    let mut s = TickScheduler::with_rate(20);
    let start = tokio::time::Instant::now();
    tokio::time::advance(Duration::from_millis(200)).await;

    let late = s.wait_for_tick().await;
    assert_eq!(late.tick, 1);
    assert_eq!(late.ticks_skipped, 3);

    // Next tick is a full interval after the late one, not a catch-up burst.
    let next = s.wait_for_tick().await;
    assert_eq!(next.tick, 2);
    assert_eq!(next.ticks_skipped, 0);
    assert_eq!(start.elapsed(), Duration::from_millis(250));
}

#[tokio::test(start_paused = true)]
async fn test_slightly_late_tick_is_on_time() {
    let mut s = TickScheduler::with_rate(20);
    tokio::time::advance(Duration::from_millis(54)).await;

    let info = s.wait_for_tick().await;
    assert_eq!(info.ticks_skipped, 0);
}

// =========================================================================
// Pause / Resume
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_paused_scheduler_sends_nothing() {
    let mut s = TickScheduler::with_rate(20);
    s.wait_for_tick().await;

    s.pause();
    assert!(s.is_paused());
    let result = tokio::time::timeout(Duration::from_secs(1), s.wait_for_tick()).await;
    assert!(result.is_err(), "paused scheduler should pend");
}

#[tokio::test(start_paused = true)]
async fn test_resume_restarts_one_interval_later() {
    let mut s = TickScheduler::with_rate(20);
    s.wait_for_tick().await;
    s.pause();
    tokio::time::advance(Duration::from_secs(3)).await;
    s.resume();

    let info = s.wait_for_tick().await;
    assert_eq!(info.tick, 2);
    assert_eq!(info.ticks_skipped, 0, "time spent paused must not count as lateness");
}

#[tokio::test]
async fn test_repeated_pause_and_resume_is_harmless() {
    let mut s = TickScheduler::with_rate(20);
    s.pause();
    s.pause();
    assert!(s.is_paused());
    s.resume();
    s.resume();
    assert!(!s.is_paused());
}

// =========================================================================
// select! loop pattern
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_input_loop_stops_on_quit_command() {
    let mut s = TickScheduler::with_rate(20);
    let (tx, mut rx) = tokio::sync::mpsc::channel::<&str>(10);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(160)).await;
        tx.send("stop").await.ok();
    });

    let mut ticks_fired = 0u64;
    loop {
        tokio::select! {
            Some(cmd) = rx.recv() => {
                assert_eq!(cmd, "stop");
                break;
            }
            info = s.wait_for_tick() => {
                ticks_fired += 1;
                assert_eq!(info.tick, ticks_fired);
            }
        }
    }

    assert_eq!(ticks_fired, 3);
}
