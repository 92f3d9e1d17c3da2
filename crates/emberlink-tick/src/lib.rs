//! Fixed-interval tick for Emberlink clients.
//!
//! The client sends input on a steady beat rather than on every key
//! event: each tick, the current movement intent is diffed against what
//! the server last heard and only the changes go out.
//!
//! # No-tick mode
//!
//! When `tick_rate_hz` is 0, [`TickScheduler::wait_for_tick`] pends
//! forever. The client then flushes intent as soon as it changes instead
//! of waiting for a beat.
//!
//! # Integration
//!
//! The scheduler sits in the client's `tokio::select!` loop next to the
//! socket, so a tick and an inbound frame are never handled at once:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         bytes = conn.recv() => { /* decode and dispatch */ }
//!         info = ticker.wait_for_tick() => { /* diff and send intent */ }
//!     }
//! }
//! ```

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Outbound tick rate.
///
/// A tick that fires late never fires twice: missed beats are dropped
/// and the next one is scheduled a full interval after the late one, so
/// a stalled client doesn't flood the server with back-to-back input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickConfig {
    /// Ticks per second. 0 = no tick.
    pub tick_rate_hz: u32,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: Self::DEFAULT_TICK_RATE_HZ,
        }
    }
}

impl TickConfig {
    pub const DEFAULT_TICK_RATE_HZ: u32 = 20;
    pub const MAX_TICK_RATE_HZ: u32 = 128;

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self { tick_rate_hz }
    }

    /// Caps `tick_rate_hz` at [`Self::MAX_TICK_RATE_HZ`]. Called by
    /// [`TickScheduler::new`].
    pub fn validated(mut self) -> Self {
        if self.tick_rate_hz > Self::MAX_TICK_RATE_HZ {
            warn!(
                rate = self.tick_rate_hz,
                max = Self::MAX_TICK_RATE_HZ,
                "tick_rate_hz exceeds maximum, clamping"
            );
            self.tick_rate_hz = Self::MAX_TICK_RATE_HZ;
        }
        self
    }

    /// Interval between ticks, or `None` with no tick.
    pub fn tick_duration(&self) -> Option<Duration> {
        if self.tick_rate_hz == 0 {
            None
        } else {
            Some(Duration::from_secs_f64(1.0 / self.tick_rate_hz as f64))
        }
    }
}

// ---------------------------------------------------------------------------
// Tick info
// ---------------------------------------------------------------------------

/// Returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickInfo {
    /// Starts at 1.
    pub tick: u64,
    /// Whole intervals dropped because this tick fired late.
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

pub struct TickScheduler {
    config: TickConfig,
    tick_duration: Option<Duration>,
    tick_count: u64,
    next_tick: Option<Instant>,
    paused: bool,
}

impl TickScheduler {
    /// The first tick is due one interval from now.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let tick_duration = config.tick_duration();
        let next_tick = tick_duration.map(|d| Instant::now() + d);

        match tick_duration {
            None => debug!("tick scheduler created without a tick"),
            Some(d) => debug!(
                rate_hz = config.tick_rate_hz,
                interval_ms = d.as_secs_f64() * 1000.0,
                "tick scheduler created"
            ),
        }

        Self {
            config,
            tick_duration,
            tick_count: 0,
            next_tick,
            paused: false,
        }
    }

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self::new(TickConfig::with_rate(tick_rate_hz))
    }

    /// Waits until the next tick is due.
    ///
    /// Pends forever with no tick or while paused, so it is safe to use as
    /// an always-present `select!` branch.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let (next, interval) = match (self.next_tick, self.tick_duration) {
            (Some(next), Some(interval)) if !self.paused => (next, interval),
            _ => return std::future::pending::<TickInfo>().await,
        };

        time::sleep_until(next).await;

        let now = Instant::now();
        self.tick_count += 1;

        // Less than a tenth of an interval late counts as on time.
        let late_by = now.saturating_duration_since(next);
        let ticks_skipped = if late_by > interval / 10 {
            (late_by.as_nanos() / interval.as_nanos()) as u64
        } else {
            0
        };
        if ticks_skipped > 0 {
            warn!(
                tick = self.tick_count,
                skipped = ticks_skipped,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "tick overrun, skipping ahead"
            );
        }
        self.next_tick = Some(now + interval);

        trace!(tick = self.tick_count, "tick fired");

        TickInfo {
            tick: self.tick_count,
            ticks_skipped,
        }
    }

    /// Stops ticks until [`resume`](Self::resume). Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.tick_count, "tick scheduler paused");
        }
    }

    /// Restarts ticks one interval from now, so time spent paused doesn't
    /// come back as a burst.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            if let Some(interval) = self.tick_duration {
                self.next_tick = Some(Instant::now() + interval);
            }
            debug!(tick = self.tick_count, "tick scheduler resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// `true` when the rate is 0 and no tick will ever fire.
    pub fn is_event_driven(&self) -> bool {
        self.tick_duration.is_none()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.config.tick_rate_hz
    }

    pub fn tick_duration(&self) -> Option<Duration> {
        self.tick_duration
    }
}
