//! Global request pacing
//!
//! Every outbound request (page, image, HEAD probe, robots.txt) waits on the
//! same pacer, so the configured minimum interval holds no matter how many
//! image workers are running.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Largest interval the pacer enforces; longer requests are clamped to it
pub const MAX_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Enforces a minimum interval between the start of consecutive requests
///
/// Callers reserve the next free slot under a lock and then sleep outside of
/// it, so waiting workers are released one interval apart in arrival order.
/// The first request also waits one interval after construction.
#[derive(Debug)]
pub struct Pacer {
    state: Mutex<PacerState>,
}

#[derive(Debug)]
struct PacerState {
    /// Earliest instant the next request may start
    next_slot: Instant,

    /// Minimum time between request starts
    interval: Duration,
}

impl Pacer {
    /// Creates a pacer with the given minimum interval
    pub fn new(interval: Duration) -> Self {
        let interval = interval.min(MAX_INTERVAL);
        let now = Instant::now();
        Self {
            state: Mutex::new(PacerState {
                next_slot: after(now, interval),
                interval,
            }),
        }
    }

    /// Waits until the caller may send its request
    pub async fn wait(&self) {
        let slot = {
            let mut state = self.state.lock().await;
            let slot = std::cmp::max(state.next_slot, Instant::now());
            state.next_slot = after(slot, state.interval);
            slot
        };

        tokio::time::sleep_until(slot).await;
    }

    /// Raises the interval if `interval` is larger than the current one
    ///
    /// Returns true when the interval changed. The interval is never lowered
    /// and never exceeds [`MAX_INTERVAL`].
    pub async fn raise_interval(&self, interval: Duration) -> bool {
        let interval = interval.min(MAX_INTERVAL);
        let mut state = self.state.lock().await;
        if interval > state.interval {
            state.interval = interval;
            true
        } else {
            false
        }
    }

    /// Current minimum interval
    pub async fn interval(&self) -> Duration {
        self.state.lock().await.interval
    }
}

/// `instant + interval`, saturating at the furthest representable slot
fn after(instant: Instant, interval: Duration) -> Instant {
    instant
        .checked_add(interval)
        .or_else(|| instant.checked_add(MAX_INTERVAL))
        .unwrap_or(instant)
}
