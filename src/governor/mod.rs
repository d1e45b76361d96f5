//! Self-throttling rate limit governor for the generative API.
//!
//! The remote service reports its own quota in response headers, so the
//! limit is a moving target rather than a configured constant. Every
//! response's snapshot is fed into [`RateLimitGovernor::observe`]; when the
//! remaining quota drops below a quarter of the window limit the gate
//! closes and a background timer reopens it after the reported reset,
//! bounded by [`MAX_GATE_WAIT`]. Callers suspend in
//! [`RateLimitGovernor::await_gate`] before each request, so the wait never
//! blocks unrelated tasks such as the token refresh job.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tracing::{debug, info};

/// Hard ceiling on a single gate closure. Reset durations reported by the
/// remote service are not trusted to be bounded or even present.
pub const MAX_GATE_WAIT: Duration = Duration::from_secs(40);

/// Fraction of the window limit below which the gate closes
const QUOTA_FLOOR: f64 = 0.25;

/// The (limit, remaining, reset) triple from one response's quota headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaSnapshot {
    pub limit: u64,
    pub remaining: u64,
    pub reset_after: Duration,
}

struct GateState {
    latest: Option<QuotaSnapshot>,
    /// Bumped on every transition; a reopen timer only fires for its own epoch
    epoch: u64,
}

pub struct RateLimitGovernor {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<GateState>,
    gate: watch::Sender<bool>,
    max_wait: Duration,
}

impl RateLimitGovernor {
    pub fn new(max_wait: Duration) -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(GateState {
                    latest: None,
                    epoch: 0,
                }),
                gate,
                max_wait,
            }),
        }
    }

    /// Records the latest quota snapshot from a response.
    ///
    /// Below the quota floor the gate closes and a timer reopens it after
    /// `min(reset_after, max_wait)`. A fresh healthy snapshot supersedes any
    /// pending closure.
    pub async fn observe(&self, snapshot: QuotaSnapshot) {
        let mut state = self.inner.state.lock().await;
        state.latest = Some(snapshot);

        let floor = snapshot.limit as f64 * QUOTA_FLOOR;
        if (snapshot.remaining as f64) < floor {
            state.epoch += 1;
            let epoch = state.epoch;
            let wait = snapshot.reset_after.min(self.inner.max_wait);
            self.inner.gate.send_replace(false);
            info!(
                "Quota low ({}/{} units left), gating calls for {:?}",
                snapshot.remaining, snapshot.limit, wait
            );

            let inner = self.inner.clone();
            tokio::spawn(async move {
                tokio::time::sleep(wait).await;
                let state = inner.state.lock().await;
                if state.epoch == epoch {
                    inner.gate.send_replace(true);
                    debug!("Rate limit gate reopened");
                }
            });
        } else if !*self.inner.gate.borrow() {
            state.epoch += 1;
            self.inner.gate.send_replace(true);
            debug!("Fresh quota window, gate reopened early");
        }
    }

    /// Suspends until the gate is open; returns immediately when it already is.
    pub async fn await_gate(&self) {
        let mut gate = self.inner.gate.subscribe();
        gate.wait_for(|open| *open).await.ok();
    }

    /// Current gate position without waiting.
    pub fn gate_open(&self) -> bool {
        *self.inner.gate.borrow()
    }

    /// Most recent quota observation, if any.
    #[cfg(test)]
    pub async fn last_snapshot(&self) -> Option<QuotaSnapshot> {
        self.inner.state.lock().await.latest
    }
}

impl Default for RateLimitGovernor {
    fn default() -> Self {
        Self::new(MAX_GATE_WAIT)
    }
}

impl Clone for RateLimitGovernor {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tokio::time::timeout;

    fn snapshot(limit: u64, remaining: u64, reset_ms: u64) -> QuotaSnapshot {
        QuotaSnapshot {
            limit,
            remaining,
            reset_after: Duration::from_millis(reset_ms),
        }
    }

    #[tokio::test]
    async fn test_gate_open_before_any_observation() {
        let governor = RateLimitGovernor::new(Duration::from_secs(1));
        assert!(governor.gate_open());
        timeout(Duration::from_millis(20), governor.await_gate())
            .await
            .expect("await_gate should return immediately");
    }

    #[tokio::test]
    async fn test_healthy_quota_keeps_gate_open() {
        let governor = RateLimitGovernor::new(Duration::from_secs(1));
        // Exactly at the floor does not close: the contract is strictly below.
        governor.observe(snapshot(100, 25, 5_000)).await;
        assert!(governor.gate_open());
        timeout(Duration::from_millis(20), governor.await_gate())
            .await
            .expect("await_gate should not suspend");
    }

    #[tokio::test]
    async fn test_low_quota_closes_then_reopens_after_reset() {
        let governor = RateLimitGovernor::new(Duration::from_secs(5));
        governor.observe(snapshot(100, 10, 80)).await;
        assert!(!governor.gate_open());

        let start = Instant::now();
        governor.await_gate().await;
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(60), "reopened too early: {waited:?}");
        assert!(waited < Duration::from_secs(2), "reopened too late: {waited:?}");
        assert!(governor.gate_open());
    }

    #[tokio::test]
    async fn test_ceiling_bounds_reported_reset() {
        // Reported reset is far beyond the ceiling; the ceiling wins.
        let governor = RateLimitGovernor::new(Duration::from_millis(80));
        governor.observe(snapshot(100, 10, 120_000)).await;
        assert!(!governor.gate_open());

        let start = Instant::now();
        governor.await_gate().await;
        let waited = start.elapsed();
        assert!(waited < Duration::from_secs(2), "ceiling not applied: {waited:?}");
        assert!(governor.gate_open());
    }

    #[tokio::test]
    async fn test_fresh_healthy_window_reopens_early() {
        let governor = RateLimitGovernor::new(Duration::from_secs(5));
        governor.observe(snapshot(100, 10, 60_000)).await;
        assert!(!governor.gate_open());

        governor.observe(snapshot(100, 90, 60_000)).await;
        assert!(governor.gate_open());
        timeout(Duration::from_millis(20), governor.await_gate())
            .await
            .expect("gate should already be open");
    }

    #[tokio::test]
    async fn test_stale_timer_does_not_reopen_newer_closure() {
        let governor = RateLimitGovernor::new(Duration::from_secs(5));
        governor.observe(snapshot(100, 10, 30)).await;
        // Second closure with a longer reset supersedes the first timer.
        governor.observe(snapshot(100, 5, 200)).await;

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(
            !governor.gate_open(),
            "first timer must not reopen the second closure"
        );

        governor.await_gate().await;
        assert!(governor.gate_open());
    }

    #[tokio::test]
    async fn test_last_snapshot_tracks_observations() {
        let governor = RateLimitGovernor::new(Duration::from_secs(1));
        assert!(governor.last_snapshot().await.is_none());
        governor.observe(snapshot(200, 150, 1_000)).await;
        assert_eq!(governor.last_snapshot().await.unwrap().remaining, 150);
    }
}
