//! # Sliding-Window Rate Limiter
//!
//! Shared, per-tool call accounting used by the rate-limit combinator. The
//! window is a strict sliding window over continuous time, not fixed buckets:
//! a slot frees up exactly when the oldest still-counted call ages past the
//! period.
//!
//! ## Concurrency
//!
//! The registry is the only shared mutable state in the crate. Concurrent
//! invocations of the same tool race on prune-check-append, so that sequence
//! runs as one atomic unit under the window's own lock. Distinct tools get
//! distinct windows and never contend; the outer map lock is held only long
//! enough to look up or create a window.
//!
//! Timestamps come from [`tokio::time::Instant`], so integration tests drive
//! the window with `tokio::time::{pause, advance}` instead of real sleeps.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

/// Per-tool sliding-window state.
///
/// Created lazily on a tool's first call and kept for the process lifetime.
/// The limits are fixed at creation; later registrations of the same tool
/// identity reuse the existing window.
#[derive(Debug)]
pub struct RateWindow {
    max_calls: usize,
    period: Duration,
    calls: VecDeque<Instant>,
}

impl RateWindow {
    fn new(max_calls: usize, period: Duration) -> Self {
        Self {
            max_calls,
            period,
            calls: VecDeque::new(),
        }
    }

    /// Prune expired timestamps, then either record this call or reject it.
    ///
    /// A timestamp stays counted while `now - t <= period`; rejected calls
    /// record nothing, so they never extend the window.
    fn try_admit(&mut self, now: Instant) -> bool {
        while let Some(&oldest) = self.calls.front() {
            if now.duration_since(oldest) > self.period {
                self.calls.pop_front();
            } else {
                break;
            }
        }

        if self.calls.len() >= self.max_calls {
            return false;
        }

        self.calls.push_back(now);
        true
    }
}

/// Process-wide registry of rate windows, keyed by stable tool identity.
///
/// Owned by the host (typically through the `Warden` facade) and shared with
/// every rate-limited combinator via `Arc`, rather than living in ambient
/// global state.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Arc<Mutex<RateWindow>>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit or reject one call for `tool_id`.
    ///
    /// `max_calls` and `period` only take effect when this identity's window
    /// is first created.
    pub fn try_acquire(&self, tool_id: &str, max_calls: usize, period: Duration) -> bool {
        let window = {
            let mut windows = self.windows.lock().expect("rate limiter registry poisoned");
            windows
                .entry(tool_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(RateWindow::new(max_calls, period))))
                .clone()
        };

        let mut window = window.lock().expect("rate window poisoned");
        let admitted = window.try_admit(Instant::now());
        if admitted {
            debug!(tool = tool_id, in_window = window.calls.len(), "call admitted");
        } else {
            warn!(
                tool = tool_id,
                max_calls = window.max_calls,
                period_secs = window.period.as_secs(),
                "rate limit exceeded"
            );
        }
        admitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_admit_until_limit_then_reject() {
        let limiter = RateLimiter::new();
        let period = Duration::from_secs(60);

        assert!(limiter.try_acquire("tool.a", 2, period));
        assert!(limiter.try_acquire("tool.a", 2, period));
        assert!(!limiter.try_acquire("tool.a", 2, period));
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_slides() {
        let limiter = RateLimiter::new();
        let period = Duration::from_secs(60);

        assert!(limiter.try_acquire("tool.a", 2, period));
        assert!(limiter.try_acquire("tool.a", 2, period));
        assert!(!limiter.try_acquire("tool.a", 2, period));

        // Once the window fully elapses, slots free up again.
        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(limiter.try_acquire("tool.a", 2, period));
    }

    #[tokio::test(start_paused = true)]
    async fn test_boundary_is_inclusive() {
        let limiter = RateLimiter::new();
        let period = Duration::from_secs(60);

        assert!(limiter.try_acquire("tool.a", 1, period));

        // At exactly `period` the old call still counts.
        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(!limiter.try_acquire("tool.a", 1, period));

        // Strictly past it, the slot is free.
        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(limiter.try_acquire("tool.a", 1, period));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_calls_record_nothing() {
        let limiter = RateLimiter::new();
        let period = Duration::from_secs(10);

        assert!(limiter.try_acquire("tool.a", 1, period));
        for _ in 0..5 {
            assert!(!limiter.try_acquire("tool.a", 1, period));
        }

        // Rejections must not have extended the window.
        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(limiter.try_acquire("tool.a", 1, period));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tools_do_not_contend() {
        let limiter = RateLimiter::new();
        let period = Duration::from_secs(60);

        assert!(limiter.try_acquire("tool.a", 1, period));
        assert!(!limiter.try_acquire("tool.a", 1, period));

        // A different identity has its own window.
        assert!(limiter.try_acquire("tool.b", 1, period));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_admission_is_exact() {
        let limiter = Arc::new(RateLimiter::new());
        let period = Duration::from_secs(60);

        let mut handles = Vec::new();
        for _ in 0..32 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.try_acquire("tool.shared", 10, period)
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 10, "exactly max_calls must win the race");
    }
}
