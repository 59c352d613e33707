//! Rolling-window rate limiter for the gazetteer client.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

/// Requests allowed per rolling window. The public service's quota is
/// 1000 per hour; 900 leaves headroom for retries.
pub const HOURLY_BUDGET: usize = 900;

/// Rolling window length.
pub const WINDOW: Duration = Duration::from_secs(3600);

/// Minimum spacing between consecutive requests.
pub const MIN_SPACING: Duration = Duration::from_secs(4);

/// Tracks request times and blocks until the next request is allowed.
///
/// Enforces two constraints: at most [`HOURLY_BUDGET`] requests within
/// any [`WINDOW`], and at least [`MIN_SPACING`] between consecutive
/// requests. The caller holds the limiter mutably for the whole run, so
/// no internal locking is needed.
pub struct RateLimiter {
    window: Duration,
    max_per_window: usize,
    min_spacing: Duration,
    sent: VecDeque<Instant>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    /// A limiter with the production budget.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(HOURLY_BUDGET, WINDOW, MIN_SPACING)
    }

    /// A limiter with custom limits.
    #[must_use]
    pub fn with_limits(max_per_window: usize, window: Duration, min_spacing: Duration) -> Self {
        Self {
            window,
            max_per_window,
            min_spacing,
            sent: VecDeque::with_capacity(max_per_window.min(HOURLY_BUDGET)),
        }
    }

    /// Waits until a request is allowed, then records it as sent.
    pub async fn acquire(&mut self) {
        let now = Instant::now();
        let wait = self.delay_until_ready(now);
        if !wait.is_zero() {
            if wait > self.min_spacing {
                log::info!("Hourly budget reached, pausing for {}s", wait.as_secs());
            }
            tokio::time::sleep(wait).await;
        }
        self.sent.push_back(Instant::now());
    }

    /// How long until the next request is allowed at `now`.
    fn delay_until_ready(&mut self, now: Instant) -> Duration {
        while let Some(front) = self.sent.front() {
            if now.duration_since(*front) >= self.window {
                self.sent.pop_front();
            } else {
                break;
            }
        }

        let spacing_wait = self.sent.back().map_or(Duration::ZERO, |last| {
            self.min_spacing
                .saturating_sub(now.duration_since(*last))
        });

        let window_wait = if self.sent.len() >= self.max_per_window {
            self.sent
                .front()
                .map_or(Duration::ZERO, |front| {
                    self.window.saturating_sub(now.duration_since(*front))
                })
        } else {
            Duration::ZERO
        };

        spacing_wait.max(window_wait)
    }
}
