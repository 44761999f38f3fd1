//! Request rate limiting over a sliding window
//!
//! The RateLimiter caps how many provider requests may start per time period.
//! One limiter is shared by every fetch issued through a client, so concurrent
//! batches compete for the same budget.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Shared request rate limiter
///
/// # Algorithm
///
/// - The limiter remembers when each of the last `max_rate` permits was granted
/// - A permit is granted while fewer than `max_rate` grants fall inside the
///   trailing `time_period`
/// - Otherwise the caller sleeps until the oldest grant leaves the window
///
/// Any interval of length `time_period` therefore contains at most `max_rate`
/// grants. Waiters queue on a `tokio::sync::Mutex`, which wakes them in FIFO
/// order, so an early caller is never overtaken by a later one.
#[derive(Clone)]
pub struct RateLimiter {
    /// Maximum permits per period (0 = unlimited)
    max_rate: u32,
    /// Length of the period
    time_period: Duration,
    /// Grant times, oldest first; locked for the whole wait so waiters stay ordered
    window: Arc<Mutex<VecDeque<Instant>>>,
}

impl RateLimiter {
    /// Create a limiter allowing `max_rate` requests per `time_period`
    ///
    /// A `max_rate` of 0 or a zero period disables limiting.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use weather_collector::rate_limiter::RateLimiter;
    ///
    /// // OpenWeather free tier
    /// let limiter = RateLimiter::new(60, Duration::from_secs(65));
    /// assert_eq!(limiter.max_rate(), 60);
    /// ```
    #[must_use]
    pub fn new(max_rate: u32, time_period: Duration) -> Self {
        Self {
            max_rate,
            time_period,
            window: Arc::new(Mutex::new(VecDeque::with_capacity(max_rate as usize))),
        }
    }

    /// Maximum requests per period
    pub fn max_rate(&self) -> u32 {
        self.max_rate
    }

    /// Length of the rate limit period
    pub fn time_period(&self) -> Duration {
        self.time_period
    }

    fn is_unlimited(&self) -> bool {
        self.max_rate == 0 || self.time_period.is_zero()
    }

    /// Wait until one request may be issued
    ///
    /// Never fails; it only delays the caller.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::time::Duration;
    /// use weather_collector::rate_limiter::RateLimiter;
    ///
    /// # async fn example() {
    /// let limiter = RateLimiter::new(60, Duration::from_secs(65));
    ///
    /// // Before each provider request
    /// limiter.acquire().await;
    /// // ... send request ...
    /// # }
    /// ```
    pub async fn acquire(&self) {
        if self.is_unlimited() {
            return;
        }

        let capacity = self.max_rate as usize;
        let mut window = self.window.lock().await;
        loop {
            let now = Instant::now();
            while window
                .front()
                .is_some_and(|&granted| now.saturating_duration_since(granted) >= self.time_period)
            {
                window.pop_front();
            }

            if window.len() < capacity {
                window.push_back(now);
                return;
            }

            // Full window: the oldest grant expires first
            let Some(&oldest) = window.front() else {
                continue;
            };
            let reopens_at = oldest + self.time_period;
            tracing::trace!(
                wait_ms = reopens_at.saturating_duration_since(now).as_millis() as u64,
                "rate limit reached, waiting"
            );
            tokio::time::sleep_until(reopens_at).await;
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_rate", &self.max_rate)
            .field("time_period", &self.time_period)
            .finish()
    }
}
