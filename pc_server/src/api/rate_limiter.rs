//! Rate limiting for magic-link requests.
//!
//! Each email address gets its own sliding window so one address cannot be
//! used to flood an inbox, while other addresses are unaffected.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Tracked addresses before idle windows are swept
const SWEEP_THRESHOLD: usize = 1024;

/// Rate limiter using a sliding window algorithm
#[derive(Debug)]
pub struct RateLimiter {
    /// Timestamps of recent requests
    timestamps: VecDeque<Instant>,
    /// Maximum number of requests allowed in the window
    max_requests: usize,
    /// Time window for rate limiting
    window: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter
    ///
    /// # Arguments
    ///
    /// * `max_requests` - Maximum number of requests allowed in the time window
    /// * `window` - Time window duration
    ///
    /// # Example
    ///
    /// ```
    /// use pc_server::api::rate_limiter::RateLimiter;
    /// use std::time::Duration;
    ///
    /// let mut limiter = RateLimiter::new(2, Duration::from_secs(60));
    /// assert!(limiter.check());
    /// assert!(limiter.check());
    /// assert!(!limiter.check());
    /// ```
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(max_requests),
            max_requests,
            window,
        }
    }

    /// Record a request if the window has room
    ///
    /// Returns `true` if the request is allowed, `false` if rate limit exceeded.
    pub fn check(&mut self) -> bool {
        let now = Instant::now();

        while let Some(ts) = self.timestamps.front() {
            if now.duration_since(*ts) > self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }

        if self.timestamps.len() >= self.max_requests {
            return false;
        }

        self.timestamps.push_back(now);
        true
    }

    /// Get the number of remaining requests allowed in the current window
    pub fn remaining(&self) -> usize {
        self.max_requests.saturating_sub(self.timestamps.len())
    }

    /// Get the time until the oldest request leaves the window
    ///
    /// Returns `None` if there are no requests in the current window.
    pub fn reset_in(&self) -> Option<Duration> {
        self.timestamps.front().map(|oldest| {
            let elapsed = Instant::now().duration_since(*oldest);
            self.window.saturating_sub(elapsed)
        })
    }

    /// No request is still inside the window
    fn is_idle(&self) -> bool {
        self.reset_in().is_none_or(|left| left.is_zero())
    }
}

/// Per-address limiter for magic-link requests
#[derive(Debug)]
pub struct MagicLinkThrottle {
    limiters: Mutex<HashMap<String, RateLimiter>>,
    max_per_window: usize,
    window: Duration,
}

impl MagicLinkThrottle {
    pub fn new(max_per_window: usize, window: Duration) -> Self {
        Self {
            limiters: Mutex::new(HashMap::new()),
            max_per_window,
            window,
        }
    }

    /// `max_per_hour` links per address per hour
    pub fn per_hour(max_per_hour: usize) -> Self {
        Self::new(max_per_hour, Duration::from_secs(60 * 60))
    }

    /// Record a request for `email`; `false` once its window is full
    ///
    /// `email` should already be normalized so case variants share a window.
    pub fn check(&self, email: &str) -> bool {
        let mut limiters = self
            .limiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if limiters.len() >= SWEEP_THRESHOLD {
            limiters.retain(|_, limiter| !limiter.is_idle());
        }

        limiters
            .entry(email.to_string())
            .or_insert_with(|| RateLimiter::new(self.max_per_window, self.window))
            .check()
    }

    /// Requests `email` may still make in its current window
    pub fn remaining(&self, email: &str) -> usize {
        self.limiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(email)
            .map_or(self.max_per_window, RateLimiter::remaining)
    }

    /// Number of addresses currently tracked
    pub fn tracked(&self) -> usize {
        self.limiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_rate_limiter_blocks_over_limit() {
        let mut limiter = RateLimiter::new(3, Duration::from_secs(1));

        for _ in 0..3 {
            assert!(limiter.check());
        }

        assert!(!limiter.check(), "Should block request over limit");
    }

    #[test]
    fn test_rate_limiter_window_expiry() {
        let mut limiter = RateLimiter::new(2, Duration::from_millis(100));

        assert!(limiter.check());
        assert!(limiter.check());
        assert!(!limiter.check());

        thread::sleep(Duration::from_millis(150));

        assert!(limiter.check(), "Should allow after window expires");
        assert_eq!(limiter.remaining(), 1);
    }

    #[test]
    fn test_reset_in() {
        let mut limiter = RateLimiter::new(5, Duration::from_secs(1));
        assert!(limiter.reset_in().is_none());
        assert!(limiter.is_idle());

        limiter.check();
        let reset_in = limiter.reset_in().unwrap();
        assert!(reset_in <= Duration::from_secs(1));
        assert!(!limiter.is_idle());
    }

    #[test]
    fn test_throttle_is_per_address() {
        let throttle = MagicLinkThrottle::per_hour(2);

        assert!(throttle.check("a@example.com"));
        assert!(throttle.check("a@example.com"));
        assert!(!throttle.check("a@example.com"));

        assert!(throttle.check("b@example.com"));
        assert_eq!(throttle.remaining("b@example.com"), 1);
        assert_eq!(throttle.remaining("c@example.com"), 2);
        assert_eq!(throttle.tracked(), 2);
    }

    #[test]
    fn test_idle_addresses_are_swept() {
        let throttle = MagicLinkThrottle::new(1, Duration::from_millis(10));
        for i in 0..SWEEP_THRESHOLD {
            assert!(throttle.check(&format!("user{i}@example.com")));
        }
        thread::sleep(Duration::from_millis(20));

        assert!(throttle.check("late@example.com"));
        assert_eq!(throttle.tracked(), 1);
    }
}
