use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Per-plugin sliding-window admission counter.
///
/// A trailing window, not a fixed bucket: timestamps are pruned on every
/// check, so burstiness inside the window is bounded exactly. The window
/// is locked because concurrent `batch_call` entries may target the same
/// plugin id.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests: max_requests as usize,
            window,
            timestamps: Mutex::new(VecDeque::new()),
        }
    }

    /// Admit or deny one request. Admission records the current instant.
    pub fn check(&self) -> bool {
        let now = Instant::now();
        let mut timestamps = self.timestamps.lock();
        while let Some(front) = timestamps.front() {
            if now.duration_since(*front) >= self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }
        if timestamps.len() >= self.max_requests {
            return false;
        }
        timestamps.push_back(now);
        true
    }

    /// Requests currently inside the trailing window.
    pub fn in_flight(&self) -> usize {
        let now = Instant::now();
        let timestamps = self.timestamps.lock();
        timestamps
            .iter()
            .filter(|t| now.duration_since(**t) < self.window)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_exactly_n_within_window() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        assert!(limiter.check());
        assert!(limiter.check());
        assert!(limiter.check());
        assert!(!limiter.check());
        assert_eq!(limiter.in_flight(), 3);
    }

    #[test]
    fn denied_check_does_not_consume_a_slot() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check());
        assert!(!limiter.check());
        assert!(!limiter.check());
        assert_eq!(limiter.in_flight(), 1);
    }

    #[test]
    fn window_expiry_frees_slots() {
        let limiter = RateLimiter::new(2, Duration::from_millis(20));
        assert!(limiter.check());
        assert!(limiter.check());
        assert!(!limiter.check());

        std::thread::sleep(Duration::from_millis(30));

        assert!(limiter.check());
        assert_eq!(limiter.in_flight(), 1);
    }
}
