use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal service — calls flow.
    Closed,
    /// Tripped — calls rejected until the recovery window elapses.
    Open,
    /// One trial call allowed; its outcome decides Closed or Open.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Breaker thresholds.
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Consecutive failures that trip the breaker.
    pub failure_threshold: u32,
    /// How long an open breaker rejects calls before allowing a trial.
    pub open_timeout: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    last_failure: Option<Instant>,
}

/// Per-plugin failure-tracking state machine gating dispatch.
///
/// Recovery from Open is lazy: the Open→HalfOpen transition happens on
/// the next health query after the recovery window elapses, not via an
/// active timer. Local to this plugin; nothing is shared across
/// instances.
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure: None,
            }),
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    pub fn failure_count(&self) -> u32 {
        self.inner.lock().failure_count
    }

    /// Whether a call may be dispatched right now. Closed and HalfOpen
    /// report healthy; an Open breaker flips to HalfOpen once the
    /// recovery window has elapsed since the last failure.
    pub fn is_healthy(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let due = inner
                    .last_failure
                    .is_none_or(|at| at.elapsed() >= self.config.open_timeout);
                if due {
                    inner.state = CircuitState::HalfOpen;
                    tracing::info!(
                        breaker = %self.name,
                        "Recovery window elapsed, allowing trial call (half-open)"
                    );
                }
                due
            }
        }
    }

    /// Record a successful call or passing health probe. Clears the
    /// consecutive-failure counter; only a HalfOpen breaker closes from
    /// it — a passing probe while Open leaves the state Open until the
    /// time-based recovery admits a real trial.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        inner.failure_count = 0;
        if inner.state == CircuitState::HalfOpen {
            inner.state = CircuitState::Closed;
            tracing::info!(breaker = %self.name, "Trial call succeeded, breaker closed");
        }
    }

    /// Record a failed call or failed health probe. Reaching the
    /// threshold trips the breaker; any HalfOpen failure re-trips it
    /// unconditionally.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        inner.failure_count += 1;
        inner.last_failure = Some(Instant::now());
        let tripped = inner.state == CircuitState::HalfOpen
            || inner.failure_count >= self.config.failure_threshold;
        if tripped && inner.state != CircuitState::Open {
            let from = inner.state;
            inner.state = CircuitState::Open;
            tracing::warn!(
                breaker = %self.name,
                failures = inner.failure_count,
                from = %from,
                "Breaker tripped"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> BreakerConfig {
        BreakerConfig {
            failure_threshold: 3,
            open_timeout: Duration::from_millis(20),
        }
    }

    #[test]
    fn starts_closed_and_healthy() {
        let cb = CircuitBreaker::new("t", BreakerConfig::default());
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.is_healthy());
    }

    #[test]
    fn opens_after_exactly_threshold_failures() {
        let cb = CircuitBreaker::new("t", BreakerConfig::default());
        for _ in 0..4 {
            cb.record_failure();
            assert_eq!(cb.state(), CircuitState::Closed);
        }
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.is_healthy());
    }

    #[test]
    fn success_resets_consecutive_failures() {
        let cb = CircuitBreaker::new("t", BreakerConfig::default());
        for _ in 0..4 {
            cb.record_failure();
        }
        cb.record_success();
        for _ in 0..4 {
            cb.record_failure();
        }
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn stays_open_before_recovery_window() {
        let cb = CircuitBreaker::new("t", fast_config());
        for _ in 0..3 {
            cb.record_failure();
        }
        assert!(!cb.is_healthy());
        assert!(!cb.is_healthy());
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn half_open_trial_success_closes() {
        let cb = CircuitBreaker::new("t", fast_config());
        for _ in 0..3 {
            cb.record_failure();
        }
        std::thread::sleep(Duration::from_millis(30));

        assert!(cb.is_healthy());
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.failure_count(), 0);
    }

    #[test]
    fn half_open_trial_failure_reopens() {
        let cb = CircuitBreaker::new("t", fast_config());
        for _ in 0..3 {
            cb.record_failure();
        }
        std::thread::sleep(Duration::from_millis(30));
        assert!(cb.is_healthy());

        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.is_healthy());
    }

    #[test]
    fn probe_success_while_open_clears_counter_but_not_state() {
        let cb = CircuitBreaker::new("t", fast_config());
        for _ in 0..3 {
            cb.record_failure();
        }
        cb.record_success();
        assert_eq!(cb.failure_count(), 0);
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.is_healthy());
    }

    #[test]
    fn reopens_from_half_open_even_below_threshold() {
        let cb = CircuitBreaker::new("t", fast_config());
        for _ in 0..3 {
            cb.record_failure();
        }
        // Probe clears the counter while open.
        cb.record_success();
        std::thread::sleep(Duration::from_millis(30));
        assert!(cb.is_healthy());
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        // Single trial failure re-trips despite count < threshold.
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
    }
}
