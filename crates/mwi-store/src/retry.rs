//! Exponential backoff + circuit breaker for SQLite lock contention.
//!
//! # Backoff schedule
//!
//! | Attempt | Delay |
//! |---------|-------|
//! | 0       | 20ms  |
//! | 1       | 40ms  |
//! | 2       | 80ms  |
//! | 3       | 160ms |
//! | 4       | 320ms |
//!
//! # Circuit breaker
//!
//! After 5 consecutive lock failures the circuit opens for 5s, failing fast
//! with [`crate::error::StoreError::CircuitOpen`]. A successful operation
//! after the reset window closes the circuit.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

pub struct CircuitBreaker {
    failures: AtomicU32,
    open_until_ms: AtomicU64,
    threshold: u32,
    reset: Duration,
    epoch: Instant,
}

impl CircuitBreaker {
    #[must_use]
    pub fn new() -> Self {
        Self::with_params(5, Duration::from_secs(5))
    }

    #[must_use]
    pub fn with_params(threshold: u32, reset: Duration) -> Self {
        Self {
            failures: AtomicU32::new(0),
            open_until_ms: AtomicU64::new(0),
            threshold,
            reset,
            epoch: Instant::now(),
        }
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    #[must_use]
    pub fn state(&self) -> CircuitState {
        let open_until = self.open_until_ms.load(Ordering::Acquire);
        if open_until == 0 {
            return CircuitState::Closed;
        }
        if self.now_ms() >= open_until {
            CircuitState::HalfOpen
        } else {
            CircuitState::Open
        }
    }

    pub fn record_success(&self) {
        self.failures.store(0, Ordering::Release);
        self.open_until_ms.store(0, Ordering::Release);
    }

    pub fn record_failure(&self) {
        let failures = self.failures.fetch_add(1, Ordering::AcqRel) + 1;
        if failures >= self.threshold {
            let open_until = self.now_ms() + self.reset.as_millis() as u64;
            self.open_until_ms.store(open_until, Ordering::Release);
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

/// Backoff delay for the given zero-based attempt number.
#[must_use]
pub fn backoff_delay(attempt: u32) -> Duration {
    let base_ms = 20u64.saturating_mul(1u64 << attempt.min(10));
    Duration::from_millis(base_ms.min(2_000))
}

/// Whether a sqlite error message indicates transient lock contention that's
/// worth retrying (as opposed to a schema/constraint error).
#[must_use]
pub fn is_lock_contention(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("database is locked") || lower.contains("database table is locked")
}
