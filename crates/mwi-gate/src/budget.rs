//! Process-wide call budget (spec.md §4.6 "Budget", §5 "LLM budget counter:
//! a single atomic integer process-wide; decrements are serialized").

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tracing::warn;

pub struct Budget {
    max_calls: u64,
    used: AtomicU64,
    exhausted_logged: AtomicBool,
}

impl Budget {
    #[must_use]
    pub fn new(max_calls: u64) -> Self {
        Self {
            max_calls,
            used: AtomicU64::new(0),
            exhausted_logged: AtomicBool::new(false),
        }
    }

    /// Atomically claim one call slot. Returns `false` once the budget is
    /// exhausted; logs a single notice the first time that happens.
    pub fn try_claim(&self) -> bool {
        let previous = self.used.fetch_add(1, Ordering::SeqCst);
        if previous < self.max_calls {
            true
        } else {
            if !self.exhausted_logged.swap(true, Ordering::SeqCst) {
                warn!(max_calls = self.max_calls, "relevance gate call budget exhausted, disabling gate for remainder of run");
            }
            false
        }
    }

    #[must_use]
    pub fn used(&self) -> u64 {
        self.used.load(Ordering::SeqCst).min(self.max_calls)
    }
}
