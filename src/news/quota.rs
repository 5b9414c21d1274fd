//! Quota-exhaustion state and the trailing error window.
//!
//! Both live in memory only and reset on restart. Mutations happen inside
//! short synchronous `Mutex` sections so the types stay safe under a
//! multi-threaded runtime even though the design never needs parallelism.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::warn;

use crate::clock::Clock;

/// `Available` / `Exhausted(until)` with lazy reset: the first check after
/// the cooldown deadline flips the state back and clears the timestamp.
pub struct QuotaGuard {
    clock: Arc<dyn Clock>,
    cooldown: Duration,
    exhausted_until_ms: Mutex<Option<u64>>,
}

impl QuotaGuard {
    pub fn new(clock: Arc<dyn Clock>, cooldown: Duration) -> Self {
        Self {
            clock,
            cooldown,
            exhausted_until_ms: Mutex::new(None),
        }
    }

    /// Enter the exhausted state for the full cooldown, starting now.
    pub fn trip(&self) {
        let until = self.clock.now_millis() + self.cooldown.as_millis() as u64;
        let mut g = self.exhausted_until_ms.lock().expect("quota mutex poisoned");
        *g = Some(until);
        warn!(until_ms = until, "generation quota exhausted; serving fallback content");
    }

    /// True while inside the cooldown. Never blocks waiting for it.
    pub fn is_exhausted(&self) -> bool {
        let now = self.clock.now_millis();
        let mut g = self.exhausted_until_ms.lock().expect("quota mutex poisoned");
        match *g {
            Some(until) if now >= until => {
                *g = None;
                false
            }
            Some(_) => true,
            None => false,
        }
    }
}

/// Timestamps of recent upstream failures. Entries are pruned once they
/// fall out of the retention window; the breaker queries a shorter
/// sub-window.
pub struct ErrorWindow {
    clock: Arc<dyn Clock>,
    retention: Duration,
    buf: Mutex<VecDeque<u64>>,
}

impl ErrorWindow {
    pub fn new(clock: Arc<dyn Clock>, retention: Duration) -> Self {
        Self {
            clock,
            retention,
            buf: Mutex::new(VecDeque::new()),
        }
    }

    pub fn record(&self) {
        let now = self.clock.now_millis();
        let cutoff = now.saturating_sub(self.retention.as_millis() as u64);
        let mut buf = self.buf.lock().expect("error window mutex poisoned");
        buf.push_back(now);
        while let Some(&t) = buf.front() {
            if t < cutoff {
                buf.pop_front();
            } else {
                break;
            }
        }
    }

    /// Number of failures recorded within the trailing `window`.
    pub fn count_within(&self, window: Duration) -> usize {
        let now = self.clock.now_millis();
        let cutoff = now.saturating_sub(window.as_millis() as u64);
        let buf = self.buf.lock().expect("error window mutex poisoned");
        buf.iter().rev().take_while(|&&t| t >= cutoff).count()
    }
}
