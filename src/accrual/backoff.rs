//! Shared back-off instant for the worker pool.

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

/// The earliest instant at which any worker may issue its next request to
/// the accrual service. Strictly monotonic: `advance` never moves it
/// backwards. The mutex is held only for constant-time reads and writes.
#[derive(Debug)]
pub struct Backoff {
    until: Mutex<Instant>,
}

impl Backoff {
    pub fn new() -> Self {
        Self {
            until: Mutex::new(Instant::now()),
        }
    }

    /// Remaining sleep before the next request may go out, if any.
    pub fn remaining(&self) -> Option<Duration> {
        let until = *self.until.lock().expect("backoff mutex poisoned");
        let now = Instant::now();
        (until > now).then(|| until - now)
    }

    /// Moves the wake-up instant to `now + delay` unless a peer has already
    /// pushed it further out.
    pub fn advance(&self, delay: Duration) {
        let mut until = self.until.lock().expect("backoff mutex poisoned");
        let candidate = Instant::now() + delay;
        if candidate > *until {
            *until = candidate;
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}
