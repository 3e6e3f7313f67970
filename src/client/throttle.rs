//! Submission throttle: at most one accepted submission per window.
//!
//! The check and the timestamp update happen under one lock with no await in
//! between, so two concurrent submissions can never both pass.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Minimum spacing between accepted submissions.
pub const SUBMIT_THROTTLE_WINDOW: Duration = Duration::from_millis(5000);

#[derive(Debug)]
pub struct Throttle {
    window: Duration,
    last_pass: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_pass: Mutex::new(None),
        }
    }

    /// Passes when the window has elapsed since the last pass, and records this
    /// pass immediately.
    pub fn try_pass(&self) -> bool {
        let now = Instant::now();
        let mut last_pass = self.last_pass.lock().unwrap_or_else(PoisonError::into_inner);

        match *last_pass {
            Some(previous) if now.duration_since(previous) < self.window => false,
            _ => {
                *last_pass = Some(now);
                true
            }
        }
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(SUBMIT_THROTTLE_WINDOW)
    }
}
