//! Rate limiting for high-frequency handlers

use std::time::Duration;

/// Lets a call through at most once per `limit`
///
/// The first call always passes; later calls pass once `limit` has elapsed
/// since the last call that passed.
#[derive(Debug, Clone)]
pub struct Throttle {
    limit_ms: f64,
    last_ms: Option<f64>,
}

impl Throttle {
    pub fn new(limit: Duration) -> Self {
        Self {
            limit_ms: limit.as_micros() as f64 / 1000.0,
            last_ms: None,
        }
    }

    /// Whether a call at `now_ms` may run; a passing call restarts the window
    pub fn ready(&mut self, now_ms: f64) -> bool {
        match self.last_ms {
            Some(last) if now_ms - last < self.limit_ms => false,
            _ => {
                self.last_ms = Some(now_ms);
                true
            }
        }
    }
}
