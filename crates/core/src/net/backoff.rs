use std::time::Duration;

pub const MIN_WAIT_MS: f64 = 100.0;
pub const MAX_WAIT_MS: f64 = 2000.0;
pub const BACKOFF_FACTOR: f64 = 1.25;

#[derive(Debug, Clone)]
pub struct Backoff {
    current_ms: f64,
    min_ms: f64,
    max_ms: f64,
    factor: f64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(MIN_WAIT_MS, MAX_WAIT_MS)
    }
}

impl Backoff {
    pub fn new(min_ms: f64, max_ms: f64) -> Self {
        Self {
            current_ms: min_ms,
            min_ms,
            max_ms,
            factor: BACKOFF_FACTOR,
        }
    }

    pub fn current_ms(&self) -> f64 {
        self.current_ms
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current_ms;
        self.current_ms = (self.current_ms * self.factor).min(self.max_ms);
        Duration::from_secs_f64(delay / 1000.0)
    }

    pub fn reset(&mut self) {
        self.current_ms = self.min_ms;
    }
}
