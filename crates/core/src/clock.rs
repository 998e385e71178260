use std::time::Instant;

#[derive(Debug, Clone, Copy)]
pub struct LocalClock {
    origin: Instant,
}

impl Default for LocalClock {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockOffset {
    offset_ms: f64,
}

impl ClockOffset {
    pub fn estimate(local_now_ms: f64, server_time_ms: f64) -> Self {
        Self {
            offset_ms: local_now_ms - server_time_ms,
        }
    }

    pub fn offset_ms(&self) -> f64 {
        self.offset_ms
    }

    pub fn to_local(&self, server_time_ms: f64) -> f64 {
        server_time_ms + self.offset_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_offset() {
        let offset = ClockOffset::estimate(1050.0, 1000.0);
        assert_eq!(offset.offset_ms(), 50.0);
        assert_eq!(offset.to_local(1100.0), 1150.0);
    }

    #[test]
    fn test_local_clock_is_monotonic() {
        let clock = LocalClock::new();
        let first = clock.now_ms();
        let second = clock.now_ms();
        assert!(second >= first);
        assert!(first >= 0.0);
    }
}
