const ALPHA: f64 = 0.125;
const BETA: f64 = 0.25;

#[derive(Debug, Clone, Default)]
pub struct RttEstimator {
    srtt_ms: Option<f64>,
    rtt_var_ms: f64,
    samples: u64,
}

impl RttEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, rtt_ms: f64) {
        if !rtt_ms.is_finite() || rtt_ms < 0.0 {
            log::debug!("Discarding RTT sample {}", rtt_ms);
            return;
        }

        self.samples += 1;
        match self.srtt_ms {
            None => {
                self.srtt_ms = Some(rtt_ms);
                self.rtt_var_ms = rtt_ms / 2.0;
            }
            Some(srtt) => {
                let diff = (rtt_ms - srtt).abs();
                self.rtt_var_ms = (1.0 - BETA) * self.rtt_var_ms + BETA * diff;
                self.srtt_ms = Some((1.0 - ALPHA) * srtt + ALPHA * rtt_ms);
            }
        }
    }

    pub fn srtt_ms(&self) -> Option<f64> {
        self.srtt_ms
    }

    pub fn rtt_var_ms(&self) -> f64 {
        self.rtt_var_ms
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_seeds_estimate() {
        let mut rtt = RttEstimator::new();
        assert_eq!(rtt.srtt_ms(), None);

        rtt.record(80.0);
        assert_eq!(rtt.srtt_ms(), Some(80.0));
        assert_eq!(rtt.rtt_var_ms(), 40.0);
    }

    #[test]
    fn test_smoothing() {
        let mut rtt = RttEstimator::new();
        rtt.record(100.0);
        rtt.record(200.0);

        assert_eq!(rtt.srtt_ms(), Some(112.5));
        assert_eq!(rtt.rtt_var_ms(), 62.5);
        assert_eq!(rtt.samples(), 2);
    }

    #[test]
    fn test_invalid_samples_ignored() {
        let mut rtt = RttEstimator::new();
        rtt.record(-5.0);
        rtt.record(f64::NAN);
        assert_eq!(rtt.samples(), 0);
        assert_eq!(rtt.srtt_ms(), None);
    }
}
