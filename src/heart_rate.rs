/// Peaks needed before an interval is reported.
pub const MIN_PEAKS: usize = 3;

/// Instantaneous RR intervals in milliseconds, one entry per sample.
#[derive(Debug, Clone)]
pub struct HeartRateEstimator {
    sampling_rate: f64,
    instant_rr: Vec<f64>,
}

impl HeartRateEstimator {
    pub fn new(sampling_rate: f64) -> Self {
        Self {
            sampling_rate,
            instant_rr: Vec::new(),
        }
    }

    /// Append the interval between the two newest peaks, or 0 while fewer
    /// than [`MIN_PEAKS`] are known.
    pub fn update(&mut self, peak_indices: &[usize]) -> f64 {
        let rr = match peak_indices {
            [.., prev, last] if peak_indices.len() >= MIN_PEAKS => {
                (last - prev) as f64 / self.sampling_rate * 1000.0
            }
            _ => 0.0,
        };
        self.instant_rr.push(rr);
        rr
    }

    pub fn instant_rr(&self) -> &[f64] {
        &self.instant_rr
    }

    /// Beats per minute derived from the RR series (0 where no interval exists).
    pub fn instant_bpm(&self) -> Vec<f64> {
        self.instant_rr
            .iter()
            .map(|&rr| if rr > 0.0 { 60_000.0 / rr } else { 0.0 })
            .collect()
    }

    pub fn clear(&mut self) {
        self.instant_rr.clear();
    }
}
