//! Causal beat detection on a first-difference signal.
//!
//! A sample is accepted as a systolic peak when all of the following hold:
//!
//! 1. it lies above the adaptive threshold,
//! 2. the slope just stopped rising (`diff[n] == 0` or its sign flipped),
//! 3. the previous slope was strictly positive,
//! 4. more than `dist` samples passed since the last accepted peak.
//!
//! Only the first sample of a plateau can qualify. Once `diff[n-1] == 0`,
//! rule 3 fails, so a flat top rejected on its first sample (for example by
//! the refractory window) is never registered later.

use tracing::debug;

#[derive(Debug, Clone)]
pub struct PeakDetector {
    dist: usize,
    lag: i64,
    diff: Vec<i64>,
    peaks: Vec<u8>,
    peak_indices: Vec<usize>,
}

impl PeakDetector {
    pub fn new(dist: usize) -> Self {
        Self {
            dist,
            lag: 0,
            diff: Vec::new(),
            peaks: Vec::new(),
            peak_indices: Vec::new(),
        }
    }

    /// Decide whether the newest entry of `values` is a peak.
    ///
    /// `threshold` is the gate computed for that same entry. Exactly one flag
    /// is appended per call.
    pub fn update(&mut self, values: &[i32], threshold: f64) -> bool {
        let n = values.len();
        if n >= 2 {
            self.diff.push(i64::from(values[n - 1]) - i64::from(values[n - 2]));
        }

        let registered = match self.diff.as_slice() {
            [.., prev, now] => {
                let (prev, now) = (*prev, *now);
                let above = f64::from(values[n - 1]) > threshold;
                let turning = now == 0 || (now > 0) != (prev > 0);
                above && turning && prev > 0 && self.lag > self.dist_samples()
            }
            _ => false,
        };

        if registered {
            debug!(index = n - 1, lag = self.lag, "peak registered");
            self.peak_indices.push(n - 1);
            self.lag = -1;
        }
        self.peaks.push(u8::from(registered));
        self.lag += 1;
        registered
    }

    pub fn dist(&self) -> usize {
        self.dist
    }

    // saturates so a huge refractory window keeps blocking
    fn dist_samples(&self) -> i64 {
        i64::try_from(self.dist).unwrap_or(i64::MAX)
    }

    /// Samples since the last registered peak.
    pub fn lag(&self) -> i64 {
        self.lag
    }

    pub fn diff(&self) -> &[i64] {
        &self.diff
    }

    pub fn peaks(&self) -> &[u8] {
        &self.peaks
    }

    pub fn peak_indices(&self) -> &[usize] {
        &self.peak_indices
    }

    pub fn peak_count(&self) -> usize {
        self.peak_indices.len()
    }

    pub fn clear(&mut self) {
        self.lag = 0;
        self.diff.clear();
        self.peaks.clear();
        self.peak_indices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(detector: &mut PeakDetector, values: &[i32], threshold: f64) -> Vec<usize> {
        let mut hits = Vec::new();
        for n in 1..=values.len() {
            if detector.update(&values[..n], threshold) {
                hits.push(n - 1);
            }
        }
        hits
    }

    #[test]
    fn test_first_two_samples_make_no_decision() {
        let mut detector = PeakDetector::new(0);
        assert!(!detector.update(&[10], 0.0));
        assert!(!detector.update(&[10, 50], 0.0));
        assert_eq!(detector.peaks(), &[0, 0]);
        assert_eq!(detector.diff(), &[40]);
    }

    #[test]
    fn test_rising_then_falling_registers() {
        let mut detector = PeakDetector::new(0);
        let values = [0, 10, 20, 30, 20, 10];
        let hits = run(&mut detector, &values, 15.0);
        // diff[3] = +10, diff[4] = -10: the falling sample is flagged
        assert_eq!(hits, vec![4]);
        assert_eq!(detector.peaks(), &[0, 0, 0, 0, 1, 0]);
        assert_eq!(detector.lag(), 1);
    }

    #[test]
    fn test_below_threshold_ignored() {
        let mut detector = PeakDetector::new(0);
        let values = [0, 10, 20, 30, 20, 10];
        assert!(run(&mut detector, &values, 100.0).is_empty());
    }

    #[test]
    fn test_flat_top_never_registers() {
        let mut detector = PeakDetector::new(0);
        // rise, plateau, fall: diff = [10, 10, 0, -10]
        let values = [0, 10, 20, 20, 10];
        let hits = run(&mut detector, &values, 5.0);
        // the plateau entry itself (diff 0 after +10) still counts
        assert_eq!(hits, vec![3]);

        // refractory swallows the first plateau entry, the rest of the
        // plateau has a zero previous slope
        let mut detector = PeakDetector::new(12);
        let values = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 10, 20, 20, 20, 20, 10];
        assert!(run(&mut detector, &values, 5.0).is_empty());
    }

    #[test]
    fn test_refractory_blocks_close_peaks() {
        let mut detector = PeakDetector::new(3);
        // the second hump turns only 3 samples after the first one
        let values = [0, 0, 0, 0, 10, 20, 15, 10, 20, 15, 0, 0, 0, 10, 20, 15, 0];
        let hits = run(&mut detector, &values, 5.0);
        assert_eq!(hits, vec![6, 15]);
    }

    #[test]
    fn test_huge_refractory_blocks_everything() {
        let mut detector = PeakDetector::new(usize::MAX);
        let values = [0, 10, 20, 30, 20, 10];
        assert!(run(&mut detector, &values, 15.0).is_empty());
    }

    #[test]
    fn test_clear_restores_initial_state() {
        let mut detector = PeakDetector::new(0);
        run(&mut detector, &[0, 10, 20, 30, 20, 10], 15.0);
        detector.clear();
        assert_eq!(detector.lag(), 0);
        assert!(detector.peaks().is_empty());
        assert!(detector.diff().is_empty());
        assert_eq!(detector.peak_count(), 0);
    }
}
