/// Trailing `mean + stddev` amplitude gate.
///
/// Only the newest `window_len` values (or fewer, at the start of a
/// recording) contribute, so the threshold never looks ahead.
#[derive(Debug, Clone)]
pub struct ThresholdTracker {
    window_len: usize,
    threshold: Vec<f64>,
}

impl ThresholdTracker {
    pub fn new(window_len: usize) -> Self {
        Self {
            window_len: window_len.max(1),
            threshold: Vec::new(),
        }
    }

    /// Appends the threshold for the newest entry of `values` and returns it.
    pub fn update(&mut self, values: &[i32]) -> f64 {
        let start = values.len().saturating_sub(self.window_len);
        let threshold = mean_plus_std(&values[start..]);
        self.threshold.push(threshold);
        threshold
    }

    pub fn window_len(&self) -> usize {
        self.window_len
    }

    pub fn threshold(&self) -> &[f64] {
        &self.threshold
    }

    pub fn clear(&mut self) {
        self.threshold.clear();
    }
}

/// Mean plus population standard deviation.
fn mean_plus_std(window: &[i32]) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    let n = window.len() as f64;
    let mean = window.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
    let var = window
        .iter()
        .map(|&v| {
            let d = f64::from(v) - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    mean + var.sqrt()
}
