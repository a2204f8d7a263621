use crate::config::SessionConfig;
use crate::error::{OxiError, Result};
use crate::heart_rate::HeartRateEstimator;
use crate::packet::Sample;
use crate::peaks::PeakDetector;
use crate::threshold::ThresholdTracker;
use tracing::trace;

/// An auxiliary series recorded in lock-step with the signal.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub name: String,
    pub data: Vec<f64>,
}

/// All time series of one recording.
///
/// Every per-sample series grows by exactly one entry per [`ingest`] call;
/// `diff` is the only one that lags behind (it has one entry less).
///
/// [`ingest`]: RecordingSession::ingest
#[derive(Debug, Clone)]
pub struct RecordingSession {
    config: SessionConfig,
    values: Vec<i32>,
    times: Vec<f64>,
    channels: Vec<Channel>,
    resync_marks: Vec<usize>,
    threshold: ThresholdTracker,
    detector: PeakDetector,
    heart_rate: HeartRateEstimator,
}

impl RecordingSession {
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let channels = (0..config.auxiliary_channels)
            .map(|i| Channel {
                name: format!("Channel_{i}"),
                data: Vec::new(),
            })
            .collect();
        Ok(Self {
            threshold: ThresholdTracker::new(config.window_len()),
            detector: PeakDetector::new(config.dist()),
            heart_rate: HeartRateEstimator::new(config.sampling_rate),
            values: Vec::new(),
            times: Vec::new(),
            channels,
            resync_marks: Vec::new(),
            config,
        })
    }

    /// Append one sample and run threshold, peak and RR updates on it.
    pub fn ingest(&mut self, value: i32) {
        let index = self.values.len();
        self.values.push(value);
        for channel in &mut self.channels {
            channel.data.push(0.0);
        }
        self.times.push(index as f64 / self.config.sampling_rate);

        let threshold = self.threshold.update(&self.values);
        let is_peak = self.detector.update(&self.values, threshold);
        let rr = self.heart_rate.update(self.detector.peak_indices());
        trace!(index, value, threshold, is_peak, rr, "sample ingested");
    }

    /// Drop every sample, returning to the state right after creation.
    pub fn reset(&mut self) {
        self.values.clear();
        self.times.clear();
        for channel in &mut self.channels {
            channel.data.clear();
        }
        self.resync_marks.clear();
        self.threshold.clear();
        self.detector.clear();
        self.heart_rate.clear();
    }

    /// Overwrite the newest entry of an auxiliary channel.
    pub fn mark_channel(&mut self, name: &str, value: f64) -> Result<()> {
        let channel = self
            .channels
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| OxiError::UnknownChannel(name.to_string()))?;
        let last = channel.data.last_mut().ok_or(OxiError::EmptySession)?;
        *last = value;
        Ok(())
    }

    /// Remember that the stream had to be realigned after the newest sample.
    pub(crate) fn mark_resync(&mut self) {
        self.resync_marks.push(self.values.len().saturating_sub(1));
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn sampling_rate(&self) -> f64 {
        self.config.sampling_rate
    }

    pub fn window_len(&self) -> usize {
        self.threshold.window_len()
    }

    pub fn dist(&self) -> usize {
        self.detector.dist()
    }

    pub fn lag(&self) -> i64 {
        self.detector.lag()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn sample(&self, index: usize) -> Option<Sample> {
        self.values.get(index).map(|&v| Sample::new(index, v))
    }

    pub fn values(&self) -> &[i32] {
        &self.values
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn threshold(&self) -> &[f64] {
        self.threshold.threshold()
    }

    pub fn diff(&self) -> &[i64] {
        self.detector.diff()
    }

    pub fn peaks(&self) -> &[u8] {
        self.detector.peaks()
    }

    pub fn peak_indices(&self) -> &[usize] {
        self.detector.peak_indices()
    }

    pub fn last_peak(&self) -> Option<usize> {
        self.detector.peak_indices().last().copied()
    }

    pub fn instant_rr(&self) -> &[f64] {
        self.heart_rate.instant_rr()
    }

    pub fn instant_bpm(&self) -> Vec<f64> {
        self.heart_rate.instant_bpm()
    }

    pub fn channel(&self, name: &str) -> Option<&[f64]> {
        self.channels
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.data.as_slice())
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn resync_marks(&self) -> &[usize] {
        &self.resync_marks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels_follow_signal() {
        let mut session = RecordingSession::new(SessionConfig::default().with_auxiliary_channels(2)).unwrap();
        for v in [10, 20, 30] {
            session.ingest(v);
        }
        assert_eq!(session.channels().len(), 2);
        assert_eq!(session.channel("Channel_1"), Some(&[0.0, 0.0, 0.0][..]));
        assert!(session.channel("Channel_2").is_none());
    }

    #[test]
    fn test_mark_channel() {
        let mut session = RecordingSession::new(SessionConfig::default().with_auxiliary_channels(1)).unwrap();
        assert!(matches!(
            session.mark_channel("Channel_0", 1.0),
            Err(OxiError::EmptySession)
        ));
        session.ingest(5);
        session.ingest(6);
        session.mark_channel("Channel_0", 1.0).unwrap();
        assert_eq!(session.channel("Channel_0"), Some(&[0.0, 1.0][..]));
        assert!(matches!(
            session.mark_channel("stim", 1.0),
            Err(OxiError::UnknownChannel(_))
        ));
    }

    #[test]
    fn test_times() {
        let mut session = RecordingSession::new(SessionConfig::default()).unwrap();
        for _ in 0..4 {
            session.ingest(1);
        }
        assert_eq!(session.times(), &[0.0, 1.0 / 75.0, 2.0 / 75.0, 3.0 / 75.0]);
    }

    #[test]
    fn test_reset() {
        let mut session = RecordingSession::new(SessionConfig::default().with_auxiliary_channels(1)).unwrap();
        for v in 0..40 {
            session.ingest(v % 7);
        }
        session.mark_resync();
        session.reset();
        assert!(session.is_empty());
        assert_eq!(session.lag(), 0);
        assert!(session.threshold().is_empty());
        assert!(session.instant_rr().is_empty());
        assert!(session.resync_marks().is_empty());
        assert_eq!(session.channel("Channel_0"), Some(&[][..]));
    }

    #[test]
    fn test_extreme_values_do_not_overflow() {
        let mut session = RecordingSession::new(SessionConfig::default()).unwrap();
        session.ingest(i32::MIN);
        session.ingest(i32::MAX);
        session.ingest(i32::MIN);
        assert_eq!(session.diff(), &[4_294_967_295, -4_294_967_295]);
        assert_eq!(session.peaks().len(), 3);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SessionConfig::default().with_sampling_rate(0.0);
        assert!(matches!(RecordingSession::new(config), Err(OxiError::InvalidConfig(_))));
    }
}
