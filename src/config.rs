use crate::error::{OxiError, Result};
use serde::{Deserialize, Serialize};

/// Default sampling rate of the Nonin serial stream (Hz).
pub const DEFAULT_SAMPLING_RATE: f64 = 75.0;

/// Recording parameters fixed at session creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Samples per second
    pub sampling_rate: f64,
    /// Number of auxiliary channels recorded next to the signal
    pub auxiliary_channels: usize,
    /// Length of the trailing threshold window in seconds
    pub threshold_window_seconds: f64,
    /// Minimum spacing between two peaks in seconds
    pub refractory_seconds: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sampling_rate: DEFAULT_SAMPLING_RATE,
            auxiliary_channels: 0,
            threshold_window_seconds: 1.0,
            refractory_seconds: 0.2,
        }
    }
}

impl SessionConfig {
    pub fn with_sampling_rate(mut self, sampling_rate: f64) -> Self {
        self.sampling_rate = sampling_rate;
        self
    }

    pub fn with_auxiliary_channels(mut self, count: usize) -> Self {
        self.auxiliary_channels = count;
        self
    }

    pub fn with_threshold_window(mut self, seconds: f64) -> Self {
        self.threshold_window_seconds = seconds;
        self
    }

    pub fn with_refractory(mut self, seconds: f64) -> Self {
        self.refractory_seconds = seconds;
        self
    }

    /// Threshold window in samples (truncated).
    pub fn window_len(&self) -> usize {
        (self.threshold_window_seconds * self.sampling_rate) as usize
    }

    /// Refractory distance in samples (truncated).
    pub fn dist(&self) -> usize {
        (self.refractory_seconds * self.sampling_rate) as usize
    }

    pub fn validate(&self) -> Result<()> {
        if !self.sampling_rate.is_finite() || self.sampling_rate <= 0.0 {
            return Err(OxiError::InvalidConfig(format!(
                "sampling_rate must be positive, got {}",
                self.sampling_rate
            )));
        }
        if !self.threshold_window_seconds.is_finite() || self.window_len() == 0 {
            return Err(OxiError::InvalidConfig(format!(
                "threshold window of {} s is shorter than one sample",
                self.threshold_window_seconds
            )));
        }
        if !self.refractory_seconds.is_finite() || self.refractory_seconds < 0.0 {
            return Err(OxiError::InvalidConfig(format!(
                "refractory_seconds must be non-negative, got {}",
                self.refractory_seconds
            )));
        }
        Ok(())
    }
}

/// How hard the acquisition loop tries to find frame alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncPolicy {
    /// Windows to test before giving up; `None` retries forever.
    pub max_attempts: Option<usize>,
}

impl SyncPolicy {
    pub fn unbounded() -> Self {
        Self { max_attempts: None }
    }

    pub fn bounded(max_attempts: usize) -> Self {
        Self {
            max_attempts: Some(max_attempts),
        }
    }
}
