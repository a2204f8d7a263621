//! Frame acquisition from a [`Device`] into a [`RecordingSession`].
//!
//! The loop is poll-driven and single-threaded. Two ways of feeding the
//! session are offered:
//!
//! - [`AcquisitionLoop::read_for_duration`] blocks for a fixed wall-clock
//!   time and restarts the recording on a framing error.
//! - [`AcquisitionLoop::drain_available`] consumes whatever is buffered and
//!   returns immediately, so it can be interleaved with other work. The device
//!   keeps only a few seconds of data, so it has to be called often enough.

use crate::config::{SessionConfig, SyncPolicy};
use crate::device::Device;
use crate::error::{OxiError, Result};
use crate::packet::{self, FRAME_LEN, Packet};
use crate::session::RecordingSession;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Whether the loop currently knows where frames start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Unsynchronized,
    Synchronized,
}

pub struct AcquisitionLoop<D> {
    device: D,
    session: RecordingSession,
    policy: SyncPolicy,
    state: SyncState,
    resync_count: usize,
}

impl<D: Device> AcquisitionLoop<D> {
    pub fn new(device: D, config: SessionConfig) -> Result<Self> {
        Ok(Self {
            device,
            session: RecordingSession::new(config)?,
            policy: SyncPolicy::default(),
            state: SyncState::Unsynchronized,
            resync_count: 0,
        })
    }

    pub fn with_policy(mut self, policy: SyncPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Clear the session and lock onto the next valid frame.
    ///
    /// The frame used for locking is consumed but not recorded.
    pub fn synchronize(&mut self) -> Result<()> {
        info!("Synchronizing with oximeter stream...");
        self.session.reset();
        self.state = SyncState::Unsynchronized;
        let attempts = self.realign()?;
        self.state = SyncState::Synchronized;
        info!("Stream synchronized after {} window(s)", attempts);
        Ok(())
    }

    /// Record for `duration`, busy-polling the device.
    ///
    /// A corrupted frame triggers [`synchronize`](Self::synchronize), which
    /// discards what was recorded so far. Returns the number of frames
    /// recorded since the last restart.
    pub fn read_for_duration(&mut self, duration: Duration) -> Result<usize> {
        let start = Instant::now();
        let mut ingested = 0;
        while start.elapsed() < duration {
            if self.device.bytes_available()? < FRAME_LEN {
                std::hint::spin_loop();
                continue;
            }
            let frame = self.read_frame()?;
            if self.ingest_frame(&frame) {
                ingested += 1;
            } else {
                warn!(frame = %hex::encode(frame), "Synch error, restarting recording");
                self.resync_count += 1;
                self.synchronize()?;
                ingested = 0;
            }
        }
        debug!(ingested, elapsed_ms = start.elapsed().as_millis() as u64, "Timed read finished");
        Ok(ingested)
    }

    /// Record every complete frame currently buffered, without blocking.
    ///
    /// With `stop_on_error` a corrupted frame is returned as
    /// [`OxiError::FrameValidation`]; otherwise the stream is realigned in
    /// place and the recording continues. Returns the number of frames
    /// recorded.
    pub fn drain_available(&mut self, stop_on_error: bool) -> Result<usize> {
        let mut ingested = 0;
        while self.device.bytes_available()? >= FRAME_LEN {
            let frame = self.read_frame()?;
            if self.ingest_frame(&frame) {
                ingested += 1;
            } else if stop_on_error {
                self.state = SyncState::Unsynchronized;
                return Err(OxiError::FrameValidation { frame });
            } else {
                self.recover_inline(&frame)?;
            }
        }
        Ok(ingested)
    }

    /// Record until a new heartbeat is detected.
    ///
    /// Returns the sample index of the beat, or `None` if `timeout` elapses
    /// first.
    pub fn wait_beat(&mut self, timeout: Duration) -> Result<Option<usize>> {
        let start = Instant::now();
        let known = self.session.peak_indices().len();
        while start.elapsed() < timeout {
            if self.device.bytes_available()? < FRAME_LEN {
                std::hint::spin_loop();
                continue;
            }
            let frame = self.read_frame()?;
            if !self.ingest_frame(&frame) {
                self.recover_inline(&frame)?;
            } else if self.session.peak_indices().len() > known {
                return Ok(self.session.last_peak());
            }
        }
        Ok(None)
    }

    /// Forward to [`RecordingSession::mark_channel`].
    pub fn mark_channel(&mut self, name: &str, value: f64) -> Result<()> {
        self.session.mark_channel(name, value)
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn session(&self) -> &RecordingSession {
        &self.session
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Realignments caused by corrupted frames.
    pub fn resync_count(&self) -> usize {
        self.resync_count
    }

    pub fn policy(&self) -> SyncPolicy {
        self.policy
    }

    pub fn into_parts(self) -> (D, RecordingSession) {
        (self.device, self.session)
    }

    fn read_frame(&mut self) -> Result<[u8; FRAME_LEN]> {
        let mut frame = [0u8; FRAME_LEN];
        self.device.read_exact(&mut frame)?;
        trace!(bytes = hex::encode(frame), "Frame read");
        Ok(frame)
    }

    fn ingest_frame(&mut self, frame: &[u8; FRAME_LEN]) -> bool {
        match Packet::parse(frame) {
            Ok(packet) => {
                self.session.ingest(i32::from(packet.value()));
                true
            }
            Err(_) => false,
        }
    }

    fn recover_inline(&mut self, frame: &[u8; FRAME_LEN]) -> Result<()> {
        warn!(frame = %hex::encode(frame), "Synch error");
        self.session.mark_resync();
        self.resync_count += 1;
        self.state = SyncState::Unsynchronized;
        self.realign()?;
        self.state = SyncState::Synchronized;
        Ok(())
    }

    /// Slide a 5-byte window over the stream until it holds a valid frame.
    ///
    /// The input buffer is cleared before the scan and again after every
    /// `FRAME_LEN` rejected windows. Returns the number of windows tested.
    fn realign(&mut self) -> Result<usize> {
        let mut window = [0u8; FRAME_LEN];
        self.device.reset_input_buffer()?;
        self.device.read_exact(&mut window)?;

        let mut attempts = 0;
        loop {
            attempts += 1;
            if packet::validate(&window) {
                debug!(attempts, frame = %hex::encode(window), "Frame boundary found");
                return Ok(attempts);
            }
            trace!(frame = %hex::encode(window), "Rejected sync window");

            if let Some(max) = self.policy.max_attempts {
                if attempts >= max {
                    warn!("Giving up synchronization after {} attempts", attempts);
                    return Err(OxiError::SynchronizationExhausted { attempts });
                }
            }
            if attempts % FRAME_LEN == 0 {
                self.device.reset_input_buffer()?;
            }

            window.copy_within(1.., 0);
            self.device.read_exact(&mut window[FRAME_LEN - 1..])?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MemoryDevice;

    fn acquisition(device: MemoryDevice) -> AcquisitionLoop<MemoryDevice> {
        AcquisitionLoop::new(device, SessionConfig::default()).unwrap()
    }

    #[test]
    fn test_starts_unsynchronized() {
        let acq = acquisition(MemoryDevice::new());
        assert_eq!(acq.state(), SyncState::Unsynchronized);
        assert_eq!(acq.policy(), SyncPolicy::unbounded());
    }

    #[test]
    fn test_synchronize_on_clean_stream() {
        let mut device = MemoryDevice::new();
        device.push_values([1, 2, 3]);
        let mut acq = acquisition(device);
        acq.synchronize().unwrap();
        assert_eq!(acq.state(), SyncState::Synchronized);
        assert!(acq.session().is_empty());
        assert_eq!(acq.device().consumed(), FRAME_LEN);
        assert_eq!(acq.drain_available(true).unwrap(), 2);
        assert_eq!(acq.session().values(), &[2, 3]);
    }

    #[test]
    fn test_bounded_sync_gives_up() {
        let device = MemoryDevice::from_bytes([0u8; 40]);
        let mut acq = acquisition(device).with_policy(SyncPolicy::bounded(7));
        match acq.synchronize() {
            Err(OxiError::SynchronizationExhausted { attempts }) => assert_eq!(attempts, 7),
            other => panic!("Expected SynchronizationExhausted, got {:?}", other),
        }
        assert_eq!(acq.state(), SyncState::Unsynchronized);
        // 5 bytes for the first window, one per further window
        assert_eq!(acq.device().consumed(), 11);
    }

    #[test]
    fn test_scan_clears_buffer_every_frame_length() {
        let mut device = MemoryDevice::from_bytes([0u8; 12]);
        device.push_values([9]);
        let mut acq = acquisition(device);
        acq.synchronize().unwrap();
        // 13 windows tested: resets before the scan, after 5 and after 10
        assert_eq!(acq.device().resets(), 3);
        assert_eq!(acq.device().bytes_available().unwrap(), 0);
    }

    #[test]
    fn test_unbounded_sync_surfaces_eof() {
        let device = MemoryDevice::from_bytes([0u8; 9]);
        let mut acq = acquisition(device);
        assert!(matches!(acq.synchronize(), Err(OxiError::DeviceUnavailable(_))));
    }
}
