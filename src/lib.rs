//! Online acquisition and heartbeat detection for Nonin-style pulse oximeters.
//!
//! Bytes from a [`Device`] are framed and validated by [`packet`], recorded by
//! a [`RecordingSession`] which runs threshold tracking, peak detection and
//! RR estimation on every sample, and pumped by an [`AcquisitionLoop`].

pub mod acquisition;
pub mod config;
pub mod device;
pub mod error;
pub mod heart_rate;
pub mod packet;
pub mod peaks;
pub mod session;
pub mod threshold;

pub use acquisition::{AcquisitionLoop, SyncState};
pub use config::{SessionConfig, SyncPolicy};
pub use device::{Device, MemoryDevice};
pub use error::{OxiError, Result};
pub use packet::{FRAME_LEN, Packet, Sample};
pub use session::{Channel, RecordingSession};
