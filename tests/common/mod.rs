//! Common test utilities and shared imports

// Allow unused imports and dead code since this is a shared module
// used across multiple test files - not all items are used in every test file
#[allow(unused_imports)]
pub use nonin_oximeter::device::{Device, MemoryDevice};
#[allow(unused_imports)]
pub use nonin_oximeter::error::OxiError;
#[allow(unused_imports)]
pub use nonin_oximeter::packet::{self, FRAME_LEN, Packet};
#[allow(unused_imports)]
pub use nonin_oximeter::{AcquisitionLoop, RecordingSession, SessionConfig, SyncPolicy, SyncState};

/// Install a test-friendly subscriber; honours `RUST_LOG`.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Valid frame bytes carrying `value`.
#[allow(dead_code)]
pub fn frame(value: u8) -> [u8; FRAME_LEN] {
    Packet::encode(0, value, 0).to_array()
}

/// Triangle wave with one 75-sample cycle: 40 at the trough, 225 at the top.
#[allow(dead_code)]
pub fn pulse_wave(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| {
            let phase = i % 75;
            40 + 5 * phase.min(75 - phase) as u8
        })
        .collect()
}
