// src/error.rs

use std::io;
use thiserror::Error;

use crate::packet::FRAME_LEN;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, OxiError>;

/// The primary error type for the `nonin-oximeter` library.
#[derive(Error, Debug)]
pub enum OxiError {
    #[error("Frame validation failed: {}", hex::encode(frame))]
    FrameValidation { frame: [u8; FRAME_LEN] },

    #[error("No valid frame found after {attempts} attempts")]
    SynchronizationExhausted { attempts: usize },

    #[error("Device unavailable: {0}")]
    DeviceUnavailable(#[from] io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Session has no samples yet")]
    EmptySession,
}
