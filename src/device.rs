// src/device.rs

use crate::packet::Packet;
use bytes::{Buf, BytesMut};
use std::io::{self, Read};
use tracing::debug;
use zerocopy::IntoBytes;

/// Byte source the acquisition loop reads frames from.
///
/// Implementations are expected to be owned by exactly one reader.
pub trait Device {
    /// Number of buffered bytes that can be read without blocking.
    fn bytes_available(&self) -> io::Result<usize>;

    /// Fill `buf` completely, blocking until enough bytes arrive.
    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()>;

    /// Discard stale bytes waiting in the input buffer.
    fn reset_input_buffer(&mut self) -> io::Result<()>;
}

impl<D: Device + ?Sized> Device for &mut D {
    fn bytes_available(&self) -> io::Result<usize> {
        (**self).bytes_available()
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        (**self).read_exact(buf)
    }

    fn reset_input_buffer(&mut self) -> io::Result<()> {
        (**self).reset_input_buffer()
    }
}

impl<D: Device + ?Sized> Device for Box<D> {
    fn bytes_available(&self) -> io::Result<usize> {
        (**self).bytes_available()
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        (**self).read_exact(buf)
    }

    fn reset_input_buffer(&mut self) -> io::Result<()> {
        (**self).reset_input_buffer()
    }
}

/// In-memory replay of a recorded byte stream.
///
/// A replay has no notion of stale data, so [`Device::reset_input_buffer`]
/// keeps every byte and only counts the call. Reading past the end fails with
/// [`io::ErrorKind::UnexpectedEof`] instead of blocking.
#[derive(Debug, Clone, Default)]
pub struct MemoryDevice {
    buffer: BytesMut,
    consumed: usize,
    resets: usize,
}

impl MemoryDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Self {
        let mut device = Self::new();
        device.extend(bytes.as_ref());
        device
    }

    /// Load a whole capture, e.g. a raw dump of the serial port.
    pub fn from_reader<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        debug!(len = data.len(), "Loaded replay capture");
        Ok(Self::from_bytes(data))
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub fn push_frame(&mut self, packet: Packet) {
        self.extend(packet.as_bytes());
    }

    /// Queue one valid frame per value.
    pub fn push_values(&mut self, values: impl IntoIterator<Item = u8>) {
        for value in values {
            self.push_frame(Packet::encode(0, value, 0));
        }
    }

    /// Bytes handed out so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// How often the input buffer was reset.
    pub fn resets(&self) -> usize {
        self.resets
    }
}

impl Device for MemoryDevice {
    fn bytes_available(&self) -> io::Result<usize> {
        Ok(self.buffer.remaining())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        if buf.len() > self.buffer.remaining() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "replay exhausted: wanted {} bytes, {} left",
                    buf.len(),
                    self.buffer.remaining()
                ),
            ));
        }
        self.buffer.copy_to_slice(buf);
        self.consumed += buf.len();
        Ok(())
    }

    fn reset_input_buffer(&mut self) -> io::Result<()> {
        self.resets += 1;
        Ok(())
    }
}

#[cfg(feature = "serial")]
mod serial {
    use super::Device;
    use crate::error::Result;
    use serialport::{ClearBuffer, DataBits, Parity, SerialPort, StopBits};
    use std::io;
    use std::time::Duration;
    use tracing::info;

    /// Baud rate of the Nonin serial output.
    pub const DEFAULT_BAUD_RATE: u32 = 9600;

    impl Device for dyn SerialPort {
        fn bytes_available(&self) -> io::Result<usize> {
            Ok(self.bytes_to_read()? as usize)
        }

        fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
            io::Read::read_exact(self, buf)
        }

        fn reset_input_buffer(&mut self) -> io::Result<()> {
            self.clear(ClearBuffer::Input)?;
            Ok(())
        }
    }

    /// Open a serial port with the 8N1 framing the oximeter uses.
    pub fn open_serial(path: &str, baud_rate: u32, timeout: Duration) -> Result<Box<dyn SerialPort>> {
        info!("Opening {} @ {} baud", path, baud_rate);
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(timeout)
            .open()
            .map_err(io::Error::from)?;
        Ok(port)
    }
}

#[cfg(feature = "serial")]
pub use serial::{DEFAULT_BAUD_RATE, open_serial};
