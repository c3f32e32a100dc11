//! Byte-level seam between the HID link and the serial device.

use async_trait::async_trait;
use std::io;

/// Minimal async interface the HID link needs from a port.
#[async_trait]
pub trait SerialPortIO: Send {
    /// Reads whatever is available into `buf`, waiting for at least one
    /// byte. `Ok(0)` means the port was closed.
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Writes the whole buffer.
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flushes pending output.
    async fn flush(&mut self) -> io::Result<()>;
}

/// [`SerialPortIO`] over a real `tokio_serial` stream.
pub struct TokioSerialPort {
    stream: tokio_serial::SerialStream,
}

impl TokioSerialPort {
    pub fn new(stream: tokio_serial::SerialStream) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl SerialPortIO for TokioSerialPort {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        use tokio::io::AsyncReadExt;
        self.stream.read(buf).await
    }

    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        use tokio::io::AsyncWriteExt;
        self.stream.write_all(data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        use tokio::io::AsyncWriteExt;
        self.stream.flush().await
    }
}
