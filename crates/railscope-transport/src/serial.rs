//! Serial port transport for card communication.
//!
//! The card presents as a USB virtual COM port running at 921600 baud with
//! fixed 8N1 framing and no flow control; those parameters are not
//! configurable on the hardware side, so unlike a general-purpose serial
//! wrapper this module only exposes the baud rate (for bench setups with
//! rate-limiting adapters in the path).
//!
//! # Example
//!
//! ```no_run
//! use railscope_transport::{SerialTransport, DEFAULT_BAUD};
//! use railscope_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> railscope_core::Result<()> {
//! let mut transport = SerialTransport::open("/dev/ttyUSB0", DEFAULT_BAUD).await?;
//!
//! // Request one power-rail frame.
//! transport.send(&[0x47, 0x01, 0x46]).await?;
//!
//! // Read whatever arrives within one second.
//! let mut buf = [0u8; 256];
//! let n = transport.receive(&mut buf, Duration::from_secs(1)).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use railscope_core::error::{Error, Result};
use railscope_core::transport::Transport;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

/// The card's link rate: 921600 baud.
pub const DEFAULT_BAUD: u32 = 921_600;

/// List the serial port names present on this system.
///
/// Returned names are suitable for passing to [`SerialTransport::open`]
/// (e.g. `/dev/ttyUSB0` on Linux, `COM3` on Windows). The card does not
/// announce itself, so callers present the list to the user rather than
/// auto-selecting.
pub fn available_ports() -> Result<Vec<String>> {
    let ports = tokio_serial::available_ports()
        .map_err(|e| Error::Transport(format!("failed to enumerate serial ports: {e}")))?;
    Ok(ports.into_iter().map(|info| info.port_name).collect())
}

/// Serial port transport for card communication.
///
/// Implements the [`Transport`] trait over a USB virtual COM port with the
/// card's fixed 8N1/no-flow-control framing.
pub struct SerialTransport {
    /// The underlying serial stream; `None` once closed.
    port: Option<SerialStream>,
    /// Port name for logging.
    port_name: String,
}

impl SerialTransport {
    /// Open a serial port at the given baud rate with the card's fixed
    /// framing (8 data bits, no parity, 1 stop bit, no flow control).
    ///
    /// # Arguments
    ///
    /// * `port` - Serial port path (e.g. `/dev/ttyUSB0`, `COM3`)
    /// * `baud_rate` - Link rate; the card runs at [`DEFAULT_BAUD`]
    pub async fn open(port: &str, baud_rate: u32) -> Result<Self> {
        tracing::debug!(port = %port, baud_rate, "opening serial port");

        let stream = tokio_serial::new(port, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| {
                tracing::error!(port = %port, error = %e, "failed to open serial port");
                Error::Transport(format!("failed to open serial port {port}: {e}"))
            })?;

        tracing::info!(port = %port, baud_rate, "serial port opened");

        Ok(Self {
            port: Some(stream),
            port_name: port.to_string(),
        })
    }

    /// The name of the serial port this transport was opened on.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        tracing::trace!(port = %self.port_name, bytes = data.len(), data = ?data, "sending");

        port.write_all(data).await.map_err(|e| {
            tracing::error!(port = %self.port_name, error = %e, "failed to send");
            if e.kind() == std::io::ErrorKind::BrokenPipe
                || e.kind() == std::io::ErrorKind::NotConnected
            {
                Error::ConnectionLost
            } else {
                Error::Io(e)
            }
        })?;

        // Commands are tiny; flush so the card sees them immediately.
        port.flush().await.map_err(|e| {
            tracing::error!(port = %self.port_name, error = %e, "failed to flush");
            Error::Io(e)
        })?;

        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        match tokio::time::timeout(timeout, port.read(buf)).await {
            Ok(Ok(n)) => {
                tracing::trace!(port = %self.port_name, bytes = n, data = ?&buf[..n], "received");
                Ok(n)
            }
            Ok(Err(e)) => {
                tracing::error!(port = %self.port_name, error = %e, "failed to receive");
                if e.kind() == std::io::ErrorKind::BrokenPipe
                    || e.kind() == std::io::ErrorKind::NotConnected
                {
                    Err(Error::ConnectionLost)
                } else {
                    Err(Error::Io(e))
                }
            }
            Err(_) => Err(Error::Timeout),
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut port) = self.port.take() {
            tracing::debug!(port = %self.port_name, "closing serial port");
            if let Err(e) = port.flush().await {
                tracing::warn!(port = %self.port_name, error = %e, "flush before close failed");
            }
            // Dropping the stream closes the port.
            tracing::info!(port = %self.port_name, "serial port closed");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_baud_matches_card_link() {
        assert_eq!(DEFAULT_BAUD, 921_600);
    }

    #[tokio::test]
    async fn open_bad_port_is_transport_error() {
        let result = SerialTransport::open("/dev/nonexistent-railscope-port", DEFAULT_BAUD).await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }
}
