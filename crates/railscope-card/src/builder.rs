//! Fluent builder for [`Card`] instances.
//!
//! Separates configuration (port, baud, watchdog deadlines) from
//! construction, and offers a transport-injection entry point so tests
//! can run the full stack against a `MockTransport`.

use std::time::Duration;

use railscope_core::error::{Error, Result};
use railscope_core::transport::Transport;
use railscope_transport::{SerialTransport, DEFAULT_BAUD};

use crate::card::Card;
use crate::io::IoConfig;

/// Fluent builder for [`Card`].
///
/// Defaults match the card's bench configuration, so the simplest usage
/// is:
///
/// ```ignore
/// let card = CardBuilder::new()
///     .serial_port("/dev/ttyUSB0")
///     .build()
///     .await?;
/// ```
pub struct CardBuilder {
    serial_port: Option<String>,
    baud_rate: u32,
    stream_timeout: Duration,
    power_timeout: Duration,
}

impl CardBuilder {
    /// Create a builder with the card's defaults: 921600 baud, a 4 s
    /// stream deadline, and a 2.5 s power-query deadline.
    pub fn new() -> Self {
        let defaults = IoConfig::default();
        CardBuilder {
            serial_port: None,
            baud_rate: DEFAULT_BAUD,
            stream_timeout: defaults.stream_timeout,
            power_timeout: defaults.power_timeout,
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Override the link rate (default: [`DEFAULT_BAUD`]).
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = baud;
        self
    }

    /// Override the response deadline for the start-stream command.
    pub fn stream_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout = timeout;
        self
    }

    /// Override the response deadline for the power query.
    pub fn power_timeout(mut self, timeout: Duration) -> Self {
        self.power_timeout = timeout;
        self
    }

    /// Build a [`Card`] with a caller-provided transport.
    ///
    /// This is the primary entry point for testing (pass a
    /// `MockTransport` from `railscope-test-harness`) and for callers
    /// that manage the transport lifecycle themselves.
    pub fn build_with_transport(self, transport: Box<dyn Transport>) -> Card {
        Card::new(
            transport,
            IoConfig {
                stream_timeout: self.stream_timeout,
                power_timeout: self.power_timeout,
            },
        )
    }

    /// Build a [`Card`] over a serial transport.
    ///
    /// Requires that [`serial_port()`](Self::serial_port) has been called.
    pub async fn build(self) -> Result<Card> {
        let port = self
            .serial_port
            .clone()
            .ok_or_else(|| Error::InvalidParameter("serial_port is required for build()".into()))?;
        let transport = SerialTransport::open(&port, self.baud_rate).await?;
        Ok(self.build_with_transport(Box::new(transport)))
    }
}

impl Default for CardBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use railscope_test_harness::MockTransport;

    #[test]
    fn builder_defaults() {
        let builder = CardBuilder::new();
        assert_eq!(builder.baud_rate, 921_600);
        assert_eq!(builder.stream_timeout, Duration::from_secs(4));
        assert_eq!(builder.power_timeout, Duration::from_millis(2500));
    }

    #[test]
    fn builder_fluent_chain() {
        let builder = CardBuilder::new()
            .serial_port("/dev/ttyUSB0")
            .baud_rate(460_800)
            .stream_timeout(Duration::from_secs(2))
            .power_timeout(Duration::from_secs(1));
        assert_eq!(builder.serial_port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(builder.baud_rate, 460_800);
        assert_eq!(builder.stream_timeout, Duration::from_secs(2));
        assert_eq!(builder.power_timeout, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn serial_port_required_for_build() {
        let result = CardBuilder::new().build().await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn build_with_transport_starts_the_session() {
        let mock = MockTransport::new();
        let card = CardBuilder::new().build_with_transport(Box::new(mock));
        card.close().await.unwrap();
    }
}
