//! Transport trait for card communication.
//!
//! The [`Transport`] trait abstracts over the physical link to the card.
//! The production implementation is the serial port transport in
//! `railscope-transport`; tests use the deterministic `MockTransport` from
//! `railscope-test-harness`.
//!
//! The decoder and IO task operate on a `Transport` rather than directly
//! on a serial port, so every protocol behavior -- chunked arrivals,
//! terminator handling, checksum stalls, response timeouts -- can be
//! exercised without hardware.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Asynchronous byte-level transport to the card.
///
/// Implementations deliver bytes at arbitrary boundaries: a single 6-byte
/// sample frame may arrive in three reads, and one read may span several
/// frames. Framing is entirely the decoder's problem; a transport only
/// moves bytes and preserves their order.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the card.
    ///
    /// Implementations should not return until all bytes have been handed
    /// to the underlying link (serial TX buffer flushed).
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the card into the provided buffer.
    ///
    /// Returns the number of bytes actually read, which may be any value
    /// from 1 to `buf.len()`. Waits up to `timeout` for data; returns
    /// [`Error::Timeout`](crate::error::Error::Timeout) if nothing arrived
    /// within the deadline.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Close the transport connection.
    ///
    /// After `close()`, subsequent `send()` and `receive()` calls return
    /// [`Error::NotConnected`](crate::error::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}
