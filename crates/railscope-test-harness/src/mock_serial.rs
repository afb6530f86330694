//! Mock transport for deterministic testing of the card protocol.
//!
//! [`MockTransport`] implements the [`Transport`] trait with pre-loaded
//! request/response pairs. Because the card's decoder must behave
//! identically for every chunking of the same byte stream, responses can
//! be split into explicit chunks: each `receive()` call returns at most
//! one chunk, letting a test place frame boundaries anywhere.
//!
//! # Example
//!
//! ```
//! use railscope_test_harness::MockTransport;
//!
//! let mut mock = MockTransport::new();
//! // Power query answered with one 17-byte frame, delivered in three reads.
//! mock.expect_chunked(
//!     &[0x47, 0x01, 0x46],
//!     &[&[0x54, 0x01, 0x00, 0x00, 0x00], &[0x00; 11], &[0x55]],
//! );
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;

use railscope_core::error::{Error, Result};
use railscope_core::transport::Transport;

/// A pre-loaded request/response pair for the mock transport.
#[derive(Debug, Clone)]
struct Expectation {
    /// The exact bytes we expect to be sent.
    request: Vec<u8>,
    /// Reply chunks to hand out, one per `receive()` call.
    chunks: VecDeque<Vec<u8>>,
}

/// A mock [`Transport`] for testing the decoder and IO task without
/// hardware.
///
/// Expectations are consumed in order. When `send()` is called, the sent
/// data is recorded and matched against the next expectation; its reply
/// chunks are then returned by subsequent `receive()` calls, one chunk per
/// call. With no pending chunks, `receive()` returns
/// [`Error::Timeout`] -- the same idle outcome a silent card produces.
#[derive(Debug)]
pub struct MockTransport {
    /// Ordered queue of expected request/response pairs.
    expectations: VecDeque<Expectation>,
    /// Reply chunks pending for upcoming `receive()` calls.
    pending: VecDeque<Vec<u8>>,
    /// Whether the transport is "connected".
    connected: bool,
    /// Log of all bytes sent through this transport.
    sent_log: Vec<Vec<u8>>,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        MockTransport {
            expectations: VecDeque::new(),
            pending: VecDeque::new(),
            connected: true,
            sent_log: Vec::new(),
        }
    }

    /// Add an expected request answered by a single contiguous response.
    ///
    /// Equivalent to [`expect_chunked`](Self::expect_chunked) with one
    /// chunk.
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        self.expect_chunked(request, &[response]);
    }

    /// Add an expected request answered by the given reply chunks.
    ///
    /// Each `receive()` call after the matching `send()` returns one
    /// chunk. An empty chunk list models a card that accepts the command
    /// but never answers.
    pub fn expect_chunked(&mut self, request: &[u8], chunks: &[&[u8]]) {
        self.expectations.push_back(Expectation {
            request: request.to_vec(),
            chunks: chunks.iter().map(|c| c.to_vec()).collect(),
        });
    }

    /// All data sent through this transport, one entry per `send()` call.
    pub fn sent_data(&self) -> &[Vec<u8>] {
        &self.sent_log
    }

    /// Number of expectations that have not yet been consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.expectations.len()
    }

    /// Set the connected state.
    ///
    /// When `false`, `send()` and `receive()` return
    /// [`Error::NotConnected`].
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        self.sent_log.push(data.to_vec());

        match self.expectations.pop_front() {
            Some(expectation) => {
                if data != expectation.request.as_slice() {
                    return Err(Error::Protocol(format!(
                        "unexpected send data: expected {:02X?}, got {:02X?}",
                        expectation.request, data
                    )));
                }
                self.pending = expectation.chunks;
                Ok(())
            }
            None => Err(Error::Protocol(
                "no more expectations in mock transport".into(),
            )),
        }
    }

    async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        match self.pending.pop_front() {
            Some(mut chunk) => {
                if chunk.len() > buf.len() {
                    // Caller's buffer is smaller than the chunk: return
                    // what fits and keep the rest at the front.
                    let rest = chunk.split_off(buf.len());
                    self.pending.push_front(rest);
                }
                let n = chunk.len();
                buf[..n].copy_from_slice(&chunk);
                Ok(n)
            }
            None => Err(Error::Timeout),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.connected = false;
        self.pending.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn basic_send_receive() {
        let mut mock = MockTransport::new();
        let request = &[0x47, 0x01, 0x46];
        let response = &[0x54, 0x01, 0x00];

        mock.expect(request, response);
        mock.send(request).await.unwrap();

        let mut buf = [0u8; 64];
        let n = mock
            .receive(&mut buf, Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(&buf[..n], response);
    }

    #[tokio::test]
    async fn chunked_response_one_chunk_per_receive() {
        let mut mock = MockTransport::new();
        mock.expect_chunked(&[0xFF, 0x0A, 0xFF], &[&[0x00, 0x01], &[0x02], &[0x03, 0x04]]);

        mock.send(&[0xFF, 0x0A, 0xFF]).await.unwrap();

        let mut buf = [0u8; 64];
        let n = mock.receive(&mut buf, Duration::from_millis(10)).await.unwrap();
        assert_eq!(&buf[..n], &[0x00, 0x01]);
        let n = mock.receive(&mut buf, Duration::from_millis(10)).await.unwrap();
        assert_eq!(&buf[..n], &[0x02]);
        let n = mock.receive(&mut buf, Duration::from_millis(10)).await.unwrap();
        assert_eq!(&buf[..n], &[0x03, 0x04]);

        // Exhausted: behaves like a silent card.
        let result = mock.receive(&mut buf, Duration::from_millis(10)).await;
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn small_buffer_splits_a_chunk() {
        let mut mock = MockTransport::new();
        mock.expect(&[0x01], &[0xAA, 0xBB, 0xCC, 0xDD]);
        mock.send(&[0x01]).await.unwrap();

        let mut buf = [0u8; 3];
        let n = mock.receive(&mut buf, Duration::from_millis(10)).await.unwrap();
        assert_eq!(&buf[..n], &[0xAA, 0xBB, 0xCC]);
        let n = mock.receive(&mut buf, Duration::from_millis(10)).await.unwrap();
        assert_eq!(&buf[..n], &[0xDD]);
    }

    #[tokio::test]
    async fn empty_chunk_list_models_silence() {
        let mut mock = MockTransport::new();
        mock.expect_chunked(&[0x47, 0x01, 0x46], &[]);
        mock.send(&[0x47, 0x01, 0x46]).await.unwrap();

        let mut buf = [0u8; 8];
        let result = mock.receive(&mut buf, Duration::from_millis(10)).await;
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn wrong_data_errors() {
        let mut mock = MockTransport::new();
        mock.expect(&[0x01], &[0xFF]);

        let result = mock.send(&[0x99]).await;
        assert!(matches!(result, Err(Error::Protocol(_))));
    }

    #[tokio::test]
    async fn no_expectations_errors() {
        let mut mock = MockTransport::new();
        let result = mock.send(&[0x01]).await;
        assert!(matches!(result, Err(Error::Protocol(_))));
    }

    #[tokio::test]
    async fn tracks_sent_data() {
        let mut mock = MockTransport::new();
        mock.expect(&[0x01, 0x02], &[0xFF]);
        mock.expect(&[0x03, 0x04], &[0xFE]);

        mock.send(&[0x01, 0x02]).await.unwrap();
        mock.send(&[0x03, 0x04]).await.unwrap();

        assert_eq!(mock.sent_data().len(), 2);
        assert_eq!(mock.sent_data()[0], [0x01, 0x02]);
        assert_eq!(mock.sent_data()[1], [0x03, 0x04]);
        assert_eq!(mock.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn disconnect_blocks_io() {
        let mut mock = MockTransport::new();
        mock.close().await.unwrap();
        assert!(!mock.is_connected());

        let result = mock.send(&[0x01]).await;
        assert!(matches!(result, Err(Error::NotConnected)));

        let mut buf = [0u8; 8];
        let result = mock.receive(&mut buf, Duration::from_millis(10)).await;
        assert!(matches!(result, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn set_connected_toggles_state() {
        let mut mock = MockTransport::new();
        mock.set_connected(false);
        assert!(!mock.is_connected());
        mock.set_connected(true);
        assert!(mock.is_connected());
    }
}
