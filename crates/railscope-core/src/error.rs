//! Error types for railscope.
//!
//! All fallible operations across the workspace return [`Result<T>`], which
//! uses [`Error`] as the error type. Transport faults, protocol decode
//! problems, and internal consistency violations are all captured here.
//!
//! Note the asymmetry required by the card's protocol: a malformed power
//! frame is NOT an `Err` anywhere -- the decoder logs it and stalls until
//! the next command is dispatched. [`Error::Protocol`] exists for callers
//! that need to report protocol-shaped failures (e.g. the mock transport),
//! not for the decode path.

/// The error type for all railscope operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (failed to open or configure the serial port).
    #[error("transport error: {0}")]
    Transport(String),

    /// A protocol-level error (unexpected bytes, mock expectation mismatch).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Timed out waiting for bytes from the card.
    ///
    /// At the transport level this is a normal idle outcome; the IO task
    /// polls in short slices and treats it as "no data yet".
    #[error("timeout waiting for response")]
    Timeout,

    /// No connection to the card has been established, or a write was
    /// attempted after the port was closed.
    #[error("not connected")]
    NotConnected,

    /// The connection to the card was lost unexpectedly (USB unplug,
    /// broken pipe).
    #[error("connection lost")]
    ConnectionLost,

    /// An invalid parameter was passed to a builder or command.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The reply accumulator was asked to consume past the end of its
    /// buffer.
    ///
    /// This is a programming-invariant violation inside the decoder; no
    /// sequence of received bytes can trigger it.
    #[error("advance past end of reply buffer: requested {requested}, available {available}")]
    InvalidAdvance {
        /// How many bytes the decoder tried to consume.
        requested: usize,
        /// How many unconsumed bytes were actually available.
        available: usize,
    },

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
