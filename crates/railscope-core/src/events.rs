//! Decoded card events.
//!
//! Events are emitted by the card's IO task through a
//! `tokio::sync::broadcast` channel as replies are decoded from the
//! serial stream. A plotting UI or CLI subscribes to them instead of
//! touching raw bytes.

use crate::types::{CommandKind, PowerRails};

/// A decoded message (or session condition) from the card.
///
/// Subscribe via `Card::subscribe()`. Delivery is best-effort through a
/// bounded broadcast channel; a consumer that falls behind a fast sample
/// stream may miss events, but the IO task never blocks on a slow
/// subscriber.
#[derive(Debug, Clone)]
pub enum CardEvent {
    /// One scaled point of the live sample stream.
    ///
    /// Emitted three at a time per 6-byte sample frame, in wire order.
    StreamSample {
        /// Monotonic position within the stream session.
        index: u64,
        /// Scaled value in volts.
        value: f64,
    },

    /// The stream terminator was received; the acquisition is finished.
    StreamComplete,

    /// A validated power-rail telemetry frame.
    PowerReading(PowerRails),

    /// No bytes arrived within the response deadline for a dispatched
    /// command.
    ///
    /// The deadline is armed when the command is written and disarmed by
    /// the first received byte, whatever it decodes to. Whether to re-send
    /// is the consumer's policy.
    ResponseTimeout {
        /// The command that went unanswered.
        kind: CommandKind,
    },
}
