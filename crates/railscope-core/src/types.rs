//! Core types used throughout railscope.

use std::fmt;

/// Which of the two card commands a dispatch refers to.
///
/// Exactly one kind is active at a time: dispatching a command selects the
/// matching reply framing and discards whatever the previous exchange left
/// behind. There is no pipelining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Start the live sample stream (channel A acquisition).
    ///
    /// The card replies with an open-ended run of 6-byte sample frames,
    /// closed by the `FF DD FF` terminator.
    SampleStream,

    /// Request one power-rail telemetry frame.
    ///
    /// The card replies with a single 17-byte checksummed frame carrying
    /// all seven rail voltages.
    PowerQuery,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CommandKind::SampleStream => "sample-stream",
            CommandKind::PowerQuery => "power-query",
        };
        write!(f, "{s}")
    }
}

/// One point of the live sample stream, scaled to volts.
///
/// The index is monotonic across the whole stream session: it starts at 0
/// when the stream command is dispatched and increments once per sample
/// until the next dispatch. Plotting code can use it directly as the
/// X coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledSample {
    /// Position of this sample within the stream session.
    pub index: u64,
    /// Scaled value in volts.
    pub value: f64,
}

/// One power-rail telemetry reading: all seven monitored supply voltages,
/// in the card's wire order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerRails {
    /// +28 V supply.
    pub pos_28v: f32,
    /// +15 V supply.
    pub pos_15v: f32,
    /// -15 V supply.
    pub neg_15v: f32,
    /// External 10 V reference input.
    pub ext_10v: f32,
    /// +5 V supply.
    pub pos_5v: f32,
    /// -5 V supply.
    pub neg_5v: f32,
    /// +3.3 V supply.
    pub pos_3v3: f32,
}

impl PowerRails {
    /// Display labels for the seven rails, in wire order.
    ///
    /// Indexes match [`as_array`](Self::as_array), so the two can be
    /// zipped for tabular output.
    pub const LABELS: [&'static str; 7] = [
        "+28V", "+15V", "-15V", "EXT10V", "+5V", "-5V", "+3.3V",
    ];

    /// Return the seven rail voltages as an array, in wire order.
    pub fn as_array(&self) -> [f32; 7] {
        [
            self.pos_28v,
            self.pos_15v,
            self.neg_15v,
            self.ext_10v,
            self.pos_5v,
            self.neg_5v,
            self.pos_3v3,
        ]
    }
}

impl fmt::Display for PowerRails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (label, volts) in Self::LABELS.iter().zip(self.as_array()) {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{label}={volts:+.3}")?;
            first = false;
        }
        Ok(())
    }
}
