//! Reply decoding for the card's two command contexts.
//!
//! Bytes arrive from the transport at arbitrary boundaries. They are
//! appended to a [`FrameAccumulator`] and drained by whichever decoder the
//! last dispatched command selected:
//!
//! - [`StreamDecoder`] -- variable-length: consumes 6-byte sample frames
//!   by advancing a logical offset, and recognizes the stream terminator
//!   as a suffix of the whole unconsumed view.
//! - [`PowerDecoder`] -- fixed-length: acts only when the buffer holds
//!   exactly one 17-byte frame, and validates header and checksum before
//!   emitting anything.
//!
//! The two consumption policies are deliberately kept in separate types so
//! each is locally obvious: the stream decoder never clears the buffer
//! except at the terminator, and the power decoder never advances at all.
//!
//! The sequence of emitted [`Reply`] values depends only on the total byte
//! stream, never on how it was chunked.

use tracing::{debug, warn};

use railscope_core::error::{Error, Result};
use railscope_core::types::{CommandKind, PowerRails, ScaledSample};

use crate::wire::{
    scale_direct_rail, scale_divided_rail, scale_sample, xor_checksum, POWER_FRAME_HEADER,
    POWER_FRAME_LEN, POWER_FRAME_SUB_ID, SAMPLE_FRAME_LEN, STREAM_TERMINATOR,
};

/// A typed message decoded from the reply stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The scaled points of one sample frame (always three), in wire order.
    Samples(Vec<ScaledSample>),

    /// The stream terminator was seen; the exchange is over.
    StreamComplete,

    /// A validated power frame.
    Power(PowerRails),
}

/// Append-only reply buffer with a logical consumption offset.
///
/// Invariant: `0 <= consumed <= buf.len()`. Consumed bytes are not
/// physically removed; the buffer is cleared only by [`reset`](Self::reset)
/// (on command dispatch, on the stream terminator, and on a validated
/// power frame). A long stream session therefore grows the buffer until
/// its terminator arrives -- accepted behavior for exchanges that run
/// seconds, not hours.
#[derive(Debug, Default)]
pub struct FrameAccumulator {
    buf: Vec<u8>,
    consumed: usize,
}

impl FrameAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a received chunk to the end of the buffer.
    pub fn append(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Total buffered length, including already-consumed bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The whole buffer, including already-consumed bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Number of bytes not yet consumed.
    pub fn unconsumed_len(&self) -> usize {
        self.buf.len() - self.consumed
    }

    /// Read-only view of the unconsumed tail.
    pub fn unconsumed(&self) -> &[u8] {
        &self.buf[self.consumed..]
    }

    /// Mark `n` more bytes as consumed.
    ///
    /// Fails with [`Error::InvalidAdvance`] if that would run past the end
    /// of the buffer; valid input can never trigger this.
    pub fn advance(&mut self, n: usize) -> Result<()> {
        let available = self.unconsumed_len();
        if n > available {
            return Err(Error::InvalidAdvance {
                requested: n,
                available,
            });
        }
        self.consumed += n;
        Ok(())
    }

    /// Clear the buffer and the consumption offset.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.consumed = 0;
    }
}

/// Decoder for the open-ended sample stream.
///
/// Owns the running sample index for the session; the index survives
/// across decode passes and resets only when a new command is dispatched.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    next_index: u64,
}

impl StreamDecoder {
    /// Drain as many complete frames as the accumulator holds.
    ///
    /// The terminator check comes first and matches the last three bytes
    /// of the entire unconsumed view: a terminator that arrives in the
    /// same chunk as pending sample frames still ends the exchange, and
    /// any bytes in front of it are discarded, not decoded.
    fn drain(&mut self, accum: &mut FrameAccumulator, out: &mut Vec<Reply>) -> Result<()> {
        while accum.unconsumed_len() >= STREAM_TERMINATOR.len() {
            if accum.unconsumed().ends_with(&STREAM_TERMINATOR) {
                debug!(
                    discarded = accum.unconsumed_len() - STREAM_TERMINATOR.len(),
                    "stream terminator received"
                );
                accum.reset();
                out.push(Reply::StreamComplete);
                break;
            }

            if accum.unconsumed_len() >= SAMPLE_FRAME_LEN {
                let mut samples = Vec::with_capacity(SAMPLE_FRAME_LEN / 2);
                for pair in accum.unconsumed()[..SAMPLE_FRAME_LEN].chunks_exact(2) {
                    let raw = u16::from_be_bytes([pair[0], pair[1]]);
                    samples.push(ScaledSample {
                        index: self.next_index,
                        value: scale_sample(raw),
                    });
                    self.next_index += 1;
                }
                accum.advance(SAMPLE_FRAME_LEN)?;
                out.push(Reply::Samples(samples));
                continue;
            }

            // 3-5 unconsumed bytes that are not a terminator: wait for the
            // rest of the frame.
            break;
        }
        Ok(())
    }
}

/// Decoder for the fixed 17-byte power frame.
///
/// Acts only when the buffer holds exactly one frame. A header or checksum
/// mismatch is logged and leaves the buffer untouched, which stalls this
/// decoder until the next dispatch clears it -- the card offers no way to
/// resynchronize mid-window, so none is invented here.
#[derive(Debug, Default)]
pub struct PowerDecoder;

impl PowerDecoder {
    fn drain(&mut self, accum: &mut FrameAccumulator, out: &mut Vec<Reply>) {
        if accum.len() < POWER_FRAME_LEN {
            debug!(have = accum.len(), need = POWER_FRAME_LEN, "power frame incomplete");
            return;
        }
        if accum.len() > POWER_FRAME_LEN {
            warn!(
                have = accum.len(),
                need = POWER_FRAME_LEN,
                "power reply overran the expected frame; waiting for next dispatch"
            );
            return;
        }

        let frame = accum.bytes();
        if frame[0] != POWER_FRAME_HEADER || frame[1] != POWER_FRAME_SUB_ID {
            warn!(
                header = frame[0],
                sub_id = frame[1],
                "power frame header mismatch"
            );
            return;
        }

        let expected = xor_checksum(&frame[..POWER_FRAME_LEN - 1]);
        let actual = frame[POWER_FRAME_LEN - 1];
        if actual != expected {
            warn!(actual, expected, "power frame checksum mismatch");
            return;
        }

        let mut raw = [0u16; 7];
        for (slot, pair) in raw
            .iter_mut()
            .zip(frame[2..POWER_FRAME_LEN - 1].chunks_exact(2))
        {
            *slot = u16::from_be_bytes([pair[0], pair[1]]);
        }

        let rails = PowerRails {
            pos_28v: scale_divided_rail(raw[0]),
            pos_15v: scale_divided_rail(raw[1]),
            neg_15v: scale_divided_rail(raw[2]),
            ext_10v: scale_divided_rail(raw[3]),
            pos_5v: scale_direct_rail(raw[4]),
            neg_5v: scale_direct_rail(raw[5]),
            pos_3v3: scale_direct_rail(raw[6]),
        };

        accum.reset();
        out.push(Reply::Power(rails));
    }
}

#[derive(Debug, Default)]
enum ActiveDecoder {
    /// No command dispatched yet; bytes accumulate but nothing is decoded.
    #[default]
    Idle,
    Stream(StreamDecoder),
    Power(PowerDecoder),
}

/// The command context: tracks which reply framing is active and owns the
/// accumulator and the session's sample index.
///
/// One `ReplyDecoder` per card connection; the IO task is its only caller,
/// so decode passes are strictly serialized with dispatches.
#[derive(Debug, Default)]
pub struct ReplyDecoder {
    accum: FrameAccumulator,
    active: ActiveDecoder,
}

impl ReplyDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the decoder for the reply to `kind`.
    ///
    /// Clears the accumulator and resets the sample index, unconditionally
    /// discarding any frame-in-progress. Must be called before the command
    /// bytes are written to the transport so the reply lands in a clean
    /// window.
    pub fn dispatch(&mut self, kind: CommandKind) {
        self.accum.reset();
        self.active = match kind {
            CommandKind::SampleStream => ActiveDecoder::Stream(StreamDecoder::default()),
            CommandKind::PowerQuery => ActiveDecoder::Power(PowerDecoder),
        };
        debug!(%kind, "decoder armed");
    }

    /// Append a received chunk and run one decode pass to completion.
    ///
    /// Returns every reply the newly available bytes completed, in order;
    /// an empty vec means "waiting for more bytes" (or a stalled power
    /// window). Never blocks.
    pub fn on_bytes(&mut self, chunk: &[u8]) -> Result<Vec<Reply>> {
        self.accum.append(chunk);

        let mut out = Vec::new();
        match &mut self.active {
            ActiveDecoder::Idle => {
                debug!(buffered = self.accum.len(), "bytes received with no command in flight");
            }
            ActiveDecoder::Stream(decoder) => decoder.drain(&mut self.accum, &mut out)?,
            ActiveDecoder::Power(decoder) => decoder.drain(&mut self.accum, &mut out),
        }
        Ok(out)
    }
}
