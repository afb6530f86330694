//! Wire-level vocabulary of the card protocol.
//!
//! Commands (host to card):
//!
//! ```text
//! FF 0A FF          start sample stream (no trailer)
//! 47 01 <xor>       power query; trailer is the XOR of the two bytes
//! ```
//!
//! Replies (card to host), interpreted per the active command:
//!
//! ```text
//! <u16be> <u16be> <u16be>                  6-byte sample frame
//! FF DD FF                                 stream terminator (suffix match)
//! 54 01 <14 payload bytes> <xor>           17-byte power frame
//! ```
//!
//! Everything in this module is pure: constants, the checksum fold, the
//! command encoders, and the raw-to-volts scaling functions.

use bytes::{BufMut, BytesMut};

use railscope_core::types::CommandKind;

/// Start-stream command bytes. Sent verbatim; carries no checksum.
pub const START_STREAM: [u8; 3] = [0xFF, 0x0A, 0xFF];

/// Power-query command header; the encoder appends an XOR trailer.
pub const POWER_QUERY: [u8; 2] = [0x47, 0x01];

/// Terminator closing a sample-stream exchange.
///
/// Matched as a suffix of the unconsumed reply bytes, so it is recognized
/// even when it lands in the same chunk as trailing sample frames.
pub const STREAM_TERMINATOR: [u8; 3] = [0xFF, 0xDD, 0xFF];

/// Length of one sample frame: three big-endian u16 values.
pub const SAMPLE_FRAME_LEN: usize = 6;

/// Total length of a power frame including header and checksum byte.
pub const POWER_FRAME_LEN: usize = 17;

/// First byte of a power frame.
pub const POWER_FRAME_HEADER: u8 = 0x54;

/// Second byte of a power frame.
pub const POWER_FRAME_SUB_ID: u8 = 0x01;

/// XOR fold over all given bytes.
///
/// Validates a power frame (first 16 bytes against the 17th) and produces
/// the power-query command trailer.
///
/// # Example
///
/// ```
/// use railscope_card::wire::xor_checksum;
///
/// assert_eq!(xor_checksum(&[0x47, 0x01]), 0x46);
/// assert_eq!(xor_checksum(&[]), 0x00);
/// ```
pub fn xor_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

/// Encode the start-stream command.
///
/// # Example
///
/// ```
/// use railscope_card::wire::encode_start_stream;
///
/// assert_eq!(encode_start_stream(), vec![0xFF, 0x0A, 0xFF]);
/// ```
pub fn encode_start_stream() -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(START_STREAM.len());
    buf.put_slice(&START_STREAM);
    buf.to_vec()
}

/// Encode the power-query command with its XOR trailer.
///
/// # Example
///
/// ```
/// use railscope_card::wire::encode_power_query;
///
/// assert_eq!(encode_power_query(), vec![0x47, 0x01, 0x46]);
/// ```
pub fn encode_power_query() -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(POWER_QUERY.len() + 1);
    buf.put_slice(&POWER_QUERY);
    buf.put_u8(xor_checksum(&POWER_QUERY));
    buf.to_vec()
}

/// Encode the command bytes for the given kind.
pub fn encode_command(kind: CommandKind) -> Vec<u8> {
    match kind {
        CommandKind::SampleStream => encode_start_stream(),
        CommandKind::PowerQuery => encode_power_query(),
    }
}

/// Scale a raw 16-bit sample to volts.
///
/// The ADC front end maps the full raw range downward from a 2.5 V
/// reference in steps of 1.5259/10000 V.
pub fn scale_sample(raw: u16) -> f64 {
    2.5 - (raw as f64 * 1.5259 / 10000.0)
}

/// Scale a raw rail reading sensed through the 1/3 voltage divider.
///
/// Applies to the +28 V, +15 V, -15 V, and external 10 V channels.
pub fn scale_divided_rail(raw: u16) -> f32 {
    ((raw as f32 * 20.48) / 4095.0 - 10.24) * 3.0
}

/// Scale a raw rail reading sensed directly.
///
/// Applies to the +5 V, -5 V, and +3.3 V channels.
pub fn scale_direct_rail(raw: u16) -> f32 {
    (raw as f32 * 20.48) / 4095.0 - 10.24
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---------------------------------------------------------------
    // Checksum
    // ---------------------------------------------------------------

    #[test]
    fn checksum_power_query_header() {
        assert_eq!(xor_checksum(&POWER_QUERY), 0x46);
    }

    #[test]
    fn checksum_is_xor_fold() {
        assert_eq!(xor_checksum(&[0xFF]), 0xFF);
        assert_eq!(xor_checksum(&[0xFF, 0xFF]), 0x00);
        assert_eq!(xor_checksum(&[0x54, 0x01, 0x0F, 0xFF]), 0xA5);
    }

    #[test]
    fn checksum_validates_power_frame_shape() {
        // Header + all-zero payload: only the first two bytes contribute.
        let mut frame = vec![POWER_FRAME_HEADER, POWER_FRAME_SUB_ID];
        frame.extend_from_slice(&[0u8; 14]);
        assert_eq!(xor_checksum(&frame), 0x55);
    }

    // ---------------------------------------------------------------
    // Command encoding
    // ---------------------------------------------------------------

    #[test]
    fn encode_start_stream_bytes() {
        assert_eq!(encode_start_stream(), vec![0xFF, 0x0A, 0xFF]);
    }

    #[test]
    fn encode_power_query_bytes() {
        assert_eq!(encode_power_query(), vec![0x47, 0x01, 0x46]);
    }

    #[test]
    fn encode_command_dispatches_on_kind() {
        assert_eq!(
            encode_command(CommandKind::SampleStream),
            encode_start_stream()
        );
        assert_eq!(encode_command(CommandKind::PowerQuery), encode_power_query());
    }

    // ---------------------------------------------------------------
    // Sample scaling
    // ---------------------------------------------------------------

    #[test]
    fn scale_sample_zero_is_reference() {
        assert_eq!(scale_sample(0x0000), 2.5);
    }

    #[test]
    fn scale_sample_full_scale() {
        let expected = 2.5 - (65535.0 * 1.5259 / 10000.0);
        assert!((scale_sample(0xFFFF) - expected).abs() < 1e-12);
    }

    #[test]
    fn scale_sample_is_linear_in_raw() {
        let step = 1.5259 / 10000.0;
        assert!((scale_sample(1) - (2.5 - step)).abs() < 1e-12);
        assert!((scale_sample(1000) - (2.5 - 1000.0 * step)).abs() < 1e-9);
    }

    // ---------------------------------------------------------------
    // Rail scaling
    // ---------------------------------------------------------------

    #[test]
    fn divided_rail_zero() {
        assert!((scale_divided_rail(0) - (-30.72)).abs() < 1e-4);
    }

    #[test]
    fn divided_rail_full_scale() {
        // 4095 cancels the divisor exactly: (20.48 - 10.24) * 3.
        assert!((scale_divided_rail(4095) - 30.72).abs() < 1e-4);
    }

    #[test]
    fn direct_rail_zero_and_full_scale() {
        assert!((scale_direct_rail(0) - (-10.24)).abs() < 1e-4);
        assert!((scale_direct_rail(4095) - 10.24).abs() < 1e-4);
    }

    #[test]
    fn divided_rail_is_three_times_direct() {
        for raw in [0u16, 1024, 2048, 4095] {
            let ratio_err = scale_divided_rail(raw) - 3.0 * scale_direct_rail(raw);
            assert!(ratio_err.abs() < 1e-4);
        }
    }
}
