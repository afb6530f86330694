//! Formatting helpers shared by the CLI and log output.

/// Format bytes as space-separated uppercase hex, e.g. `"FF 0A FF"`.
///
/// This is the format used throughout the session log for command and
/// frame dumps.
///
/// # Example
///
/// ```
/// use railscope_core::format_hex;
///
/// assert_eq!(format_hex(&[0xFF, 0x0A, 0xFF]), "FF 0A FF");
/// assert_eq!(format_hex(&[0x47, 0x01, 0x46]), "47 01 46");
/// assert_eq!(format_hex(&[]), "");
/// ```
pub fn format_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format a rail voltage for display, signed with millivolt precision.
///
/// # Example
///
/// ```
/// use railscope_core::format_volts;
///
/// assert_eq!(format_volts(30.72), "+30.720 V");
/// assert_eq!(format_volts(-10.24), "-10.240 V");
/// ```
pub fn format_volts(volts: f32) -> String {
    format!("{volts:+.3} V")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_hex_commands() {
        assert_eq!(format_hex(&[0xFF, 0x0A, 0xFF]), "FF 0A FF");
        assert_eq!(format_hex(&[0x47, 0x01, 0x46]), "47 01 46");
    }

    #[test]
    fn format_hex_pads_low_bytes() {
        assert_eq!(format_hex(&[0x00, 0x01, 0xA0]), "00 01 A0");
    }

    #[test]
    fn format_hex_single_and_empty() {
        assert_eq!(format_hex(&[0x54]), "54");
        assert_eq!(format_hex(&[]), "");
    }

    #[test]
    fn format_volts_signed() {
        assert_eq!(format_volts(30.72), "+30.720 V");
        assert_eq!(format_volts(-30.72), "-30.720 V");
        assert_eq!(format_volts(0.0), "+0.000 V");
    }
}
