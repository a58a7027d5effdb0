//! Bit-level framing shared by the encoder and decoder.
//!
//! A frame carries no length field and no terminator; the receiver infers
//! the end from silence or an unclassifiable sample, then accepts the bit
//! buffer only if it divides evenly into bytes.

/// Printable ASCII range kept during reassembly (inclusive). Bytes
/// outside it are dropped individually, not the whole frame.
pub const TEXT_RANGE: (u8, u8) = (32, 126);

/// Expand a message into its transmitted bit sequence, MSB first.
///
/// Each character contributes the low 8 bits of its code point. The
/// protocol is defined for 7-bit ASCII; what a receiver makes of a
/// truncated multi-byte character is undefined.
pub fn message_bits(text: &str) -> Vec<bool> {
    let mut bits = Vec::with_capacity(text.chars().count() * 8);
    for ch in text.chars() {
        let code = (ch as u32 & 0xFF) as u8;
        for shift in (0..8).rev() {
            bits.push((code >> shift) & 1 == 1);
        }
    }
    bits
}

/// Reassemble a received bit buffer into text.
///
/// Returns `None` unless the buffer holds a positive multiple of 8 bits;
/// a malformed frame is rejected whole, never emitted as partial bytes.
/// The surviving string may still be empty if every byte fell outside
/// [`TEXT_RANGE`].
pub fn assemble_text(bits: &[bool]) -> Option<String> {
    if bits.is_empty() || bits.len() % 8 != 0 {
        return None;
    }

    let mut text = String::with_capacity(bits.len() / 8);
    for chunk in bits.chunks(8) {
        let mut byte = 0u8;
        for (i, &bit) in chunk.iter().enumerate() {
            if bit {
                byte |= 1 << (7 - i);
            }
        }
        if (TEXT_RANGE.0..=TEXT_RANGE.1).contains(&byte) {
            text.push(byte as char);
        }
    }
    Some(text)
}
