//! Fixed-width sequence number encoding
//!
//! Shared by bucket derivation and nonce derivation. Both sides must produce
//! identical bytes or they will disagree on positions and keys.

/// Width of an encoded sequence number. Also the secretbox nonce width.
pub const SEQNO_ENCODED_LEN: usize = 24;

/// Encode `seqno` as an unsigned LEB128 varint at the start of a zero-filled
/// 24-byte buffer.
///
/// A `u64` needs at most 10 varint bytes, so the remaining bytes are always
/// zero.
pub fn encode_seqno(seqno: u64) -> [u8; SEQNO_ENCODED_LEN] {
    let mut out = [0u8; SEQNO_ENCODED_LEN];
    let mut value = seqno;
    let mut i = 0;

    while value >= 0x80 {
        out[i] = (value as u8) | 0x80;
        value >>= 7;
        i += 1;
    }
    out[i] = value as u8;

    out
}
