//! Reply processing: strip trust domain pads, then search the bucket slots.
//!
//! A combined reply is the XOR of every trust domain's padded response. Once
//! all pads are removed, the buffer holds the contents of the one queried
//! bucket, laid out as fixed-size slots.

use ed25519_dalek::VerifyingKey;
use quietlog_crypto::{CryptoError, SharedSecret, encode_seqno, open_slot, overlay};
use quietlog_proto::ReadArgs;

/// Remove every trust domain's pad from `data`, in trust domain order.
///
/// # Errors
///
/// - `InvalidSeedLength`: a share carries a malformed seed. `data` may already
///   be partially unmasked and MUST be discarded.
pub fn unmask(args: &ReadArgs, data: &mut [u8]) -> Result<(), CryptoError> {
    for seed in args.pad_seeds() {
        overlay(seed, data)?;
    }
    Ok(())
}

/// Find the first slot that verifies and decrypts as message `seqno`.
///
/// `data` is split into whole slots of `slot_size` bytes. A trailing partial
/// slot is ignored. Slots that fail verification are skipped; a slot size of
/// zero or one larger than `data` yields `None`.
pub fn scan(
    data: &[u8],
    slot_size: usize,
    seqno: u64,
    shared_secret: &SharedSecret,
    verify_key: &VerifyingKey,
) -> Option<Vec<u8>> {
    if slot_size == 0 || slot_size > data.len() {
        tracing::trace!(slot_size, data_len = data.len(), "Reply holds no whole slot");
        return None;
    }

    let nonce = encode_seqno(seqno);

    for (index, slot) in data.chunks_exact(slot_size).enumerate() {
        match open_slot(slot, &nonce, shared_secret, verify_key) {
            Ok(plaintext) => {
                tracing::trace!(seqno, slot = index, len = plaintext.len(), "Slot opened");
                return Some(plaintext);
            },
            Err(e) => {
                tracing::trace!(
                    seqno,
                    slot = index,
                    prefix = ?&slot[..slot.len().min(8)],
                    reason = %e,
                    "Slot did not open"
                );
            },
        }
    }

    None
}
