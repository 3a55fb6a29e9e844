//! Slot opening: detached Ed25519 signature, then NaCl secretbox
//! (`XSalsa20-Poly1305`, tag in front of the ciphertext)
//!
//! The nonce is never carried in the slot. Both sides derive it from the
//! sequence number (see [`crate::encode_seqno`]).

use std::fmt;

use crypto_secretbox::{
    XSalsa20Poly1305,
    aead::{Aead, KeyInit},
};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::CryptoError;

/// Detached Ed25519 signature size (64 bytes)
pub const SIGNATURE_LEN: usize = 64;

/// Ed25519 verify key size (32 bytes)
pub const VERIFY_KEY_LEN: usize = 32;

/// Precomputed shared secret size (32 bytes)
pub const SHARED_SECRET_LEN: usize = 32;

/// `XSalsa20` nonce size (24 bytes)
pub const NONCE_LEN: usize = 24;

/// Poly1305 tag size (16 bytes), stored before the ciphertext
pub const TAG_LEN: usize = 16;

/// Bytes of every slot not available to plaintext.
pub const SLOT_OVERHEAD: usize = SIGNATURE_LEN + TAG_LEN;

/// Symmetric key shared out-of-band between publisher and subscriber.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedSecret([u8; SHARED_SECRET_LEN]);

impl SharedSecret {
    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; SHARED_SECRET_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; SHARED_SECRET_LEN] {
        &self.0
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(..)")
    }
}

impl Drop for SharedSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Parse a publisher's verify key.
///
/// # Errors
///
/// - `InvalidVerifyKey`: bytes do not decode to an Ed25519 point
pub fn parse_verify_key(bytes: &[u8; VERIFY_KEY_LEN]) -> Result<VerifyingKey, CryptoError> {
    VerifyingKey::from_bytes(bytes).map_err(|_| CryptoError::InvalidVerifyKey)
}

/// Largest plaintext a slot of `slot_size` bytes can carry.
pub fn max_plaintext_len(slot_size: usize) -> usize {
    slot_size.saturating_sub(SLOT_OVERHEAD)
}

/// Verify and decrypt one slot.
///
/// The trailing [`SIGNATURE_LEN`] bytes are a signature over everything before
/// them. Only if it verifies is the signed region decrypted.
///
/// # Errors
///
/// - `InvalidCiphertext`: shorter than a signature; no crypto is attempted
/// - `InvalidSignature`: signature does not verify under `verify_key`
/// - `DecryptionFailed`: authentication tag rejects the signed region
pub fn open_slot(
    slot: &[u8],
    nonce: &[u8; NONCE_LEN],
    shared_secret: &SharedSecret,
    verify_key: &VerifyingKey,
) -> Result<Vec<u8>, CryptoError> {
    if slot.len() < SIGNATURE_LEN {
        return Err(CryptoError::InvalidCiphertext { len: slot.len(), min: SIGNATURE_LEN });
    }

    let (message, signature_bytes) = slot.split_at(slot.len() - SIGNATURE_LEN);
    let Ok(signature_bytes) = <[u8; SIGNATURE_LEN]>::try_from(signature_bytes) else {
        return Err(CryptoError::InvalidCiphertext { len: slot.len(), min: SIGNATURE_LEN });
    };
    let signature = Signature::from_bytes(&signature_bytes);

    verify_key.verify(message, &signature).map_err(|_| CryptoError::InvalidSignature)?;

    let cipher = XSalsa20Poly1305::new(shared_secret.as_bytes().into());
    cipher.decrypt(nonce.into(), message).map_err(|_| CryptoError::DecryptionFailed)
}

/// Encrypt and sign `plaintext` into exactly one slot.
///
/// Inverse of [`open_slot`]. Only simulated publishers use this.
///
/// # Errors
///
/// - `SlotSizeMismatch`: `plaintext.len() + SLOT_OVERHEAD != slot_size`
#[cfg(any(test, feature = "test-utils"))]
pub fn seal_slot(
    plaintext: &[u8],
    slot_size: usize,
    nonce: &[u8; NONCE_LEN],
    shared_secret: &SharedSecret,
    signing_key: &ed25519_dalek::SigningKey,
) -> Result<Vec<u8>, CryptoError> {
    use ed25519_dalek::Signer;

    if plaintext.len() + SLOT_OVERHEAD != slot_size {
        return Err(CryptoError::SlotSizeMismatch { plaintext_len: plaintext.len(), slot_size });
    }

    let cipher = XSalsa20Poly1305::new(shared_secret.as_bytes().into());
    let Ok(mut slot) = cipher.encrypt(nonce.into(), plaintext) else {
        unreachable!("secretbox encryption cannot fail with valid inputs");
    };

    let signature = signing_key.sign(&slot);
    slot.extend_from_slice(&signature.to_bytes());

    debug_assert_eq!(slot.len(), slot_size);
    Ok(slot)
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::SigningKey;

    use super::*;
    use crate::encoding::encode_seqno;

    const SLOT_SIZE: usize = 128;

    fn signing_key(fill: u8) -> SigningKey {
        SigningKey::from_bytes(&[fill; 32])
    }

    fn sealed(plaintext: &[u8], seqno: u64) -> Vec<u8> {
        seal_slot(
            plaintext,
            plaintext.len() + SLOT_OVERHEAD,
            &encode_seqno(seqno),
            &SharedSecret::new([7; 32]),
            &signing_key(1),
        )
        .unwrap()
    }

    #[test]
    fn seal_open_roundtrip() {
        let plaintext = [0x42u8; SLOT_SIZE - SLOT_OVERHEAD];
        let slot = sealed(&plaintext, 5);

        let opened = open_slot(
            &slot,
            &encode_seqno(5),
            &SharedSecret::new([7; 32]),
            &signing_key(1).verifying_key(),
        )
        .unwrap();

        assert_eq!(opened, plaintext);
    }

    #[test]
    fn empty_plaintext_roundtrip() {
        let slot = sealed(b"", 0);
        assert_eq!(slot.len(), SLOT_OVERHEAD);

        let opened = open_slot(
            &slot,
            &encode_seqno(0),
            &SharedSecret::new([7; 32]),
            &signing_key(1).verifying_key(),
        )
        .unwrap();
        assert!(opened.is_empty());
    }

    #[test]
    fn secretbox_sealed_slot_opens() {
        let secret = SharedSecret::new([7; 32]);
        let nonce = encode_seqno(0);
        let signer = signing_key(1);

        let cipher = XSalsa20Poly1305::new(secret.as_bytes().into());
        let mut slot = cipher.encrypt((&nonce).into(), &b"hello talek"[..]).unwrap();
        let signature = ed25519_dalek::Signer::sign(&signer, &slot);
        slot.extend_from_slice(&signature.to_bytes());

        let opened = open_slot(&slot, &nonce, &secret, &signer.verifying_key());

        assert_eq!(opened, Ok(b"hello talek".to_vec()));
    }

    #[test]
    fn tag_precedes_ciphertext() {
        let slot = sealed(b"abc", 2);
        let cipher = XSalsa20Poly1305::new(SharedSecret::new([7; 32]).as_bytes().into());
        let region = &slot[..slot.len() - SIGNATURE_LEN];

        let mut detached = region[TAG_LEN..].to_vec();
        let tag =
            crypto_secretbox::aead::generic_array::GenericArray::clone_from_slice(&region[..TAG_LEN]);
        crypto_secretbox::aead::AeadInPlace::decrypt_in_place_detached(
            &cipher,
            (&encode_seqno(2)).into(),
            &[],
            &mut detached,
            &tag,
        )
        .unwrap();

        assert_eq!(detached, b"abc");
    }

    #[test]
    fn short_input_rejected_before_crypto() {
        let result = open_slot(
            &[0u8; SIGNATURE_LEN - 1],
            &encode_seqno(0),
            &SharedSecret::new([7; 32]),
            &signing_key(1).verifying_key(),
        );

        assert_eq!(result, Err(CryptoError::InvalidCiphertext { len: 63, min: 64 }));
    }

    #[test]
    fn wrong_verify_key_is_invalid_signature() {
        let slot = sealed(b"hello", 0);

        let result = open_slot(
            &slot,
            &encode_seqno(0),
            &SharedSecret::new([7; 32]),
            &signing_key(2).verifying_key(),
        );

        assert_eq!(result, Err(CryptoError::InvalidSignature));
    }

    #[test]
    fn wrong_secret_is_decryption_failure() {
        let slot = sealed(b"hello", 0);

        let result = open_slot(
            &slot,
            &encode_seqno(0),
            &SharedSecret::new([8; 32]),
            &signing_key(1).verifying_key(),
        );

        assert_eq!(result, Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn wrong_sequence_number_is_decryption_failure() {
        let slot = sealed(b"hello", 3);

        let result = open_slot(
            &slot,
            &encode_seqno(4),
            &SharedSecret::new([7; 32]),
            &signing_key(1).verifying_key(),
        );

        assert_eq!(result, Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn every_single_bit_flip_is_rejected() {
        let slot = sealed(b"tamper-evident payload", 9);
        let secret = SharedSecret::new([7; 32]);
        let verify_key = signing_key(1).verifying_key();

        for byte in 0..slot.len() {
            for bit in 0..8 {
                let mut tampered = slot.clone();
                tampered[byte] ^= 1 << bit;

                let result = open_slot(&tampered, &encode_seqno(9), &secret, &verify_key);
                assert!(result.is_err(), "flip of byte {byte} bit {bit} was accepted");
            }
        }
    }

    #[test]
    fn seal_rejects_mismatched_plaintext() {
        let result = seal_slot(
            &[0u8; 10],
            SLOT_SIZE,
            &encode_seqno(0),
            &SharedSecret::new([7; 32]),
            &signing_key(1),
        );

        assert!(matches!(result, Err(CryptoError::SlotSizeMismatch { plaintext_len: 10, .. })));
    }

    #[test]
    fn max_plaintext_len_saturates() {
        assert_eq!(max_plaintext_len(SLOT_SIZE), SLOT_SIZE - SLOT_OVERHEAD);
        assert_eq!(max_plaintext_len(10), 0);
    }

    #[test]
    fn valid_verify_key_parses() {
        let key = signing_key(3).verifying_key();
        assert_eq!(parse_verify_key(key.as_bytes()), Ok(key));
    }

    #[test]
    fn debug_hides_secret() {
        assert_eq!(format!("{:?}", SharedSecret::new([1; 32])), "SharedSecret(..)");
    }
}
