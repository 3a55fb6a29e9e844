//! Error types for quietlog cryptographic operations

use thiserror::Error;

/// Errors from seed handling, slot opening and slot sealing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Input is too short to hold a detached signature
    #[error("invalid ciphertext: {len} bytes, need at least {min}")]
    InvalidCiphertext {
        /// Length of the rejected input
        len: usize,
        /// Minimum acceptable length
        min: usize,
    },

    /// Detached signature does not verify under the publisher's key
    #[error("invalid signature")]
    InvalidSignature,

    /// Authenticated decryption failed (wrong key, wrong nonce, or tamper)
    #[error("decryption failed")]
    DecryptionFailed,

    /// Padding seed has the wrong length
    #[error("invalid seed length: expected {expected}, got {actual}")]
    InvalidSeedLength {
        /// Expected seed length
        expected: usize,
        /// Actual seed length
        actual: usize,
    },

    /// Verify key bytes are not a valid Ed25519 point
    #[error("invalid verify key")]
    InvalidVerifyKey,

    /// Plaintext does not fill a slot exactly
    #[error("slot size mismatch: plaintext of {plaintext_len} bytes cannot fill a {slot_size}-byte slot")]
    SlotSizeMismatch {
        /// Length of the plaintext to seal
        plaintext_len: usize,
        /// Target slot size
        slot_size: usize,
    },

    /// Randomness source failed while generating key material
    #[error("entropy source failed: {reason}")]
    Entropy {
        /// Underlying RNG error
        reason: String,
    },
}

impl CryptoError {
    /// Returns true for mismatches that are expected while scanning a bucket.
    ///
    /// Noise slots and other subscribers' slots fail with these. They mean "not
    /// ours" and are never surfaced as failures. Everything else indicates a
    /// malformed input or a broken environment.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::InvalidSignature | Self::DecryptionFailed | Self::InvalidSeedLength { .. } => {
                true
            },

            Self::InvalidCiphertext { .. }
            | Self::InvalidVerifyKey
            | Self::SlotSizeMismatch { .. }
            | Self::Entropy { .. } => false,
        }
    }
}
