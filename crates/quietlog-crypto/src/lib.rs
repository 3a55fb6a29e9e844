//! Quietlog Cryptographic Primitives
//!
//! Cryptographic building blocks for quietlog subscribers. Pure functions with
//! deterministic outputs. Randomness is always injected by the caller.
//!
//! # Position Agreement
//!
//! Publisher and subscriber never exchange log positions. Both derive them
//! from a pair of secret seeds and the subscriber's sequence number:
//!
//! ```text
//! sequence number
//!        │
//!        ▼ varint, zero-padded to 24 bytes
//! encoded sequence ──────────────┐
//!        │                       │
//!        ▼ SipHash-2-4 (seed A)  ▼ SipHash-2-4 (seed B)
//! bucket 1 = h_a mod n      bucket 2 = h_b mod n
//! ```
//!
//! The same encoded sequence doubles as the secretbox nonce, so messages must be
//! consumed in order without gaps.
//!
//! # Slot Layout
//!
//! ```text
//! ┌────────────┬───────────────────────────────┬──────────────────┐
//! │ Poly1305   │ XSalsa20 ciphertext           │ Ed25519 signature│
//! │ tag (16)   │ (slot_size - 80 bytes)        │ (64)             │
//! └────────────┴───────────────────────────────┴──────────────────┘
//! ```
//!
//! # Security
//!
//! Authenticity:
//! - Signature is checked before any decryption is attempted
//! - Poly1305 tag rejects any tampering with the signed region
//!
//! Unlinkability:
//! - Bucket indices look uniform to anyone without the seeds
//! - Padding seeds are independent per trust domain
//!
//! Key Hygiene:
//! - Seeds and shared secrets are zeroized on drop
//! - Debug output never prints key material

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod bucket;
pub mod drbg;
pub mod encoding;
pub mod envelope;
pub mod error;

pub use bucket::{keyed_hash, next_buckets};
pub use drbg::{HashDrbg, SEED_LEN, Seed, overlay};
pub use encoding::{SEQNO_ENCODED_LEN, encode_seqno};
#[cfg(any(test, feature = "test-utils"))]
pub use envelope::seal_slot;
pub use envelope::{
    NONCE_LEN, SHARED_SECRET_LEN, SIGNATURE_LEN, SLOT_OVERHEAD, SharedSecret, TAG_LEN,
    VERIFY_KEY_LEN, max_plaintext_len, open_slot, parse_verify_key,
};
pub use error::CryptoError;
