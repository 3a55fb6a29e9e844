//! Padding seeds and the SipHash output-feedback generator
//!
//! Trust domains pad their responses with a stream derived from a seed chosen
//! by the subscriber. The subscriber removes the pad by XORing the same stream
//! back in. Both sides MUST use [`overlay`], since any divergence in the stream
//! corrupts the whole reply.
//!
//! # Security Properties
//!
//! - Determinism: same seed always produces the same stream
//! - Independence: distinct seeds produce unrelated streams
//! - Hygiene: seed bytes are zeroized on drop

use std::{fmt, hash::Hasher};

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use siphasher::sip::SipHasher24;
use zeroize::Zeroize;

use crate::error::CryptoError;

/// Seed length: 16-byte SipHash key followed by an 8-byte initial block.
pub const SEED_LEN: usize = 24;

/// Width of one generator output block.
const BLOCK_LEN: usize = 8;

/// Secret seed for the pad generator and for bucket selection.
///
/// Layout: `[k0: 8 LE][k1: 8 LE][initial block: 8]`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seed([u8; SEED_LEN]);

impl Seed {
    /// Draw a fresh seed from a cryptographically secure RNG.
    ///
    /// # Errors
    ///
    /// - `Entropy`: the RNG reported a failure; nothing was generated
    pub fn generate<R: RngCore + CryptoRng + ?Sized>(rng: &mut R) -> Result<Self, CryptoError> {
        let mut bytes = [0u8; SEED_LEN];
        rng.try_fill_bytes(&mut bytes)
            .map_err(|e| CryptoError::Entropy { reason: e.to_string() })?;
        Ok(Self(bytes))
    }

    /// Parse a seed received as opaque bytes.
    ///
    /// # Errors
    ///
    /// - `InvalidSeedLength`: input is not exactly [`SEED_LEN`] bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != SEED_LEN {
            return Err(CryptoError::InvalidSeedLength { expected: SEED_LEN, actual: bytes.len() });
        }

        let mut seed = [0u8; SEED_LEN];
        seed.copy_from_slice(bytes);
        Ok(Self(seed))
    }

    /// Raw seed bytes.
    pub fn as_bytes(&self) -> &[u8; SEED_LEN] {
        &self.0
    }

    /// The 128-bit SipHash key pair `(k0, k1)` encoded in this seed.
    pub fn key_u128(&self) -> (u64, u64) {
        let mut k0 = [0u8; 8];
        let mut k1 = [0u8; 8];
        k0.copy_from_slice(&self.0[..8]);
        k1.copy_from_slice(&self.0[8..16]);
        (u64::from_le_bytes(k0), u64::from_le_bytes(k1))
    }

    fn initial_block(&self) -> [u8; BLOCK_LEN] {
        let mut block = [0u8; BLOCK_LEN];
        block.copy_from_slice(&self.0[16..]);
        block
    }
}

impl From<[u8; SEED_LEN]> for Seed {
    fn from(bytes: [u8; SEED_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed(..)")
    }
}

impl Drop for Seed {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// SipHash-2-4 in output-feedback mode.
///
/// Each step hashes the previous block under the seed's key:
/// `block[i + 1] = SipHash(k0, k1, block[i])`, emitting the 8 little-endian
/// bytes of every new block.
pub struct HashDrbg {
    k0: u64,
    k1: u64,
    /// Most recent output block (feedback register)
    block: [u8; BLOCK_LEN],
    /// Bytes of `block` already handed out
    used: usize,
}

impl HashDrbg {
    /// Create a generator positioned at the start of `seed`'s stream.
    pub fn new(seed: &Seed) -> Self {
        let (k0, k1) = seed.key_u128();
        Self { k0, k1, block: seed.initial_block(), used: BLOCK_LEN }
    }

    /// Fill `out` with the next bytes of the stream.
    pub fn fill_bytes(&mut self, out: &mut [u8]) {
        for byte in out.iter_mut() {
            *byte = self.next_byte();
        }
    }

    /// XOR the next `data.len()` stream bytes into `data`.
    pub fn xor_keystream(&mut self, data: &mut [u8]) {
        for byte in data.iter_mut() {
            *byte ^= self.next_byte();
        }
    }

    fn next_byte(&mut self) -> u8 {
        if self.used == BLOCK_LEN {
            self.advance();
        }
        let byte = self.block[self.used];
        self.used += 1;
        byte
    }

    fn advance(&mut self) {
        let mut sip = SipHasher24::new_with_keys(self.k0, self.k1);
        sip.write(&self.block);
        self.block = sip.finish().to_le_bytes();
        self.used = 0;
    }
}

impl Drop for HashDrbg {
    fn drop(&mut self) {
        self.k0.zeroize();
        self.k1.zeroize();
        self.block.zeroize();
    }
}

/// XOR the pad stream for `seed` over the whole of `data`, in place.
///
/// Applying the same seed twice restores the original buffer.
///
/// # Errors
///
/// - `InvalidSeedLength`: `seed` is malformed; `data` is left untouched
pub fn overlay(seed: &[u8], data: &mut [u8]) -> Result<(), CryptoError> {
    let seed = Seed::from_bytes(seed)?;
    HashDrbg::new(&seed).xor_keystream(data);
    Ok(())
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;

    fn test_seed(fill: u8) -> Seed {
        let mut bytes = [0u8; SEED_LEN];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = fill.wrapping_add(i as u8);
        }
        Seed::from(bytes)
    }

    #[test]
    fn stream_is_deterministic() {
        let seed = test_seed(1);
        let mut a = [0u8; 100];
        let mut b = [0u8; 100];

        HashDrbg::new(&seed).fill_bytes(&mut a);
        HashDrbg::new(&seed).fill_bytes(&mut b);

        assert_eq!(a, b);
    }

    #[test]
    fn stream_is_continuous_across_calls() {
        let seed = test_seed(7);
        let mut whole = [0u8; 29];
        HashDrbg::new(&seed).fill_bytes(&mut whole);

        let mut drbg = HashDrbg::new(&seed);
        let mut head = [0u8; 3];
        let mut tail = [0u8; 26];
        drbg.fill_bytes(&mut head);
        drbg.fill_bytes(&mut tail);

        assert_eq!(&whole[..3], &head);
        assert_eq!(&whole[3..], &tail);
    }

    #[test]
    fn different_seeds_produce_different_streams() {
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];

        HashDrbg::new(&test_seed(1)).fill_bytes(&mut a);
        HashDrbg::new(&test_seed(2)).fill_bytes(&mut b);

        assert_ne!(a, b);
    }

    #[test]
    fn first_block_is_siphash_of_initial_block() {
        let seed = test_seed(0);
        let (k0, k1) = seed.key_u128();
        let mut sip = SipHasher24::new_with_keys(k0, k1);
        sip.write(&seed.as_bytes()[16..]);
        let expected = sip.finish().to_le_bytes();

        let mut out = [0u8; 8];
        HashDrbg::new(&seed).fill_bytes(&mut out);

        assert_eq!(out, expected);
    }

    #[test]
    fn overlay_twice_restores_buffer() {
        let seed = test_seed(9);
        let original: Vec<u8> = (0..=255).collect();
        let mut data = original.clone();

        overlay(seed.as_bytes(), &mut data).unwrap();
        assert_ne!(data, original);

        overlay(seed.as_bytes(), &mut data).unwrap();
        assert_eq!(data, original);
    }

    #[test]
    fn overlays_commute() {
        let a = test_seed(3);
        let b = test_seed(4);
        let mut ab = vec![0x5Au8; 77];
        let mut ba = ab.clone();

        overlay(a.as_bytes(), &mut ab).unwrap();
        overlay(b.as_bytes(), &mut ab).unwrap();
        overlay(b.as_bytes(), &mut ba).unwrap();
        overlay(a.as_bytes(), &mut ba).unwrap();

        assert_eq!(ab, ba);
    }

    #[test]
    fn malformed_seed_leaves_buffer_untouched() {
        let mut data = vec![0xAAu8; 40];

        let result = overlay(&[0u8; 23], &mut data);

        assert_eq!(result, Err(CryptoError::InvalidSeedLength { expected: 24, actual: 23 }));
        assert!(data.iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn overlay_on_empty_buffer_is_noop() {
        let mut data: Vec<u8> = Vec::new();
        overlay(test_seed(0).as_bytes(), &mut data).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn key_u128_is_little_endian() {
        let seed = Seed::from_bytes(
            &hex::decode("0100000000000000020000000000000000000000000000ff").unwrap(),
        )
        .unwrap();
        assert_eq!(seed.key_u128(), (1, 2));
    }

    #[test]
    fn generated_seeds_differ() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let a = Seed::generate(&mut rng).unwrap();
        let b = Seed::generate(&mut rng).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn debug_hides_seed_bytes() {
        assert_eq!(format!("{:?}", test_seed(0xAB)), "Seed(..)");
    }
}
