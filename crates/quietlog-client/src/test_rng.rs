//! Generator that runs dry after a fixed number of bytes.

use std::num::NonZeroU32;

use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Serves `budget` bytes from a seeded ChaCha20 stream, then fails every draw.
pub(crate) struct ExhaustibleRng {
    inner: ChaCha20Rng,
    budget: usize,
}

impl ExhaustibleRng {
    pub(crate) fn new(budget: usize) -> Self {
        Self { inner: ChaCha20Rng::seed_from_u64(0xdead), budget }
    }

    fn exhausted() -> rand::Error {
        let code = NonZeroU32::new(rand::Error::CUSTOM_START).unwrap();
        rand::Error::from(code)
    }
}

impl RngCore for ExhaustibleRng {
    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        self.fill_bytes(&mut buf);
        u32::from_le_bytes(buf)
    }

    fn next_u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        self.fill_bytes(&mut buf);
        u64::from_le_bytes(buf)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.try_fill_bytes(dest).unwrap();
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        if dest.len() > self.budget {
            self.budget = 0;
            return Err(Self::exhausted());
        }
        self.budget -= dest.len();
        self.inner.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for ExhaustibleRng {}
