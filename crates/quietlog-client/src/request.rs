//! Secret-shared request construction
//!
//! A read for bucket `b` across `N` trust domains is an (N, N) XOR sharing of
//! the one-bit indicator vector for `b`:
//!
//! ```text
//! share[1..N]  = uniform random vectors
//! share[0]     = indicator(b) ^ share[1] ^ ... ^ share[N-1]
//! XOR(all)     = indicator(b)
//! ```
//!
//! Any proper subset of shares is uniformly distributed, so no trust domain
//! acting alone learns `b`.

use std::num::NonZeroU64;

use quietlog_crypto::Seed;
use quietlog_proto::{PirArgs, ReadArgs, request_vector_len};
use rand::{CryptoRng, RngCore};

use crate::error::HandleError;

/// Build one share per trust domain for reading `bucket`.
///
/// Every share carries an independent random pad seed.
///
/// # Errors
///
/// - `InvalidConfig`: `bucket >= num_buckets`, zero trust domains, or a
///   request vector that cannot be allocated
/// - `Entropy`: the RNG failed; no partial query is returned
pub fn build_read_args<R: RngCore + CryptoRng + ?Sized>(
    bucket: u64,
    num_buckets: NonZeroU64,
    num_trust_domains: usize,
    rng: &mut R,
) -> Result<ReadArgs, HandleError> {
    if num_trust_domains == 0 {
        return Err(HandleError::InvalidConfig {
            reason: "at least one trust domain is required".to_string(),
        });
    }
    if bucket >= num_buckets.get() {
        return Err(HandleError::InvalidConfig {
            reason: format!("bucket {bucket} out of range for {num_buckets} buckets"),
        });
    }
    let Some(vector_len) = request_vector_len(num_buckets.get()) else {
        return Err(HandleError::InvalidConfig {
            reason: format!("request vector for {num_buckets} buckets is too large"),
        });
    };

    let mut leader = PirArgs { request_vector: vec![0u8; vector_len], pad_seed: Vec::new() };
    leader.request_vector[(bucket / 8) as usize] |= 1 << (bucket % 8);
    leader.pad_seed = random_pad_seed(rng)?;

    let mut td = Vec::with_capacity(num_trust_domains);
    td.push(leader);

    for _ in 1..num_trust_domains {
        let mut request_vector = vec![0u8; vector_len];
        rng.try_fill_bytes(&mut request_vector)
            .map_err(|e| HandleError::Entropy { reason: e.to_string() })?;
        let pad_seed = random_pad_seed(rng)?;

        for (acc, byte) in td[0].request_vector.iter_mut().zip(&request_vector) {
            *acc ^= byte;
        }

        td.push(PirArgs { request_vector, pad_seed });
    }

    debug_assert_eq!(td.len(), num_trust_domains);
    Ok(ReadArgs { td })
}

fn random_pad_seed<R: RngCore + CryptoRng + ?Sized>(rng: &mut R) -> Result<Vec<u8>, HandleError> {
    let seed = Seed::generate(rng).map_err(HandleError::from_seed_draw)?;
    Ok(seed.as_bytes().to_vec())
}
