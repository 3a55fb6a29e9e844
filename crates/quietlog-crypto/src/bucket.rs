//! Keyed bucket selection
//!
//! Publisher and subscriber compute the same two candidate buckets for every
//! sequence number. Two independent keys give the publisher a second placement
//! option when the first bucket is crowded.

use std::{hash::Hasher, num::NonZeroU64};

use siphasher::sip::SipHasher24;

use crate::{drbg::Seed, encoding::encode_seqno};

/// SipHash-2-4 of `data` under `seed`'s 128-bit key.
pub fn keyed_hash(seed: &Seed, data: &[u8]) -> u64 {
    let (k0, k1) = seed.key_u128();
    let mut sip = SipHasher24::new_with_keys(k0, k1);
    sip.write(data);
    sip.finish()
}

/// The two candidate buckets for `seqno`.
///
/// Deterministic: identical seeds, sequence number and bucket count always
/// yield the identical pair. Both values are `< num_buckets`.
pub fn next_buckets(
    seed_a: &Seed,
    seed_b: &Seed,
    seqno: u64,
    num_buckets: NonZeroU64,
) -> (u64, u64) {
    let encoded = encode_seqno(seqno);

    let bucket_a = keyed_hash(seed_a, &encoded) % num_buckets;
    let bucket_b = keyed_hash(seed_b, &encoded) % num_buckets;

    (bucket_a, bucket_b)
}
