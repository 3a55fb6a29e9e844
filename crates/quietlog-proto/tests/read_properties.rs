//! Property-based tests for read records
//!
//! 1. **Recombination**: splitting a one-bit vector into random XOR shares
//!    always recombines to the same bucket
//! 2. **Encoding**: CBOR encoding preserves every field

use proptest::prelude::*;
use quietlog_proto::{PirArgs, ReadArgs, ReadReply, bucket_bit_is_set, request_vector_len};

fn split_into_shares(bucket: u64, num_buckets: u64, noise: &[Vec<u8>]) -> ReadArgs {
    let len = request_vector_len(num_buckets).unwrap();
    let mut leader = vec![0u8; len];
    leader[(bucket / 8) as usize] |= 1 << (bucket % 8);

    let mut td = Vec::with_capacity(noise.len() + 1);
    for vector in noise {
        let vector: Vec<u8> = vector.iter().copied().cycle().take(len).collect();
        for (acc, byte) in leader.iter_mut().zip(&vector) {
            *acc ^= byte;
        }
        td.push(PirArgs { request_vector: vector, pad_seed: vec![0; 24] });
    }
    td.insert(0, PirArgs { request_vector: leader, pad_seed: vec![0; 24] });

    ReadArgs { td }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_shares_recombine_to_bucket(
        num_buckets in 1u64..4096,
        bucket_seed in any::<u64>(),
        noise in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..16), 0..5),
    ) {
        let bucket = bucket_seed % num_buckets;
        let args = split_into_shares(bucket, num_buckets, &noise);

        let combined = args.combined_vector().unwrap();
        prop_assert!(bucket_bit_is_set(&combined, bucket));
        prop_assert_eq!(args.bucket(), Some(bucket));
    }

    #[test]
    fn prop_reply_cbor_preserves_data(data in prop::collection::vec(any::<u8>(), 0..2048)) {
        let reply = ReadReply::new(data);
        let decoded = ReadReply::from_cbor(&reply.to_cbor().unwrap()).unwrap();
        prop_assert_eq!(decoded, reply);
    }
}

#[test]
fn fixed_vector_for_four_buckets() {
    let args = ReadArgs {
        td: vec![
            PirArgs { request_vector: hex::decode("a5").unwrap(), pad_seed: Vec::new() },
            PirArgs { request_vector: hex::decode("a1").unwrap(), pad_seed: Vec::new() },
        ],
    };

    assert_eq!(args.combined_vector(), Some(vec![0b0000_0100]));
    assert_eq!(args.bucket(), Some(2));
}
