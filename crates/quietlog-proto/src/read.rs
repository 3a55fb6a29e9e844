//! Read records: per-server query shares and the combined reply.

use serde::{Deserialize, Serialize};

use crate::errors::{ProtocolError, Result};

/// One trust domain's share of a private read.
///
/// Individually the request vector is indistinguishable from random bits. Only
/// the XOR of every share in a [`ReadArgs`] reveals the queried bucket.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PirArgs {
    /// Packed request bits, one per bucket (low-bit-first).
    pub request_vector: Vec<u8>,

    /// Seed the trust domain uses to pad its response.
    ///
    /// Opaque on the wire. The subscriber keeps the same bytes to remove the
    /// padding again.
    pub pad_seed: Vec<u8>,
}

impl PirArgs {
    /// Encode as CBOR.
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        encode_cbor(self)
    }

    /// Decode from CBOR.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        decode_cbor(bytes)
    }
}

/// All trust domain shares for reading a single bucket.
///
/// # Invariants
///
/// - `td[i]` is always sent to the i-th configured trust domain. The order is
///   reused when removing padding from the reply.
/// - Every request vector has the same length.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReadArgs {
    /// Shares in trust domain order.
    pub td: Vec<PirArgs>,
}

impl ReadArgs {
    /// Number of trust domains this read is split across.
    pub fn num_trust_domains(&self) -> usize {
        self.td.len()
    }

    /// Pad seeds in trust domain order.
    pub fn pad_seeds(&self) -> impl Iterator<Item = &[u8]> {
        self.td.iter().map(|args| args.pad_seed.as_slice())
    }

    /// XOR of every share's request vector.
    ///
    /// `None` if there are no shares or the vectors disagree on length.
    pub fn combined_vector(&self) -> Option<Vec<u8>> {
        let (first, rest) = self.td.split_first()?;
        let mut combined = first.request_vector.clone();

        for share in rest {
            if share.request_vector.len() != combined.len() {
                return None;
            }
            for (acc, byte) in combined.iter_mut().zip(&share.request_vector) {
                *acc ^= byte;
            }
        }

        Some(combined)
    }

    /// Bucket this read targets, recovered by recombining every share.
    ///
    /// Only meaningful on the subscriber side, which holds all shares. Returns
    /// `None` unless exactly one bit is set in the combined vector.
    pub fn bucket(&self) -> Option<u64> {
        let combined = self.combined_vector()?;
        let total_bits: u32 = combined.iter().map(|byte| byte.count_ones()).sum();
        if total_bits != 1 {
            return None;
        }

        combined
            .iter()
            .enumerate()
            .find(|(_, byte)| **byte != 0)
            .map(|(index, byte)| index as u64 * 8 + u64::from(byte.trailing_zeros()))
    }

    /// Encode as CBOR.
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        encode_cbor(self)
    }

    /// Decode from CBOR.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        decode_cbor(bytes)
    }
}

/// Combined bucket contents returned for a [`ReadArgs`].
///
/// The buffer is a concatenation of fixed-size slots. The slot size is agreed
/// out-of-band and is not carried here.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReadReply {
    /// Bucket contents, still masked by every trust domain's padding.
    pub data: Vec<u8>,
}

impl ReadReply {
    /// Wrap raw reply bytes.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Encode as CBOR.
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        encode_cbor(self)
    }

    /// Decode from CBOR.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        decode_cbor(bytes)
    }
}

/// Request vector length in bytes for `num_buckets` buckets.
///
/// `None` if the length does not fit in `usize`.
pub fn request_vector_len(num_buckets: u64) -> Option<usize> {
    usize::try_from(num_buckets.div_ceil(8)).ok()
}

/// Whether `bucket`'s bit is set in a packed request vector.
///
/// Buckets past the end of the vector read as unset.
pub fn bucket_bit_is_set(vector: &[u8], bucket: u64) -> bool {
    let Ok(byte_index) = usize::try_from(bucket / 8) else {
        return false;
    };
    vector.get(byte_index).is_some_and(|byte| byte & (1 << (bucket % 8)) != 0)
}

/// Buckets below `num_buckets` whose bit is set in `vector`, ascending.
pub fn selected_buckets(vector: &[u8], num_buckets: u64) -> impl Iterator<Item = u64> + '_ {
    (0..num_buckets).filter(move |&bucket| bucket_bit_is_set(vector, bucket))
}

fn encode_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(value, &mut buf)
        .map_err(|e| ProtocolError::CborEncode(e.to_string()))?;
    Ok(buf)
}

fn decode_cbor<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T> {
    ciborium::de::from_reader(bytes).map_err(|e| ProtocolError::CborDecode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn share(vector: &[u8]) -> PirArgs {
        PirArgs { request_vector: vector.to_vec(), pad_seed: vec![0; 24] }
    }

    #[test]
    fn vector_len_rounds_up() {
        assert_eq!(request_vector_len(1), Some(1));
        assert_eq!(request_vector_len(8), Some(1));
        assert_eq!(request_vector_len(9), Some(2));
        assert_eq!(request_vector_len(1024), Some(128));
        assert_eq!(request_vector_len(0), Some(0));
    }

    #[test]
    fn bit_layout_is_low_bit_first() {
        let vector = [0b0000_0100, 0b1000_0000];

        assert!(bucket_bit_is_set(&vector, 2));
        assert!(bucket_bit_is_set(&vector, 15));
        assert!(!bucket_bit_is_set(&vector, 0));
        assert!(!bucket_bit_is_set(&vector, 7));
        assert!(!bucket_bit_is_set(&vector, 16));
        assert!(!bucket_bit_is_set(&vector, u64::MAX));
    }

    #[test]
    fn selected_buckets_respects_bucket_count() {
        let vector = [0xFF];
        let selected: Vec<u64> = selected_buckets(&vector, 5).collect();
        assert_eq!(selected, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn combined_vector_xors_every_share() {
        let args = ReadArgs { td: vec![share(&[0b1010_0001]), share(&[0b1010_0101])] };
        assert_eq!(args.combined_vector(), Some(vec![0b0000_0100]));
        assert_eq!(args.bucket(), Some(2));
    }

    #[test]
    fn combined_vector_rejects_mismatched_lengths() {
        let args = ReadArgs { td: vec![share(&[0x01]), share(&[0x01, 0x00])] };
        assert_eq!(args.combined_vector(), None);
        assert_eq!(args.bucket(), None);
    }

    #[test]
    fn bucket_requires_exactly_one_bit() {
        let empty = ReadArgs::default();
        assert_eq!(empty.bucket(), None);

        let none_set = ReadArgs { td: vec![share(&[0x00, 0x00])] };
        assert_eq!(none_set.bucket(), None);

        let two_set = ReadArgs { td: vec![share(&[0x00, 0x11])] };
        assert_eq!(two_set.bucket(), None);

        let high = ReadArgs { td: vec![share(&[0x00, 0x40])] };
        assert_eq!(high.bucket(), Some(14));
    }

    #[test]
    fn read_args_cbor_roundtrip() {
        let args = ReadArgs { td: vec![share(&[1, 2, 3]), share(&[4, 5, 6])] };
        let encoded = args.to_cbor().unwrap();
        assert_eq!(ReadArgs::from_cbor(&encoded).unwrap(), args);
    }

    #[test]
    fn single_share_cbor_roundtrip() {
        let args = share(&[0x80, 0x01]);
        let encoded = args.to_cbor().unwrap();
        assert_eq!(PirArgs::from_cbor(&encoded).unwrap(), args);
    }

    #[test]
    fn truncated_cbor_is_rejected() {
        let reply = ReadReply::new(vec![0xAB; 64]);
        let encoded = reply.to_cbor().unwrap();

        let result = ReadReply::from_cbor(&encoded[..encoded.len() / 2]);
        assert!(matches!(result, Err(ProtocolError::CborDecode(_))));
    }
}
