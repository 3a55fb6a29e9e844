//! Quietlog wire records
//!
//! Plain data exchanged between a subscriber and the trust domains that
//! jointly answer its private reads. Framing and transport are owned by the
//! caller; this crate only fixes the record layout and a CBOR encoding.
//!
//! # Records
//!
//! - [`PirArgs`]: one trust domain's share of a read (request vector + pad
//!   seed)
//! - [`ReadArgs`]: every trust domain's share for one bucket, in the fixed
//!   server order agreed with the transport layer
//! - [`ReadReply`]: the combined bucket contents returned for a [`ReadArgs`]
//!
//! # Request Vector Layout
//!
//! One bit per bucket, packed low-bit-first: bucket `b` lives at byte `b / 8`,
//! bit `b % 8`. A vector for `n` buckets is `ceil(n / 8)` bytes long.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod errors;
pub mod read;

pub use errors::{ProtocolError, Result};
pub use read::{
    PirArgs, ReadArgs, ReadReply, bucket_bit_is_set, request_vector_len, selected_buckets,
};
