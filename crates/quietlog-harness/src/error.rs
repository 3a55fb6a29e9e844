//! Harness error types.

use std::io;

use quietlog_client::HandleError;
use quietlog_crypto::CryptoError;
use quietlog_proto::ProtocolError;
use thiserror::Error;

/// Errors raised by simulated trust domains, publishers and transport.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Log dimensions are unusable
    #[error("invalid log layout: {reason}")]
    Layout {
        /// What is wrong with it
        reason: String,
    },

    /// A share's request vector does not match the log's bucket count
    #[error("request vector is {actual} bytes, log needs {expected}")]
    RequestLength {
        /// Bytes needed for the log's bucket count
        expected: usize,
        /// Bytes received
        actual: usize,
    },

    /// Both candidate buckets for a message have no free slot
    #[error("buckets {bucket_a} and {bucket_b} full for seqno {seqno}")]
    BucketsFull {
        /// Message position
        seqno: u64,
        /// First candidate
        bucket_a: u64,
        /// Second candidate
        bucket_b: u64,
    },

    /// Query and trust domain set disagree on the number of shares
    #[error("query has {shares} shares for {trust_domains} trust domains")]
    ShareCount {
        /// Shares in the query
        shares: usize,
        /// Trust domains answering
        trust_domains: usize,
    },

    /// A simulated frame exceeded the size limit
    #[error("frame of {len} bytes exceeds limit of {max}")]
    FrameTooLarge {
        /// Announced length
        len: usize,
        /// Maximum accepted length
        max: usize,
    },

    /// Primitive failure (sealing, pad overlay)
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Subscriber handle failure
    #[error(transparent)]
    Handle(#[from] HandleError),

    /// Record encoding failure
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Simulated network failure
    #[error(transparent)]
    Io(#[from] io::Error),
}
