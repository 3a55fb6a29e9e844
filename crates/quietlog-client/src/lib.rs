//! Client
//!
//! Subscriber side of a quietlog topic. A [`Handle`] learns whether the
//! publisher has appended a new message without revealing to any single trust
//! domain which log position it is reading, then authenticates and decrypts
//! whatever it finds.
//!
//! # Architecture
//!
//! The handle follows the same Sans-IO approach as the rest of the workspace.
//! It produces query records ([`ReadArgs`]) for the caller to send and consumes
//! the replies ([`ReadReply`]) the caller receives. It never touches the
//! network.
//!
//! ```text
//! generate_poll ──► bucket selection ──► secret-shared request (x2)
//!                                              │ caller transports
//!                                              ▼
//! on_response ◄── unmask (per-server pads) ◄── reply
//!      │
//!      ▼ scan slots: verify signature, then decrypt
//! Update { seqno, plaintext } ──► Updates (bounded queue)
//! ```
//!
//! # Components
//!
//! - [`Handle`]: Subscription state machine (keys, seeds, sequence number)
//! - [`build_read_args`]: XOR secret sharing of a one-bucket query
//! - [`unmask`] / [`scan`]: Reply processing
//! - [`Updates`]: Consumer end of the delivery queue
//! - [`ClientConfig`]: Bucket count, slot size and trust domain order

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod error;
mod handle;
mod request;
mod response;
mod snapshot;
#[cfg(test)]
mod test_rng;
mod updates;

pub use config::{ClientConfig, TrustDomainConfig};
pub use error::HandleError;
pub use handle::{Handle, HandleState, ReplyOutcome};
pub use quietlog_crypto::{Seed, SharedSecret};
pub use quietlog_proto::{PirArgs, ReadArgs, ReadReply};
pub use request::build_read_args;
pub use response::{scan, unmask};
pub use snapshot::HandleSnapshot;
pub use updates::{TryRecvError, Update, Updates};
