//! Simulation harness for quietlog.
//!
//! Stands in for everything around the subscriber handle: trust domains that
//! answer secret-shared queries against a replicated log, a publisher that
//! places messages where the handle will look for them, and a turmoil-backed
//! transport for running poll rounds over a simulated network.
//!
//! # Components
//!
//! - [`SimLog`]: Bucketed slot storage, noise-filled
//! - [`SimTrustDomain`]: Answers one query share with a padded XOR of buckets
//! - [`SimCluster`]: Runs whole poll rounds in process
//! - [`TestPublisher`]: Seals and places messages for a topic
//! - [`sim_net`]: Length-prefixed CBOR over turmoil TCP

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod publisher;
pub mod sim_cluster;
pub mod sim_log;
pub mod sim_net;
pub mod sim_trust_domain;

pub use error::HarnessError;
pub use publisher::{Placement, TestPublisher};
pub use sim_cluster::SimCluster;
pub use sim_log::SimLog;
pub use sim_trust_domain::{SimTrustDomain, combine_answers};
