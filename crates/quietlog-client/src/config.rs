//! Client configuration.

use std::num::NonZeroU64;

use quietlog_crypto::SLOT_OVERHEAD;
use quietlog_proto::request_vector_len;
use serde::{Deserialize, Serialize};

use crate::error::HandleError;

/// One trust domain, identified for logging and transport routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustDomainConfig {
    /// Human-readable name (e.g., "t0")
    pub name: String,
    /// Transport address of the trust domain's frontend
    pub address: String,
}

impl TrustDomainConfig {
    /// Create a trust domain entry.
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self { name: name.into(), address: address.into() }
    }
}

/// Parameters shared by every handle polling the same log.
///
/// `trust_domains` fixes the server order: share `i` of every query goes to
/// `trust_domains[i]`, and pads are removed from replies in the same order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Number of buckets in the log
    pub num_buckets: u64,
    /// Slot size in bytes (ciphertext + tag + signature)
    pub data_size: usize,
    /// Participating trust domains, in query order
    pub trust_domains: Vec<TrustDomainConfig>,
    /// Capacity of each handle's update queue
    pub update_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            num_buckets: 1024,
            data_size: 1024,
            trust_domains: vec![
                TrustDomainConfig::new("t0", "localhost:9000"),
                TrustDomainConfig::new("t1", "localhost:9100"),
            ],
            update_buffer: 16,
        }
    }
}

impl ClientConfig {
    /// Number of trust domains each query is split across.
    pub fn num_trust_domains(&self) -> usize {
        self.trust_domains.len()
    }

    /// Bucket count as a non-zero value.
    pub fn buckets(&self) -> Result<NonZeroU64, HandleError> {
        NonZeroU64::new(self.num_buckets)
            .ok_or_else(|| HandleError::InvalidConfig { reason: "num_buckets is zero".to_string() })
    }

    /// Check every parameter a poll round depends on.
    pub fn validate(&self) -> Result<(), HandleError> {
        self.buckets()?;

        if request_vector_len(self.num_buckets).is_none() {
            return Err(HandleError::InvalidConfig {
                reason: format!("request vector for {} buckets is too large", self.num_buckets),
            });
        }

        if self.trust_domains.is_empty() {
            return Err(HandleError::InvalidConfig {
                reason: "at least one trust domain is required".to_string(),
            });
        }

        if self.data_size <= SLOT_OVERHEAD {
            return Err(HandleError::InvalidConfig {
                reason: format!(
                    "data_size {} must exceed slot overhead of {SLOT_OVERHEAD} bytes",
                    self.data_size
                ),
            });
        }

        if self.update_buffer == 0 {
            return Err(HandleError::InvalidConfig {
                reason: "update_buffer must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}
