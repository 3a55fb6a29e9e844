//! Restorable handle state.

use quietlog_crypto::{Seed, SharedSecret, VERIFY_KEY_LEN};
use serde::{Deserialize, Serialize};

use crate::error::HandleError;

/// Everything needed to recreate a subscription after a restart.
///
/// The generator state and the update queue are deliberately absent: a
/// restored handle draws fresh query randomness and hands out a new
/// [`crate::Updates`].
///
/// Contains secret key material. Callers persisting it are responsible for
/// storing it encrypted at rest.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HandleSnapshot {
    /// First bucket selection seed
    pub seed_a: Option<Seed>,
    /// Second bucket selection seed
    pub seed_b: Option<Seed>,
    /// Key shared with the publisher
    pub shared_secret: Option<SharedSecret>,
    /// Publisher's Ed25519 verify key
    pub verify_key: Option<[u8; VERIFY_KEY_LEN]>,
    /// Next log position to read
    pub seqno: u64,
}

impl HandleSnapshot {
    /// Encode as CBOR.
    pub fn to_cbor(&self) -> Result<Vec<u8>, HandleError> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(self, &mut buf)
            .map_err(|e| HandleError::Snapshot { reason: e.to_string() })?;
        Ok(buf)
    }

    /// Decode from CBOR.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, HandleError> {
        ciborium::de::from_reader(bytes).map_err(|e| HandleError::Snapshot { reason: e.to_string() })
    }
}
