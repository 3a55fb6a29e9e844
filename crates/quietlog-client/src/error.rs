//! Error types for subscriber handles.

use quietlog_crypto::CryptoError;
use thiserror::Error;

/// Errors from handle configuration, poll generation and decryption.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandleError {
    /// Required keys or seeds are absent
    #[error("handle not initialized: missing {missing}")]
    NotInitialized {
        /// What is missing (`"keys"` or `"seeds"`)
        missing: &'static str,
    },

    /// Seeds or keys were already set; they never change after creation
    #[error("{field} already set")]
    AlreadySet {
        /// Which field was set twice
        field: &'static str,
    },

    /// Client configuration is unusable
    #[error("invalid config: {reason}")]
    InvalidConfig {
        /// What is wrong with it
        reason: String,
    },

    /// Randomness source failed; no query material was emitted
    #[error("entropy source failed: {reason}")]
    Entropy {
        /// Underlying RNG error
        reason: String,
    },

    /// Cryptographic operation failed
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Snapshot could not be encoded or decoded
    #[error("snapshot error: {reason}")]
    Snapshot {
        /// Underlying codec error
        reason: String,
    },
}

impl HandleError {
    /// Returns true for configuration errors.
    ///
    /// These are detected before any randomness or cryptography and are never
    /// worth retrying without changing the handle or its config.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::NotInitialized { .. } | Self::AlreadySet { .. } | Self::InvalidConfig { .. }
        )
    }

    /// Lift a failed seed draw into `Entropy`, keeping the RNG's own message.
    pub(crate) fn from_seed_draw(err: CryptoError) -> Self {
        match err {
            CryptoError::Entropy { reason } => Self::Entropy { reason },
            other => Self::Crypto(other),
        }
    }
}
