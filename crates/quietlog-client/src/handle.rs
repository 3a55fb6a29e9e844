//! Subscription state machine.
//!
//! ```text
//!                set_seeds + set_keys
//! Uninitialized ──────────────────────► Ready { seqno: n }
//!                                          │ message delivered
//!                                          ▼
//!                                       Ready { seqno: n + 1 }
//! ```
//!
//! There is no way back to `Uninitialized`. Seeds and keys are fixed once set.
//!
//! # Concurrency
//!
//! A handle is single-writer: one poll round (generate, transport, process)
//! must finish or be abandoned before the next begins. `&mut self` on the
//! mutating methods enforces this for a single owner. Independent handles
//! share nothing and can be driven in parallel.

use std::num::NonZeroU64;

use ed25519_dalek::VerifyingKey;
use quietlog_crypto::{NONCE_LEN, Seed, SharedSecret, VERIFY_KEY_LEN, open_slot, parse_verify_key};
use quietlog_proto::{ReadArgs, ReadReply};
use rand::{CryptoRng, RngCore, SeedableRng, rngs::OsRng};
use rand_chacha::ChaCha20Rng;
use tokio::sync::mpsc;

use crate::{
    config::ClientConfig,
    error::HandleError,
    request::build_read_args,
    response::{scan, unmask},
    snapshot::HandleSnapshot,
    updates::{self, Update, Updates},
};

/// Lifecycle state of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    /// Seeds or keys are still missing
    Uninitialized,
    /// Seeds and keys present; polling position `seqno`
    Ready {
        /// Next log position to read
        seqno: u64,
    },
}

/// Result of processing one reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// A message was enqueued and the sequence number advanced
    Delivered {
        /// Position of the delivered message
        seqno: u64,
    },
    /// Nothing addressed to this handle; state unchanged
    NoMessage,
    /// A message was found but the update queue is full; state unchanged
    Backpressure,
    /// A message was found but the consumer is gone; state unchanged
    Closed,
}

/// Subscriber handle for one topic.
///
/// Owns the randomness used for query shares and pad seeds. Production code
/// uses [`Handle::from_entropy`]; tests inject a seeded generator through
/// [`Handle::new`].
pub struct Handle<R = ChaCha20Rng> {
    rng: R,
    seed_a: Option<Seed>,
    seed_b: Option<Seed>,
    shared_secret: Option<SharedSecret>,
    verify_key: Option<VerifyingKey>,
    seqno: u64,
    updates: mpsc::Sender<Update>,
}

impl Handle<ChaCha20Rng> {
    /// Create a handle whose generator is seeded from the operating system.
    ///
    /// # Errors
    ///
    /// - `Entropy`: the OS entropy source failed
    /// - `InvalidConfig`: `capacity` is zero
    pub fn from_entropy(capacity: usize) -> Result<(Self, Updates), HandleError> {
        let rng = ChaCha20Rng::from_rng(OsRng)
            .map_err(|e| HandleError::Entropy { reason: e.to_string() })?;
        Self::new(rng, capacity)
    }
}

impl<R: RngCore + CryptoRng> Handle<R> {
    /// Create an uninitialized handle and the consumer end of its update queue.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig`: `capacity` is zero
    pub fn new(rng: R, capacity: usize) -> Result<(Self, Updates), HandleError> {
        let (tx, rx) = updates::channel(capacity)?;
        let handle = Self {
            rng,
            seed_a: None,
            seed_b: None,
            shared_secret: None,
            verify_key: None,
            seqno: 0,
            updates: tx,
        };
        Ok((handle, rx))
    }

    /// Recreate a handle from a snapshot.
    ///
    /// Absent fields stay unset and can be supplied afterwards.
    ///
    /// # Errors
    ///
    /// - `InvalidVerifyKey` (as `Crypto`): stored verify key is not a valid point
    /// - `InvalidConfig`: `capacity` is zero
    pub fn restore(
        snapshot: HandleSnapshot,
        rng: R,
        capacity: usize,
    ) -> Result<(Self, Updates), HandleError> {
        let verify_key = snapshot.verify_key.as_ref().map(parse_verify_key).transpose()?;

        let (mut handle, updates) = Self::new(rng, capacity)?;
        handle.seed_a = snapshot.seed_a;
        handle.seed_b = snapshot.seed_b;
        handle.shared_secret = snapshot.shared_secret;
        handle.verify_key = verify_key;
        handle.seqno = snapshot.seqno;

        tracing::debug!(seqno = handle.seqno, ready = handle.is_ready(), "Handle restored");

        Ok((handle, updates))
    }

    /// Capture seeds, keys and position for later [`Handle::restore`].
    pub fn snapshot(&self) -> HandleSnapshot {
        HandleSnapshot {
            seed_a: self.seed_a.clone(),
            seed_b: self.seed_b.clone(),
            shared_secret: self.shared_secret.clone(),
            verify_key: self.verify_key.map(|key| key.to_bytes()),
            seqno: self.seqno,
        }
    }

    /// Install the two bucket selection seeds.
    ///
    /// # Errors
    ///
    /// - `AlreadySet`: seeds were installed before
    pub fn set_seeds(&mut self, seed_a: Seed, seed_b: Seed) -> Result<(), HandleError> {
        if self.seed_a.is_some() || self.seed_b.is_some() {
            return Err(HandleError::AlreadySet { field: "seeds" });
        }
        self.seed_a = Some(seed_a);
        self.seed_b = Some(seed_b);
        Ok(())
    }

    /// Draw both bucket selection seeds from the handle's generator.
    ///
    /// Used when this side creates the topic; share them with the publisher
    /// through [`Handle::seeds`].
    ///
    /// # Errors
    ///
    /// - `AlreadySet`: seeds were installed before
    /// - `Entropy`: the generator failed; no seed is installed
    pub fn generate_seeds(&mut self) -> Result<(), HandleError> {
        if self.seed_a.is_some() || self.seed_b.is_some() {
            return Err(HandleError::AlreadySet { field: "seeds" });
        }
        let seed_a = Seed::generate(&mut self.rng).map_err(HandleError::from_seed_draw)?;
        let seed_b = Seed::generate(&mut self.rng).map_err(HandleError::from_seed_draw)?;
        self.set_seeds(seed_a, seed_b)
    }

    /// The installed bucket selection seeds.
    pub fn seeds(&self) -> Option<(&Seed, &Seed)> {
        self.seed_a.as_ref().zip(self.seed_b.as_ref())
    }

    /// Install the publisher's shared secret and verify key.
    ///
    /// # Errors
    ///
    /// - `AlreadySet`: keys were installed before
    /// - `InvalidVerifyKey` (as `Crypto`): `verify_key` is not a valid point
    pub fn set_keys(
        &mut self,
        shared_secret: SharedSecret,
        verify_key: &[u8; VERIFY_KEY_LEN],
    ) -> Result<(), HandleError> {
        if self.shared_secret.is_some() || self.verify_key.is_some() {
            return Err(HandleError::AlreadySet { field: "keys" });
        }
        let verify_key = parse_verify_key(verify_key)?;
        self.shared_secret = Some(shared_secret);
        self.verify_key = Some(verify_key);
        Ok(())
    }

    /// Seeds and keys are all present.
    pub fn is_ready(&self) -> bool {
        self.keys().is_some() && self.seeds().is_some()
    }

    /// Next log position to read.
    pub fn seqno(&self) -> u64 {
        self.seqno
    }

    /// Current lifecycle state.
    pub fn state(&self) -> HandleState {
        if self.is_ready() {
            HandleState::Ready { seqno: self.seqno }
        } else {
            HandleState::Uninitialized
        }
    }

    /// Candidate buckets for the current position.
    ///
    /// # Errors
    ///
    /// - `NotInitialized`: seeds are missing
    pub fn next_buckets(&self, num_buckets: NonZeroU64) -> Result<(u64, u64), HandleError> {
        let (seed_a, seed_b) = self.seeds().ok_or(HandleError::NotInitialized { missing: "seeds" })?;
        Ok(quietlog_crypto::next_buckets(seed_a, seed_b, self.seqno, num_buckets))
    }

    /// Build the two query sets for the current position.
    ///
    /// Keys, seeds and `config` are all checked before any randomness is drawn,
    /// so a misconfigured handle never emits query material.
    ///
    /// # Errors
    ///
    /// - `NotInitialized`: keys or seeds are missing
    /// - `InvalidConfig`: `config` fails validation
    /// - `Entropy`: the generator failed; neither query set is returned
    pub fn generate_poll(
        &mut self,
        config: &ClientConfig,
    ) -> Result<(ReadArgs, ReadArgs), HandleError> {
        if self.keys().is_none() {
            return Err(HandleError::NotInitialized { missing: "keys" });
        }
        if self.seeds().is_none() {
            return Err(HandleError::NotInitialized { missing: "seeds" });
        }
        config.validate()?;
        let num_buckets = config.buckets()?;
        let (bucket_a, bucket_b) = self.next_buckets(num_buckets)?;

        let num_trust_domains = config.num_trust_domains();
        let first = build_read_args(bucket_a, num_buckets, num_trust_domains, &mut self.rng)?;
        let second = build_read_args(bucket_b, num_buckets, num_trust_domains, &mut self.rng)?;

        tracing::debug!(seqno = self.seqno, bucket_a, bucket_b, num_trust_domains, "Poll generated");

        Ok((first, second))
    }

    /// Verify and decrypt one slot directly.
    ///
    /// # Errors
    ///
    /// - `NotInitialized`: keys are missing; checked before anything else
    /// - `Crypto`: input too short, bad signature, or authentication failure
    pub fn decrypt(
        &self,
        ciphertext: &[u8],
        nonce: &[u8; NONCE_LEN],
    ) -> Result<Vec<u8>, HandleError> {
        let (shared_secret, verify_key) =
            self.keys().ok_or(HandleError::NotInitialized { missing: "keys" })?;
        Ok(open_slot(ciphertext, nonce, shared_secret, verify_key)?)
    }

    /// Unmask `reply` and search it for the message at the current position.
    ///
    /// Never changes state. Missing keys, a malformed pad seed, and a reply
    /// with no matching slot all yield `None`.
    pub fn retrieve_response(
        &self,
        args: &ReadArgs,
        reply: ReadReply,
        slot_size: usize,
    ) -> Option<Vec<u8>> {
        let Some((shared_secret, verify_key)) = self.keys() else {
            tracing::warn!(seqno = self.seqno, "Reply ignored: keys not set");
            return None;
        };

        let mut data = reply.data;
        if let Err(e) = unmask(args, &mut data) {
            tracing::info!(
                seqno = self.seqno,
                bucket = ?args.bucket(),
                error = %e,
                "Reply discarded: pad removal failed"
            );
            return None;
        }

        let found = scan(&data, slot_size, self.seqno, shared_secret, verify_key);
        if found.is_none() {
            tracing::trace!(seqno = self.seqno, bucket = ?args.bucket(), "No slot for this position");
        }
        found
    }

    /// Process a reply, waiting for queue capacity if a message is found.
    ///
    /// The sequence number advances only once the update is enqueued. A handle
    /// at position `u64::MAX` delivers nothing further. If this
    /// future is dropped while waiting, nothing is delivered and the state is
    /// unchanged.
    ///
    /// Consumers sharing one task across many handles must drain promptly (or
    /// size `capacity` generously); a stalled consumer stalls this call.
    pub async fn on_response(
        &mut self,
        args: &ReadArgs,
        reply: ReadReply,
        slot_size: usize,
    ) -> ReplyOutcome {
        let Some(plaintext) = self.deliverable(args, reply, slot_size) else {
            return ReplyOutcome::NoMessage;
        };

        let Ok(permit) = self.updates.reserve().await else {
            tracing::debug!(seqno = self.seqno, "Update consumer closed");
            return ReplyOutcome::Closed;
        };

        let seqno = self.seqno;
        permit.send(Update { seqno, plaintext });
        self.advance();

        ReplyOutcome::Delivered { seqno }
    }

    /// Process a reply without waiting.
    ///
    /// A full queue yields [`ReplyOutcome::Backpressure`] with the sequence
    /// number unchanged, so the same reply can be processed again later.
    pub fn try_on_response(
        &mut self,
        args: &ReadArgs,
        reply: ReadReply,
        slot_size: usize,
    ) -> ReplyOutcome {
        let Some(plaintext) = self.deliverable(args, reply, slot_size) else {
            return ReplyOutcome::NoMessage;
        };

        let permit = match self.updates.try_reserve() {
            Ok(permit) => permit,
            Err(mpsc::error::TrySendError::Full(())) => {
                tracing::warn!(seqno = self.seqno, "Update queue full, message held back");
                return ReplyOutcome::Backpressure;
            },
            Err(mpsc::error::TrySendError::Closed(())) => {
                tracing::debug!(seqno = self.seqno, "Update consumer closed");
                return ReplyOutcome::Closed;
            },
        };

        let seqno = self.seqno;
        permit.send(Update { seqno, plaintext });
        self.advance();

        ReplyOutcome::Delivered { seqno }
    }

    /// Like [`Handle::retrieve_response`], but refuses to deliver at the last
    /// representable position, where the sequence number could not advance.
    fn deliverable(&self, args: &ReadArgs, reply: ReadReply, slot_size: usize) -> Option<Vec<u8>> {
        if self.seqno == u64::MAX {
            tracing::error!(seqno = self.seqno, "Sequence space exhausted, reply ignored");
            return None;
        }
        self.retrieve_response(args, reply, slot_size)
    }

    fn advance(&mut self) {
        self.seqno += 1;
        tracing::debug!(seqno = self.seqno, "Message delivered, position advanced");
    }

    fn keys(&self) -> Option<(&SharedSecret, &VerifyingKey)> {
        self.shared_secret.as_ref().zip(self.verify_key.as_ref())
    }
}
