//! Test publisher.
//!
//! Mirrors the subscriber's derivations: same seeds, same bucket pair, same
//! nonce encoding. Each message goes into the first free slot of its first
//! candidate bucket, falling back to the second.

use ed25519_dalek::SigningKey;
use quietlog_client::{Handle, Updates};
use quietlog_crypto::{
    CryptoError, SHARED_SECRET_LEN, Seed, SharedSecret, encode_seqno, max_plaintext_len,
    next_buckets, seal_slot,
};
use rand::{CryptoRng, RngCore};

use crate::{error::HarnessError, sim_log::SimLog};

/// Where a message was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Message position
    pub seqno: u64,
    /// Bucket holding it
    pub bucket: u64,
    /// Slot index within the bucket
    pub slot: usize,
}

/// Publisher for one topic.
pub struct TestPublisher {
    seed_a: Seed,
    seed_b: Seed,
    shared_secret: SharedSecret,
    signing_key: SigningKey,
    slot_size: usize,
    seqno: u64,
}

impl TestPublisher {
    /// Create a topic with fresh seeds and keys.
    ///
    /// # Errors
    ///
    /// - `Crypto`: the RNG failed
    pub fn generate<R: RngCore + CryptoRng + ?Sized>(
        rng: &mut R,
        slot_size: usize,
    ) -> Result<Self, HarnessError> {
        let seed_a = Seed::generate(rng)?;
        let seed_b = Seed::generate(rng)?;

        let mut secret = [0u8; SHARED_SECRET_LEN];
        rng.try_fill_bytes(&mut secret)
            .map_err(|e| CryptoError::Entropy { reason: e.to_string() })?;

        let mut signing = [0u8; 32];
        rng.try_fill_bytes(&mut signing)
            .map_err(|e| CryptoError::Entropy { reason: e.to_string() })?;

        Ok(Self {
            seed_a,
            seed_b,
            shared_secret: SharedSecret::new(secret),
            signing_key: SigningKey::from_bytes(&signing),
            slot_size,
            seqno: 0,
        })
    }

    /// A subscriber handle for this topic, positioned at message zero.
    ///
    /// # Errors
    ///
    /// - `Handle`: `capacity` is zero
    pub fn subscriber<R: RngCore + CryptoRng>(
        &self,
        rng: R,
        capacity: usize,
    ) -> Result<(Handle<R>, Updates), HarnessError> {
        let (mut handle, updates) = Handle::new(rng, capacity)?;
        handle.set_seeds(self.seed_a.clone(), self.seed_b.clone())?;
        handle.set_keys(self.shared_secret.clone(), self.signing_key.verifying_key().as_bytes())?;
        Ok((handle, updates))
    }

    /// Position of the next message.
    pub fn seqno(&self) -> u64 {
        self.seqno
    }

    /// Largest message this topic carries. Shorter messages are zero-padded.
    pub fn message_len(&self) -> usize {
        max_plaintext_len(self.slot_size)
    }

    /// `message` as the subscriber will receive it.
    pub fn padded(&self, message: &[u8]) -> Vec<u8> {
        let mut body = message.to_vec();
        body.resize(self.message_len().max(message.len()), 0);
        body
    }

    /// Seal `message` for the next position and store it in `log`.
    ///
    /// The position advances only if the message was stored.
    ///
    /// # Errors
    ///
    /// - `Crypto`: `message` is longer than [`TestPublisher::message_len`]
    /// - `BucketsFull`: neither candidate bucket has a free slot
    /// - `Layout`: `log` uses a different slot size
    pub fn publish(&mut self, log: &mut SimLog, message: &[u8]) -> Result<Placement, HarnessError> {
        if log.slot_size() != self.slot_size {
            return Err(HarnessError::Layout {
                reason: format!(
                    "log slot size {} differs from topic slot size {}",
                    log.slot_size(),
                    self.slot_size
                ),
            });
        }

        let slot = seal_slot(
            &self.padded(message),
            self.slot_size,
            &encode_seqno(self.seqno),
            &self.shared_secret,
            &self.signing_key,
        )?;

        let (bucket_a, bucket_b) =
            next_buckets(&self.seed_a, &self.seed_b, self.seqno, log.num_buckets());

        let placement = [bucket_a, bucket_b].into_iter().find_map(|bucket| {
            log.write(bucket, &slot).map(|index| Placement { seqno: self.seqno, bucket, slot: index })
        });

        let Some(placement) = placement else {
            tracing::warn!(seqno = self.seqno, bucket_a, bucket_b, "No free slot for message");
            return Err(HarnessError::BucketsFull { seqno: self.seqno, bucket_a, bucket_b });
        };

        tracing::debug!(
            seqno = placement.seqno,
            bucket = placement.bucket,
            slot = placement.slot,
            "Message published"
        );

        self.seqno += 1;
        Ok(placement)
    }
}
