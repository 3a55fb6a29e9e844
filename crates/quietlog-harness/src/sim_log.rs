//! Replicated bucket storage shared by every simulated trust domain.
//!
//! ```text
//! bucket 0: [slot 0][slot 1]...[slot depth-1]
//! bucket 1: [slot 0][slot 1]...[slot depth-1]
//! ...
//! ```
//!
//! Free slots hold random noise, so an observer of the raw log cannot tell
//! occupied and empty slots apart.

use std::num::NonZeroU64;

use quietlog_client::ClientConfig;
use rand::RngCore;

use crate::error::HarnessError;

/// In-memory log of `num_buckets` buckets, each `depth` slots deep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimLog {
    num_buckets: NonZeroU64,
    depth: usize,
    slot_size: usize,
    data: Vec<u8>,
    occupied: Vec<bool>,
}

impl SimLog {
    /// Allocate a log filled with noise from `rng`.
    ///
    /// # Errors
    ///
    /// - `Layout`: zero depth or slot size, or a log too large to allocate
    pub fn new<R: RngCore + ?Sized>(
        num_buckets: NonZeroU64,
        depth: usize,
        slot_size: usize,
        rng: &mut R,
    ) -> Result<Self, HarnessError> {
        if depth == 0 || slot_size == 0 {
            return Err(HarnessError::Layout {
                reason: format!("depth {depth} and slot size {slot_size} must be non-zero"),
            });
        }

        let slots = usize::try_from(num_buckets.get())
            .ok()
            .and_then(|buckets| buckets.checked_mul(depth))
            .ok_or_else(|| HarnessError::Layout {
                reason: format!("{num_buckets} buckets of depth {depth} do not fit in memory"),
            })?;
        let len = slots.checked_mul(slot_size).ok_or_else(|| HarnessError::Layout {
            reason: format!("{slots} slots of {slot_size} bytes do not fit in memory"),
        })?;

        let mut data = vec![0u8; len];
        rng.fill_bytes(&mut data);

        Ok(Self { num_buckets, depth, slot_size, data, occupied: vec![false; slots] })
    }

    /// Allocate a log matching a subscriber configuration.
    ///
    /// # Errors
    ///
    /// - `Handle`: the configuration is invalid
    /// - `Layout`: see [`SimLog::new`]
    pub fn for_config<R: RngCore + ?Sized>(
        config: &ClientConfig,
        depth: usize,
        rng: &mut R,
    ) -> Result<Self, HarnessError> {
        config.validate()?;
        Self::new(config.buckets()?, depth, config.data_size, rng)
    }

    /// Number of buckets.
    pub fn num_buckets(&self) -> NonZeroU64 {
        self.num_buckets
    }

    /// Slots per bucket.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Bytes per slot.
    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// Bytes per bucket.
    pub fn bucket_len(&self) -> usize {
        self.depth * self.slot_size
    }

    /// Raw contents of `bucket`. Buckets past the end read as empty.
    pub fn bucket(&self, bucket: u64) -> &[u8] {
        let Some(start) = self.bucket_offset(bucket) else {
            return &[];
        };
        &self.data[start..start + self.bucket_len()]
    }

    /// Number of written slots in `bucket`.
    pub fn occupancy(&self, bucket: u64) -> usize {
        self.slot_range(bucket).map_or(0, |range| {
            self.occupied[range].iter().filter(|&&taken| taken).count()
        })
    }

    /// Store `slot` in the first free slot of `bucket`.
    ///
    /// Returns the slot index, or `None` if the bucket is full. `slot` must be
    /// exactly [`SimLog::slot_size`] bytes.
    pub fn write(&mut self, bucket: u64, slot: &[u8]) -> Option<usize> {
        debug_assert_eq!(slot.len(), self.slot_size);
        if slot.len() != self.slot_size {
            return None;
        }

        let range = self.slot_range(bucket)?;
        let first_slot = range.start;
        let index = self.occupied[range].iter().position(|&taken| !taken)?;

        self.occupied[first_slot + index] = true;
        let start = (first_slot + index) * self.slot_size;
        self.data[start..start + self.slot_size].copy_from_slice(slot);

        Some(index)
    }

    fn slot_range(&self, bucket: u64) -> Option<std::ops::Range<usize>> {
        if bucket >= self.num_buckets.get() {
            return None;
        }
        let first = bucket as usize * self.depth;
        Some(first..first + self.depth)
    }

    fn bucket_offset(&self, bucket: u64) -> Option<usize> {
        self.slot_range(bucket).map(|range| range.start * self.slot_size)
    }
}
