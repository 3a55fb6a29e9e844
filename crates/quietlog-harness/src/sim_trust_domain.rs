//! Simulated trust domains.
//!
//! Each trust domain holds a full replica of the log. Given one share of a
//! query, it XORs together every bucket whose bit is set and pads the result
//! with the stream derived from the share's seed. Without all pads removed the
//! answer is indistinguishable from noise.

use quietlog_client::TrustDomainConfig;
use quietlog_crypto::overlay;
use quietlog_proto::{PirArgs, ReadArgs, ReadReply, request_vector_len, selected_buckets};

use crate::{error::HarnessError, sim_log::SimLog};

/// One trust domain answering shares against a log replica.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimTrustDomain {
    config: TrustDomainConfig,
}

impl SimTrustDomain {
    /// Trust domain identified by `config`.
    pub fn new(config: TrustDomainConfig) -> Self {
        Self { config }
    }

    /// Name used in logs.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Address this trust domain listens on in network simulations.
    pub fn address(&self) -> &str {
        &self.config.address
    }

    /// Compute this trust domain's padded answer to `share`.
    ///
    /// # Errors
    ///
    /// - `RequestLength`: the vector does not match the log's bucket count
    /// - `Crypto`: the pad seed is malformed
    pub fn answer(&self, log: &SimLog, share: &PirArgs) -> Result<Vec<u8>, HarnessError> {
        let num_buckets = log.num_buckets().get();
        let expected = request_vector_len(num_buckets).ok_or_else(|| HarnessError::Layout {
            reason: format!("request vector for {num_buckets} buckets is too large"),
        })?;
        if share.request_vector.len() != expected {
            return Err(HarnessError::RequestLength {
                expected,
                actual: share.request_vector.len(),
            });
        }

        let mut out = vec![0u8; log.bucket_len()];
        let mut selected = 0usize;
        for bucket in selected_buckets(&share.request_vector, num_buckets) {
            for (acc, byte) in out.iter_mut().zip(log.bucket(bucket)) {
                *acc ^= byte;
            }
            selected += 1;
        }

        overlay(&share.pad_seed, &mut out)?;

        tracing::trace!(trust_domain = self.name(), selected, len = out.len(), "Share answered");

        Ok(out)
    }
}

/// XOR every trust domain's answer into one reply.
///
/// `trust_domains[i]` answers `args.td[i]`.
///
/// # Errors
///
/// - `ShareCount`: share and trust domain counts differ
/// - any error from [`SimTrustDomain::answer`]
pub fn combine_answers(
    trust_domains: &[SimTrustDomain],
    log: &SimLog,
    args: &ReadArgs,
) -> Result<ReadReply, HarnessError> {
    if trust_domains.len() != args.num_trust_domains() {
        return Err(HarnessError::ShareCount {
            shares: args.num_trust_domains(),
            trust_domains: trust_domains.len(),
        });
    }

    let mut data = vec![0u8; log.bucket_len()];
    for (trust_domain, share) in trust_domains.iter().zip(&args.td) {
        let answer = trust_domain.answer(log, share)?;
        for (acc, byte) in data.iter_mut().zip(&answer) {
            *acc ^= byte;
        }
    }

    Ok(ReadReply::new(data))
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU64;

    use quietlog_crypto::SEED_LEN;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;

    fn log() -> SimLog {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let mut log = SimLog::new(NonZeroU64::new(16).unwrap(), 2, 8, &mut rng).unwrap();
        log.write(3, &[0x33; 8]);
        log.write(3, &[0x44; 8]);
        log
    }

    fn td(name: &str) -> SimTrustDomain {
        SimTrustDomain::new(TrustDomainConfig::new(name, format!("{name}:9000")))
    }

    #[test]
    fn unpadded_single_bucket_answer_is_bucket() {
        let log = log();
        let share = PirArgs { request_vector: vec![0b0000_1000, 0], pad_seed: vec![0; SEED_LEN] };

        let mut answer = td("t0").answer(&log, &share).unwrap();
        overlay(&share.pad_seed, &mut answer).unwrap();

        assert_eq!(answer, log.bucket(3));
    }

    #[test]
    fn empty_vector_answers_pad_only() {
        let log = log();
        let share = PirArgs { request_vector: vec![0, 0], pad_seed: vec![9; SEED_LEN] };

        let mut answer = td("t0").answer(&log, &share).unwrap();
        overlay(&share.pad_seed, &mut answer).unwrap();

        assert!(answer.iter().all(|&b| b == 0));
    }

    #[test]
    fn wrong_vector_length_rejected() {
        let share = PirArgs { request_vector: vec![0], pad_seed: vec![0; SEED_LEN] };
        let result = td("t0").answer(&log(), &share);
        assert!(matches!(result, Err(HarnessError::RequestLength { expected: 2, actual: 1 })));
    }

    #[test]
    fn malformed_pad_seed_rejected() {
        let share = PirArgs { request_vector: vec![0, 0], pad_seed: vec![0; 5] };
        let result = td("t0").answer(&log(), &share);
        assert!(matches!(result, Err(HarnessError::Crypto(_))));
    }

    #[test]
    fn share_count_must_match() {
        let args = ReadArgs {
            td: vec![PirArgs { request_vector: vec![0, 0], pad_seed: vec![0; SEED_LEN] }],
        };
        let result = combine_answers(&[td("t0"), td("t1")], &log(), &args);
        assert!(matches!(result, Err(HarnessError::ShareCount { shares: 1, trust_domains: 2 })));
    }
}
