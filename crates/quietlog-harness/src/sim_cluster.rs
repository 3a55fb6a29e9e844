//! In-process trust domain cluster.
//!
//! Drives whole poll rounds without a network: the handle's query shares go
//! straight to the simulated trust domains and the combined replies come back
//! to the handle.

use quietlog_client::{ClientConfig, Handle, ReadArgs, ReadReply, ReplyOutcome};
use rand::{CryptoRng, RngCore};

use crate::{
    error::HarnessError,
    sim_log::SimLog,
    sim_trust_domain::{SimTrustDomain, combine_answers},
};

/// Trust domains sharing one replicated log.
pub struct SimCluster {
    config: ClientConfig,
    trust_domains: Vec<SimTrustDomain>,
    log: SimLog,
}

impl SimCluster {
    /// One trust domain per entry in `config.trust_domains`.
    ///
    /// # Errors
    ///
    /// - `Layout`: `log` does not match the configured bucket count or slot size
    pub fn new(config: ClientConfig, log: SimLog) -> Result<Self, HarnessError> {
        if log.num_buckets().get() != config.num_buckets || log.slot_size() != config.data_size {
            return Err(HarnessError::Layout {
                reason: format!(
                    "log has {} buckets of {}-byte slots, config expects {} of {}",
                    log.num_buckets(),
                    log.slot_size(),
                    config.num_buckets,
                    config.data_size
                ),
            });
        }

        let trust_domains = config.trust_domains.iter().cloned().map(SimTrustDomain::new).collect();
        Ok(Self { config, trust_domains, log })
    }

    /// Subscriber configuration this cluster serves.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Simulated trust domains, in query order.
    pub fn trust_domains(&self) -> &[SimTrustDomain] {
        &self.trust_domains
    }

    /// Shared log replica.
    pub fn log(&self) -> &SimLog {
        &self.log
    }

    /// Shared log replica, for publishing.
    pub fn log_mut(&mut self) -> &mut SimLog {
        &mut self.log
    }

    /// Combined reply for one query.
    pub fn reply(&self, args: &ReadArgs) -> Result<ReadReply, HarnessError> {
        combine_answers(&self.trust_domains, &self.log, args)
    }

    /// Run one poll round: generate, answer both queries, process both replies.
    ///
    /// Replies are processed in bucket order without waiting on the update
    /// queue, so a full queue shows up as [`ReplyOutcome::Backpressure`].
    pub fn poll<R: RngCore + CryptoRng>(
        &self,
        handle: &mut Handle<R>,
    ) -> Result<[ReplyOutcome; 2], HarnessError> {
        let (first, second) = handle.generate_poll(&self.config)?;
        let first_reply = self.reply(&first)?;
        let second_reply = self.reply(&second)?;

        let slot_size = self.config.data_size;
        let outcomes = [
            handle.try_on_response(&first, first_reply, slot_size),
            handle.try_on_response(&second, second_reply, slot_size),
        ];

        tracing::debug!(seqno = handle.seqno(), ?outcomes, "Poll round complete");

        Ok(outcomes)
    }
}
