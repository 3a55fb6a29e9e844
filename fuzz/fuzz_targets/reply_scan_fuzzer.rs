//! Fuzz target for reply processing
//!
//! Feeds adversarial replies, pad seeds and slot sizes through unmasking and
//! slot scanning, the path a malicious trust domain controls.
//!
//! # Invariants
//!
//! - Never panics, whatever the reply length or slot size
//! - Malformed pad seeds are reported, never partially applied silently
//! - Without the publisher's signing key, no slot ever opens

#![no_main]

use arbitrary::Arbitrary;
use ed25519_dalek::SigningKey;
use libfuzzer_sys::fuzz_target;
use quietlog_client::{scan, unmask, PirArgs, ReadArgs, SharedSecret};
use quietlog_crypto::SEED_LEN;

#[derive(Debug, Arbitrary)]
struct ReplyScenario {
    /// Pad seeds, one per trust domain (arbitrary lengths)
    pad_seeds: Vec<Vec<u8>>,
    /// Reply bytes
    data: Vec<u8>,
    /// Slot size (clamped below)
    slot_size: u16,
    /// Position being read
    seqno: u64,
}

fuzz_target!(|scenario: ReplyScenario| {
    if scenario.pad_seeds.len() > 8 {
        return;
    }

    let args = ReadArgs {
        td: scenario
            .pad_seeds
            .iter()
            .map(|seed| PirArgs { request_vector: Vec::new(), pad_seed: seed.clone() })
            .collect(),
    };

    let mut data = scenario.data;
    let all_valid = args.pad_seeds().all(|seed| seed.len() == SEED_LEN);
    let unmasked = unmask(&args, &mut data);
    assert_eq!(unmasked.is_ok(), all_valid, "seed validation mismatch");

    let verify_key = SigningKey::from_bytes(&[0x42; 32]).verifying_key();
    let secret = SharedSecret::new([0x17; 32]);

    let found = scan(&data, usize::from(scenario.slot_size), scenario.seqno, &secret, &verify_key);
    assert!(found.is_none(), "forged slot accepted");
});
