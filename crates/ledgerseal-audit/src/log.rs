//! Partition export and export verification.
//!
//! A `PartitionLog` is the operator-facing snapshot of one partition.  Its
//! `terminal_hash` commits to the whole partition, which lets verification
//! also catch truncation: dropping trailing events leaves a chain that is
//! internally valid but no longer ends at the recorded terminal hash.

use chrono::Utc;
use tracing::{info, warn};

use ledgerseal_contracts::{
    error::LedgerResult,
    event::{PartitionKey, PartitionLog, CHAIN_FORMAT, GENESIS_HASH},
    verify::{DivergenceKind, VerificationResult},
};
use ledgerseal_core::EventStore;

use crate::chain::verify;

/// Snapshot every event of `partition` into a `PartitionLog`.
pub fn export_partition(
    store: &dyn EventStore,
    partition: &PartitionKey,
) -> LedgerResult<PartitionLog> {
    let events = store.scan(partition, 0, None)?;
    let terminal_hash = events
        .last()
        .map(|e| e.chain_hash.clone())
        .unwrap_or_else(|| GENESIS_HASH.to_string());

    info!(
        partition = %partition,
        event_count = events.len(),
        terminal_hash = %terminal_hash,
        "partition exported"
    );

    Ok(PartitionLog {
        format: CHAIN_FORMAT.to_string(),
        partition: partition.clone(),
        events,
        exported_at: Utc::now(),
        terminal_hash,
    })
}

/// Verify an exported log, including its terminal hash.
///
/// A chain that verifies but does not end at `terminal_hash` is reported as
/// `ChainBroken` at index `events.len()`, the position of the first missing
/// event.
pub fn verify_log(log: &PartitionLog) -> VerificationResult {
    let result = verify(&log.events);
    if !result.is_valid() {
        return result;
    }

    let last = log
        .events
        .last()
        .map(|e| e.chain_hash.as_str())
        .unwrap_or(GENESIS_HASH);
    if last != log.terminal_hash {
        warn!(
            partition = %log.partition,
            expected = %log.terminal_hash,
            found = %last,
            "exported chain does not end at its terminal hash"
        );
        return VerificationResult::Invalid {
            index: log.events.len(),
            kind: DivergenceKind::ChainBroken,
        };
    }

    result
}
