//! Chain verification.
//!
//! For every event, in order:
//!
//!   1. **Payload**: recompute `payload_hash` from the stored fields; a
//!      mismatch is `PayloadTampered`.  So is a `created_at` finer than a
//!      millisecond, since hashing cannot see that part of it.
//!   2. **Link**: recompute `chain_hash` from the recomputed payload hash
//!      and the previous event's stored `chain_hash` (the trusted hash for
//!      the first event checked); a mismatch is `ChainBroken`.
//!
//! Verification stops at the first divergence.  Everything here is pure and
//! read-only, so it is safe to run concurrently against a snapshot.

use tracing::{debug, warn};

use ledgerseal_contracts::{
    error::LedgerResult,
    event::{AuditEvent, PartitionKey, GENESIS_HASH},
    verify::{Checkpoint, DivergenceKind, VerificationReport, VerificationResult},
};
use ledgerseal_core::{chain_hash, link::has_sub_millisecond, payload_hash, EventStore};

/// Default number of events fetched per store scan by `verify_partition`.
pub const DEFAULT_BATCH_SIZE: usize = 1_000;

/// Verify a full partition sequence starting from genesis.
///
/// An empty sequence is valid.
pub fn verify(events: &[AuditEvent]) -> VerificationResult {
    verify_from(events, 0, GENESIS_HASH).result
}

/// Verify `events` as the suffix of a partition beginning at `start_index`.
///
/// `trusted_prev` is the `chain_hash` of the event at `start_index - 1`
/// (`GENESIS_HASH` when `start_index` is 0).  The caller vouches for it;
/// nothing before `start_index` is re-checked.  Indices in the result are
/// absolute, i.e. offset by `start_index`.
pub fn verify_from(
    events: &[AuditEvent],
    start_index: usize,
    trusted_prev: &str,
) -> VerificationReport {
    let mut prev = trusted_prev.to_string();

    for (offset, event) in events.iter().enumerate() {
        let index = start_index + offset;

        if has_sub_millisecond(&event.created_at) {
            return diverged(index, offset, prev, DivergenceKind::PayloadTampered, event);
        }

        let recomputed_payload = match payload_hash(event) {
            Ok(hash) if hash == event.payload_hash => hash,
            Ok(_) => return diverged(index, offset, prev, DivergenceKind::PayloadTampered, event),
            Err(e) => {
                // A stored snapshot the builder could never have accepted.
                debug!(index, error = %e, "stored payload cannot be canonicalized");
                return diverged(index, offset, prev, DivergenceKind::PayloadTampered, event);
            }
        };

        if chain_hash(&recomputed_payload, &prev) != event.chain_hash {
            return diverged(index, offset, prev, DivergenceKind::ChainBroken, event);
        }

        prev.clone_from(&event.chain_hash);
    }

    VerificationReport {
        result: VerificationResult::Valid,
        verified: events.len(),
        checkpoint: Checkpoint {
            next_index: start_index + events.len(),
            chain_hash: prev,
        },
    }
}

/// Resume a verification from a checkpoint produced by an earlier run.
pub fn verify_resume(events: &[AuditEvent], checkpoint: &Checkpoint) -> VerificationReport {
    verify_from(events, checkpoint.next_index, &checkpoint.chain_hash)
}

/// Verify a whole partition straight out of a store, `batch_size` events at
/// a time.
///
/// Each batch resumes from the previous batch's checkpoint, so memory use is
/// bounded by the batch size.
pub fn verify_partition(
    store: &dyn EventStore,
    partition: &PartitionKey,
    batch_size: usize,
) -> LedgerResult<VerificationReport> {
    let batch_size = batch_size.max(1);
    let mut checkpoint = Checkpoint {
        next_index: 0,
        chain_hash: GENESIS_HASH.to_string(),
    };
    let mut verified = 0;

    loop {
        let batch = store.scan(partition, checkpoint.next_index, Some(batch_size))?;
        if batch.is_empty() {
            break;
        }

        let report = verify_resume(&batch, &checkpoint);
        verified += report.verified;
        if !report.result.is_valid() {
            return Ok(VerificationReport { verified, ..report });
        }
        checkpoint = report.checkpoint;

        if batch.len() < batch_size {
            break;
        }
    }

    debug!(partition = %partition, verified, "partition chain verified");

    Ok(VerificationReport {
        result: VerificationResult::Valid,
        verified,
        checkpoint,
    })
}

fn diverged(
    index: usize,
    verified: usize,
    trusted: String,
    kind: DivergenceKind,
    event: &AuditEvent,
) -> VerificationReport {
    warn!(
        index,
        kind = %kind,
        event_id = %event.id,
        partition = %event.partition,
        "audit chain divergence detected"
    );
    VerificationReport {
        result: VerificationResult::Invalid { index, kind },
        verified,
        checkpoint: Checkpoint {
            next_index: index,
            chain_hash: trusted,
        },
    }
}
