//! Hash-chain linking.
//!
//! Hash layout:
//!   payload_hash = sha256(canonical({actor, createdAt, entity, entityId,
//!                                    eventType, newData, oldData, operation}))
//!   chain_hash   = sha256(payload_hash ++ prev_chain_hash)
//!
//! Both hashes are lowercase hex and `++` is plain string concatenation of
//! the two hex strings.  `id`, `runId` and `partition` are deliberately not
//! part of the payload; the chain itself binds an event to its partition.

use chrono::{DateTime, SecondsFormat, Utc};

use ledgerseal_contracts::{error::LedgerResult, event::AuditEvent, value::CanonicalValue};

use crate::digest::{digest, digest_canonical};

/// Render a timestamp the way it is hashed: RFC 3339, UTC, milliseconds.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Whether `at` carries precision below the millisecond.
///
/// Hashing only sees milliseconds, so a stored timestamp finer than that
/// cannot have come from the builder.
pub fn has_sub_millisecond(at: &DateTime<Utc>) -> bool {
    at.timestamp_subsec_nanos() % 1_000_000 != 0
}

/// The hashed view of an event.
pub fn payload_of(event: &AuditEvent) -> CanonicalValue {
    CanonicalValue::object([
        ("actor", CanonicalValue::from(event.actor.as_str())),
        ("eventType", CanonicalValue::from(event.event_type.as_str())),
        ("entity", CanonicalValue::from(event.entity.as_str())),
        ("entityId", CanonicalValue::from(event.entity_id.clone())),
        ("operation", CanonicalValue::from(event.operation.as_str())),
        ("oldData", CanonicalValue::from(event.old_data.clone())),
        ("newData", CanonicalValue::from(event.new_data.clone())),
        ("createdAt", CanonicalValue::from(format_timestamp(&event.created_at))),
    ])
}

/// Recompute `payload_hash` from an event's stored content.
pub fn payload_hash(event: &AuditEvent) -> LedgerResult<String> {
    digest_canonical(&payload_of(event))
}

/// Link a payload hash onto the previous chain hash.
pub fn chain_hash(payload_hash: &str, prev_chain_hash: &str) -> String {
    let mut input = String::with_capacity(payload_hash.len() + prev_chain_hash.len());
    input.push_str(payload_hash);
    input.push_str(prev_chain_hash);
    digest(input.as_bytes())
}
