//! Audit event, partition head, and exported log types.
//!
//! `RawEvent` is what business code hands to the recorder.  `AuditEvent` is
//! the sealed row that lands in the event store, carrying the payload hash
//! and the chain hash that make tampering detectable.  `PartitionLog` is the
//! export format the verifier CLI consumes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value::CanonicalValue;

/// The `prev` chain hash used for the first event in every partition.
///
/// 64 hex zeros.
pub const GENESIS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Identifier of the hashed field set and canonical encoding.
///
/// Changing which fields are hashed, or how they are encoded, invalidates
/// every issued hash and must ship as a new format with fresh partitions.
pub const CHAIN_FORMAT: &str = "ledgerseal-v1";

/// An independent chain lineage, typically one per organization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionKey(pub String);

impl PartitionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The single partition used when the ledger is not split by tenant.
    pub fn global() -> Self {
        Self("global".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The caller-supplied half of an audit event.
///
/// `actor`, `event_type`, `entity` and `operation` are required; the builder
/// rejects the event if any is missing or blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub entity: Option<String>,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub old_data: Option<CanonicalValue>,
    #[serde(default)]
    pub new_data: Option<CanonicalValue>,
}

impl RawEvent {
    /// Start a raw event with the four required classification fields.
    pub fn new(
        actor: impl Into<String>,
        event_type: impl Into<String>,
        entity: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        Self {
            actor: Some(actor.into()),
            event_type: Some(event_type.into()),
            entity: Some(entity.into()),
            operation: Some(operation.into()),
            ..Self::default()
        }
    }

    pub fn with_entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn with_old_data(mut self, data: CanonicalValue) -> Self {
        self.old_data = Some(data);
        self
    }

    pub fn with_new_data(mut self, data: CanonicalValue) -> Self {
        self.new_data = Some(data);
        self
    }
}

/// A sealed audit row.
///
/// Once built, an event is never modified.  Changing any hashed field
/// invalidates `payload_hash`, and every later `chain_hash` in the same
/// partition depends on this one's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub id: Uuid,

    /// Correlates events from one logical operation.  Not hashed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,

    /// The chain this event belongs to.  Not hashed.
    pub partition: PartitionKey,

    pub actor: String,
    pub event_type: String,
    pub entity: String,
    #[serde(default)]
    pub entity_id: Option<String>,
    pub operation: String,
    #[serde(default)]
    pub old_data: Option<CanonicalValue>,
    #[serde(default)]
    pub new_data: Option<CanonicalValue>,

    /// SHA-256 (hex) of the canonical payload.
    pub payload_hash: String,

    /// SHA-256 (hex) of `payload_hash` followed by the previous event's
    /// `chain_hash`, or `GENESIS_HASH` for the first event.
    pub chain_hash: String,

    /// Server time at build, millisecond precision.
    pub created_at: DateTime<Utc>,
}

/// The tail of a partition as seen inside its append lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainHead {
    /// `chain_hash` of the last event, or `GENESIS_HASH` for an empty partition.
    pub chain_hash: String,
    /// `created_at` of the last event, if any.
    pub created_at: Option<DateTime<Utc>>,
    /// Number of events already in the partition.
    pub length: u64,
}

impl ChainHead {
    pub fn genesis() -> Self {
        Self {
            chain_hash: GENESIS_HASH.to_string(),
            created_at: None,
            length: 0,
        }
    }

    /// The head after `event` has been appended on top of `self`.
    pub fn advance(&self, event: &AuditEvent) -> Self {
        Self {
            chain_hash: event.chain_hash.clone(),
            created_at: Some(event.created_at),
            length: self.length + 1,
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.length == 0
    }
}

impl Default for ChainHead {
    fn default() -> Self {
        Self::genesis()
    }
}

/// An exported, ordered snapshot of one partition.
///
/// `terminal_hash` is the `chain_hash` of the last event and commits to the
/// whole partition; it is `GENESIS_HASH` when the partition is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionLog {
    pub format: String,
    pub partition: PartitionKey,
    pub events: Vec<AuditEvent>,
    pub exported_at: DateTime<Utc>,
    pub terminal_hash: String,
}
