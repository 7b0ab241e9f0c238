//! Sealing raw events into chained audit rows.

use std::sync::Arc;

use chrono::{DateTime, Timelike, Utc};
use tracing::debug;
use uuid::Uuid;

use ledgerseal_contracts::{
    error::{LedgerError, LedgerResult},
    event::{AuditEvent, ChainHead, PartitionKey, RawEvent},
};

use crate::{
    link::{chain_hash, payload_hash},
    traits::{Clock, SystemClock},
};

/// Turns a `RawEvent` plus the current partition head into an `AuditEvent`.
///
/// The builder is pure apart from reading the clock and drawing a fresh id;
/// it never writes anywhere.  Callers obtain `head` from the event store
/// inside the same atomic section that persists the result.
#[derive(Clone)]
pub struct EventBuilder {
    clock: Arc<dyn Clock>,
}

impl EventBuilder {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Validate `raw`, stamp it, and link it onto `head`.
    ///
    /// # Errors
    ///
    /// - `ValidationError` if `actor`, `event_type`, `entity` or `operation`
    ///   is missing or blank.
    /// - `InvalidInput` if a snapshot cannot be canonicalized.
    pub fn build(
        &self,
        partition: &PartitionKey,
        raw: &RawEvent,
        head: &ChainHead,
    ) -> LedgerResult<AuditEvent> {
        let actor = required("actor", &raw.actor)?;
        let event_type = required("eventType", &raw.event_type)?;
        let entity = required("entity", &raw.entity)?;
        let operation = required("operation", &raw.operation)?;

        let mut event = AuditEvent {
            id: Uuid::new_v4(),
            run_id: raw.run_id.clone(),
            partition: partition.clone(),
            actor,
            event_type,
            entity,
            entity_id: raw.entity_id.clone(),
            operation,
            old_data: raw.old_data.clone(),
            new_data: raw.new_data.clone(),
            payload_hash: String::new(),
            chain_hash: String::new(),
            created_at: self.timestamp(head),
        };

        event.payload_hash = payload_hash(&event)?;
        event.chain_hash = chain_hash(&event.payload_hash, &head.chain_hash);

        debug!(
            partition = %partition,
            event_id = %event.id,
            position = head.length,
            chain_hash = %event.chain_hash,
            "audit event sealed"
        );

        Ok(event)
    }

    /// Millisecond-precision server time, never earlier than the head.
    fn timestamp(&self, head: &ChainHead) -> DateTime<Utc> {
        let now = self.clock.now();
        let now = now
            .with_nanosecond(now.nanosecond() / 1_000_000 * 1_000_000)
            .unwrap_or(now);
        match head.created_at {
            Some(prev) if prev > now => prev,
            _ => now,
        }
    }
}

impl Default for EventBuilder {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

fn required(field: &str, value: &Option<String>) -> LedgerResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.clone()),
        Some(_) => Err(LedgerError::ValidationError {
            field: field.to_string(),
            reason: "required field is blank".to_string(),
        }),
        None => Err(LedgerError::ValidationError {
            field: field.to_string(),
            reason: "required field is missing".to_string(),
        }),
    }
}
