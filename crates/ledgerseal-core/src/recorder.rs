//! The audit recorder: the entry point business code calls after (or as part
//! of) a protected mutation.
//!
//!   RawEvent → validate → [partition lock: read head → build → append] → log
//!
//! The recorder holds no chain state of its own.  The head of each partition
//! is read from the store inside the append, so several recorders (or several
//! server processes sharing one store) never fork a chain.

use std::sync::Arc;

use tracing::{info, warn};

use ledgerseal_contracts::{
    error::LedgerResult,
    event::{AuditEvent, PartitionKey, RawEvent},
};

use crate::{builder::EventBuilder, traits::EventStore};

/// Records audit events into an `EventStore`.
pub struct AuditRecorder {
    store: Arc<dyn EventStore>,
    builder: EventBuilder,
}

impl AuditRecorder {
    /// A recorder using the system clock.
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self::with_builder(store, EventBuilder::default())
    }

    pub fn with_builder(store: Arc<dyn EventStore>, builder: EventBuilder) -> Self {
        Self { store, builder }
    }

    /// Seal `raw` onto the head of `partition` and append it.
    ///
    /// # Errors
    ///
    /// `ValidationError` and `InvalidInput` from the builder (nothing is
    /// appended), or `StoreError` from the store.  A caller that gets an error
    /// here must not commit the business change it was auditing.
    pub fn record(&self, partition: &PartitionKey, raw: &RawEvent) -> LedgerResult<AuditEvent> {
        let builder = &self.builder;
        let result = self
            .store
            .append_with(partition, &mut |head| builder.build(partition, raw, head));

        match result {
            Ok(event) => {
                info!(
                    partition = %partition,
                    event_id = %event.id,
                    actor = %event.actor,
                    entity = %event.entity,
                    operation = %event.operation,
                    chain_hash = %event.chain_hash,
                    "audit event recorded"
                );
                Ok(event)
            }
            Err(e) => {
                warn!(
                    partition = %partition,
                    error = %e,
                    "audit event rejected"
                );
                Err(e)
            }
        }
    }

    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use ledgerseal_contracts::{
        error::LedgerError,
        event::{ChainHead, GENESIS_HASH},
    };

    use crate::{link::chain_hash, traits::BuildFn};

    use super::*;

    // ── Mock helpers ─────────────────────────────────────────────────────────

    /// A single-partition store that keeps appended events in a Vec.
    struct MockStore {
        events: Mutex<Vec<AuditEvent>>,
        fail_appends: bool,
    }

    impl MockStore {
        fn new() -> Self {
            Self {
                events: Mutex::new(vec![]),
                fail_appends: false,
            }
        }
    }

    impl EventStore for MockStore {
        fn append_with(
            &self,
            _partition: &PartitionKey,
            build: &mut BuildFn<'_>,
        ) -> LedgerResult<AuditEvent> {
            let mut events = self.events.lock().unwrap();
            let head = events
                .iter()
                .fold(ChainHead::genesis(), |head, e| head.advance(e));
            let event = build(&head)?;
            if self.fail_appends {
                return Err(LedgerError::StoreError {
                    reason: "disk full".to_string(),
                });
            }
            events.push(event.clone());
            Ok(event)
        }

        fn head(&self, _partition: &PartitionKey) -> LedgerResult<ChainHead> {
            let events = self.events.lock().unwrap();
            Ok(events
                .iter()
                .fold(ChainHead::genesis(), |head, e| head.advance(e)))
        }

        fn scan(
            &self,
            _partition: &PartitionKey,
            from: usize,
            limit: Option<usize>,
        ) -> LedgerResult<Vec<AuditEvent>> {
            let events = self.events.lock().unwrap();
            Ok(events
                .iter()
                .skip(from)
                .take(limit.unwrap_or(usize::MAX))
                .cloned()
                .collect())
        }

        fn partitions(&self) -> LedgerResult<Vec<PartitionKey>> {
            Ok(vec![PartitionKey::global()])
        }
    }

    // ── Tests ────────────────────────────────────────────────────────────────

    #[test]
    fn test_record_links_onto_store_head() {
        let store = Arc::new(MockStore::new());
        let recorder = AuditRecorder::new(store.clone());
        let partition = PartitionKey::global();

        let a = recorder
            .record(&partition, &RawEvent::new("u1", "financial", "invoice", "create"))
            .unwrap();
        let b = recorder
            .record(&partition, &RawEvent::new("u1", "financial", "invoice", "update"))
            .unwrap();

        assert_eq!(a.chain_hash, chain_hash(&a.payload_hash, GENESIS_HASH));
        assert_eq!(b.chain_hash, chain_hash(&b.payload_hash, &a.chain_hash));
        assert_eq!(store.last_chain_hash(&partition).unwrap(), b.chain_hash);
        assert_eq!(store.scan(&partition, 0, None).unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_event_is_not_appended() {
        let store = Arc::new(MockStore::new());
        let recorder = AuditRecorder::new(store.clone());

        let raw = RawEvent {
            actor: None,
            ..RawEvent::new("u1", "access", "user", "grant")
        };
        let err = recorder.record(&PartitionKey::global(), &raw).unwrap_err();

        assert!(matches!(err, LedgerError::ValidationError { .. }));
        assert!(store.events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_store_failure_is_surfaced() {
        let store = Arc::new(MockStore {
            events: Mutex::new(vec![]),
            fail_appends: true,
        });
        let recorder = AuditRecorder::new(store);

        let err = recorder
            .record(
                &PartitionKey::global(),
                &RawEvent::new("u1", "financial", "payment", "post"),
            )
            .unwrap_err();

        assert!(matches!(err, LedgerError::StoreError { .. }));
    }

    #[test]
    fn test_recorders_sharing_a_store_do_not_fork() {
        let store: Arc<dyn EventStore> = Arc::new(MockStore::new());
        let first = AuditRecorder::new(store.clone());
        let second = AuditRecorder::new(store.clone());
        let partition = PartitionKey::global();

        let a = first
            .record(&partition, &RawEvent::new("u1", "admin", "role", "grant"))
            .unwrap();
        let b = second
            .record(&partition, &RawEvent::new("u2", "admin", "role", "revoke"))
            .unwrap();

        assert_eq!(b.chain_hash, chain_hash(&b.payload_hash, &a.chain_hash));
    }
}
