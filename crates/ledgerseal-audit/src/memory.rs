//! In-memory implementation of `EventStore`.
//!
//! `InMemoryEventStore` is the reference store.  Each partition lives behind
//! its own `Mutex`, so appends to one partition serialize while appends to
//! different partitions proceed in parallel.  The outer map lock is held only
//! long enough to find or create a partition.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use tracing::debug;

use ledgerseal_contracts::{
    error::{LedgerError, LedgerResult},
    event::{AuditEvent, ChainHead, PartitionKey},
};
use ledgerseal_core::traits::{BuildFn, EventStore};

// ── Internal mutable state ────────────────────────────────────────────────────

/// One partition's rows and cached head.
#[derive(Default)]
pub(crate) struct PartitionState {
    /// All events appended so far, in append order.
    pub(crate) events: Vec<AuditEvent>,

    /// Head after the last append; genesis for an empty partition.
    pub(crate) head: ChainHead,
}

type SharedPartition = Arc<Mutex<PartitionState>>;

// ── Public store ─────────────────────────────────────────────────────────────

/// An append-only, partitioned event store held in memory.
#[derive(Default)]
pub struct InMemoryEventStore {
    partitions: Mutex<HashMap<PartitionKey, SharedPartition>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a partition with already-sealed events, e.g. from an export.
    ///
    /// The events are stored as given and are not verified; run the chain
    /// verifier over the partition to check them.
    pub fn import(&self, partition: &PartitionKey, events: Vec<AuditEvent>) -> LedgerResult<()> {
        if let Some(stray) = events.iter().find(|e| &e.partition != partition) {
            return Err(LedgerError::StoreError {
                reason: format!(
                    "event {} belongs to partition '{}', not '{}'",
                    stray.id, stray.partition, partition
                ),
            });
        }

        let shared = self.partition(partition, true)?.ok_or_else(|| LedgerError::StoreError {
            reason: format!("partition '{}' could not be created", partition),
        })?;
        let mut state = lock(&shared, partition)?;
        for event in events {
            state.head = state.head.advance(&event);
            state.events.push(event);
        }
        Ok(())
    }

    /// Number of events in `partition`.
    pub fn len(&self, partition: &PartitionKey) -> LedgerResult<usize> {
        Ok(self.head(partition)?.length as usize)
    }

    pub(crate) fn partition(
        &self,
        key: &PartitionKey,
        create: bool,
    ) -> LedgerResult<Option<SharedPartition>> {
        let mut map = self.partitions.lock().map_err(|e| LedgerError::StoreError {
            reason: format!("partition map lock poisoned: {}", e),
        })?;
        if let Some(existing) = map.get(key) {
            return Ok(Some(existing.clone()));
        }
        if !create {
            return Ok(None);
        }
        let shared = SharedPartition::default();
        map.insert(key.clone(), shared.clone());
        Ok(Some(shared))
    }
}

fn lock<'a>(
    shared: &'a SharedPartition,
    key: &PartitionKey,
) -> LedgerResult<MutexGuard<'a, PartitionState>> {
    shared.lock().map_err(|e| LedgerError::StoreError {
        reason: format!("partition '{}' lock poisoned: {}", key, e),
    })
}

// ── EventStore impl ──────────────────────────────────────────────────────────

impl EventStore for InMemoryEventStore {
    /// Holds the partition lock across head read, build, and push.
    fn append_with(
        &self,
        partition: &PartitionKey,
        build: &mut BuildFn<'_>,
    ) -> LedgerResult<AuditEvent> {
        let shared = self.partition(partition, true)?.ok_or_else(|| LedgerError::StoreError {
            reason: format!("partition '{}' could not be created", partition),
        })?;
        let mut state = lock(&shared, partition)?;

        let event = build(&state.head)?;
        if &event.partition != partition {
            return Err(LedgerError::StoreError {
                reason: format!(
                    "event built for partition '{}' cannot be appended to '{}'",
                    event.partition, partition
                ),
            });
        }

        state.head = state.head.advance(&event);
        state.events.push(event.clone());

        debug!(
            partition = %partition,
            length = state.head.length,
            "event appended"
        );

        Ok(event)
    }

    fn head(&self, partition: &PartitionKey) -> LedgerResult<ChainHead> {
        match self.partition(partition, false)? {
            Some(shared) => Ok(lock(&shared, partition)?.head.clone()),
            None => Ok(ChainHead::genesis()),
        }
    }

    fn scan(
        &self,
        partition: &PartitionKey,
        from: usize,
        limit: Option<usize>,
    ) -> LedgerResult<Vec<AuditEvent>> {
        let Some(shared) = self.partition(partition, false)? else {
            return Ok(Vec::new());
        };
        let state = lock(&shared, partition)?;
        Ok(state
            .events
            .iter()
            .skip(from)
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    fn partitions(&self) -> LedgerResult<Vec<PartitionKey>> {
        let entries: Vec<(PartitionKey, SharedPartition)> = {
            let map = self.partitions.lock().map_err(|e| LedgerError::StoreError {
                reason: format!("partition map lock poisoned: {}", e),
            })?;
            map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        };

        // A failed first append leaves an empty partition behind; skip those.
        let mut keys = Vec::with_capacity(entries.len());
        for (key, shared) in entries {
            if !lock(&shared, &key)?.head.is_genesis() {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}
