//! Trait seams between the ledger core and its collaborators.
//!
//! - `EventStore`: the durable, append-only home of audit rows
//! - `Clock`: the server time source stamped onto each event
//!
//! Hashing and verification never touch either trait; they are pure
//! functions over events.

use chrono::{DateTime, Utc};

use ledgerseal_contracts::{
    error::LedgerResult,
    event::{AuditEvent, ChainHead, PartitionKey},
};

/// Callback that seals an event on top of a partition head.
pub type BuildFn<'a> = dyn FnMut(&ChainHead) -> LedgerResult<AuditEvent> + 'a;

/// An append-only store of audit events, split into partitions.
///
/// Implementations back this with a database transaction, a partition row
/// lock, or an in-process mutex.  Whatever the mechanism, reading the head of
/// a partition and appending the next event must be one atomic step with
/// respect to other writers on the same partition; otherwise two writers can
/// link onto the same head and fork the chain.
pub trait EventStore: Send + Sync {
    /// Atomically read the head of `partition`, build the next event with
    /// `build`, and append it.
    ///
    /// If `build` fails nothing is written and its error is returned.  The
    /// event returned by `build` must belong to `partition`.
    fn append_with(
        &self,
        partition: &PartitionKey,
        build: &mut BuildFn<'_>,
    ) -> LedgerResult<AuditEvent>;

    /// The current head of `partition`.  An unknown partition is at genesis.
    fn head(&self, partition: &PartitionKey) -> LedgerResult<ChainHead>;

    /// Events of `partition` in insertion order, starting at index `from`.
    ///
    /// `limit` caps the number of events returned.
    fn scan(
        &self,
        partition: &PartitionKey,
        from: usize,
        limit: Option<usize>,
    ) -> LedgerResult<Vec<AuditEvent>>;

    /// Every partition holding at least one event.
    fn partitions(&self) -> LedgerResult<Vec<PartitionKey>>;

    /// The `chain_hash` a new event in `partition` would link onto.
    fn last_chain_hash(&self, partition: &PartitionKey) -> LedgerResult<String> {
        Ok(self.head(partition)?.chain_hash)
    }
}

/// Source of server time for new events.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
