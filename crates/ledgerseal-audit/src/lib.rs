//! # ledgerseal-audit
//!
//! Chain verification and event stores for the ledgerseal append-only audit
//! ledger.
//!
//! ## Overview
//!
//! Every audit event carries a `payload_hash` over its canonical content and
//! a `chain_hash` linking it to the previous event of its partition.
//! Editing, reordering or deleting a stored row breaks the chain, and
//! `verify` reports the first index where it breaks.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ledgerseal_audit::{verify_partition, InMemoryEventStore, DEFAULT_BATCH_SIZE};
//! use ledgerseal_core::AuditRecorder;
//!
//! let store = Arc::new(InMemoryEventStore::new());
//! let recorder = AuditRecorder::new(store.clone());
//! recorder.record(&partition, &raw_event)?;
//!
//! let report = verify_partition(store.as_ref(), &partition, DEFAULT_BATCH_SIZE)?;
//! assert!(report.result.is_valid());
//! ```

pub mod chain;
pub mod log;
pub mod memory;

pub use chain::{verify, verify_from, verify_partition, verify_resume, DEFAULT_BATCH_SIZE};
pub use log::{export_partition, verify_log};
pub use memory::InMemoryEventStore;

// ── Tests ─────────────────────────────────────────────────────────────────────
