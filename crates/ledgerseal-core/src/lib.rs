//! # ledgerseal-core
//!
//! Canonicalization, hashing, and hash-chain linking for the ledgerseal
//! audit ledger.
//!
//! This crate provides:
//! - `canonical`: the deterministic encoding every hash is computed over
//! - `digest`: SHA-256 to lowercase hex
//! - `link`: payload hash and chain hash computation
//! - `builder`: sealing a `RawEvent` onto a partition head
//! - `traits`: the `EventStore` and `Clock` seams
//! - `recorder`: the `AuditRecorder` that wires builder and store together
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ledgerseal_core::AuditRecorder;
//!
//! let recorder = AuditRecorder::new(store);
//! let event = recorder.record(
//!     &PartitionKey::new("org-42"),
//!     &RawEvent::new("u1", "financial", "invoice", "create"),
//! )?;
//! ```

pub mod builder;
pub mod canonical;
pub mod digest;
pub mod link;
pub mod recorder;
pub mod traits;

pub use builder::EventBuilder;
pub use canonical::{canonicalize, canonicalize_serialize, MAX_DEPTH};
pub use digest::{digest, digest_canonical, is_hex_digest};
pub use link::{chain_hash, payload_hash};
pub use recorder::AuditRecorder;
pub use traits::{Clock, EventStore, SystemClock};
