//! Error types for the ledgerseal audit pipeline.
//!
//! All fallible operations return `LedgerResult<T>`.  Verification outcomes
//! (`PayloadTampered`, `ChainBroken`) are not errors; they are reported as
//! values through `VerificationResult` so an operator always sees them.

use thiserror::Error;

/// The unified error type for the ledgerseal crates.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A value could not be canonicalized (too deeply nested, colliding keys
    /// after normalization, or not representable as a `CanonicalValue`).
    ///
    /// This is a caller bug and is never retried.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// A raw event is missing a field that every audit record must carry.
    ///
    /// The business transaction emitting the event should fail with it.
    #[error("validation error on '{field}': {reason}")]
    ValidationError { field: String, reason: String },

    /// The event store could not read a partition head or append an event.
    #[error("event store error: {reason}")]
    StoreError { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// Reading or writing an export file failed.
    #[error("i/o error: {reason}")]
    Io { reason: String },
}

/// Convenience alias used throughout the ledgerseal crates.
pub type LedgerResult<T> = Result<T, LedgerError>;
