//! Chain verification outcome types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why verification stopped at a given event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivergenceKind {
    /// The stored `payload_hash` does not match the event's stored content.
    PayloadTampered,
    /// The stored `chain_hash` does not link to the previous event.
    ChainBroken,
}

impl fmt::Display for DivergenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DivergenceKind::PayloadTampered => f.write_str("PayloadTampered"),
            DivergenceKind::ChainBroken => f.write_str("ChainBroken"),
        }
    }
}

/// The result of replaying a sequence of events.
///
/// Only the first divergence is reported: every later link is defined in
/// terms of the broken one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationResult {
    Valid,
    Invalid { index: usize, kind: DivergenceKind },
}

impl VerificationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerificationResult::Valid)
    }
}

impl fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationResult::Valid => f.write_str("Valid"),
            VerificationResult::Invalid { index, kind } => {
                write!(f, "Invalid({}, {})", index, kind)
            }
        }
    }
}

/// A resume point for partial verification.
///
/// `chain_hash` is the last trusted `chain_hash`, i.e. the hash of the event
/// at `next_index - 1` (or the genesis value when `next_index` is 0).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub next_index: usize,
    pub chain_hash: String,
}

/// Outcome of a (possibly partial) verification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub result: VerificationResult,
    /// Number of events that verified cleanly in this run.
    pub verified: usize,
    /// Where a follow-up run can resume.  On divergence this points at the
    /// diverging event, with the last hash that was still trustworthy.
    pub checkpoint: Checkpoint,
}
