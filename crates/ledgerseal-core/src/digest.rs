//! SHA-256 digests rendered as lowercase hex.

use sha2::{Digest, Sha256};

use ledgerseal_contracts::{error::LedgerResult, value::CanonicalValue};

use crate::canonical::canonicalize;

/// Length of every digest string produced by this module.
pub const DIGEST_HEX_LEN: usize = 64;

/// SHA-256 of `bytes` as a 64-character lowercase hex string.
pub fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Digest of the UTF-8 bytes of the canonical form of `value`.
pub fn digest_canonical(value: &CanonicalValue) -> LedgerResult<String> {
    Ok(digest(canonicalize(value)?.as_bytes()))
}

/// True when `s` has the shape of a digest from this module.
pub fn is_hex_digest(s: &str) -> bool {
    s.len() == DIGEST_HEX_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
