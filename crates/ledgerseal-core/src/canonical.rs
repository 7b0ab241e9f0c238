//! Canonical serialization of `CanonicalValue`.
//!
//! The canonical form is compact JSON with a few extra rules so two callers
//! holding the same logical value always produce the same bytes:
//!
//! - object keys are sorted by the bytes of their quoted, normalized form;
//! - every string (keys included) is NFC-normalized before escaping;
//! - numbers use the shortest round-trip decimal text, never an exponent,
//!   and `-0` is written as `0`;
//! - NaN and the infinities are written as `null`;
//! - no whitespace anywhere.
//!
//! This encoding is part of the chain format.  Any change to it breaks every
//! hash already issued.

use std::fmt::Write as _;

use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

use ledgerseal_contracts::{
    error::{LedgerError, LedgerResult},
    value::CanonicalValue,
};

/// Maximum nesting of arrays and objects accepted by `canonicalize`.
pub const MAX_DEPTH: usize = 128;

/// Produce the canonical string for `value`.
///
/// Returns `LedgerError::InvalidInput` when the value nests deeper than
/// `MAX_DEPTH`, or when an object holds two keys that are equal after NFC
/// normalization.
pub fn canonicalize(value: &CanonicalValue) -> LedgerResult<String> {
    let mut output = String::new();
    emit_value(value, &mut output, 0)?;
    Ok(output)
}

/// Convert a serializable host value and canonicalize it.
pub fn canonicalize_serialize<T: Serialize + ?Sized>(value: &T) -> LedgerResult<String> {
    canonicalize(&CanonicalValue::from_serialize(value)?)
}

fn emit_value(value: &CanonicalValue, output: &mut String, depth: usize) -> LedgerResult<()> {
    match value {
        CanonicalValue::Null => output.push_str("null"),
        CanonicalValue::Bool(b) => output.push_str(if *b { "true" } else { "false" }),
        CanonicalValue::Number(n) => emit_number(*n, output),
        CanonicalValue::String(s) => emit_string(s, output),
        CanonicalValue::Array(items) => {
            check_depth(depth)?;
            output.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    output.push(',');
                }
                emit_value(item, output, depth + 1)?;
            }
            output.push(']');
        }
        CanonicalValue::Object(entries) => {
            check_depth(depth)?;
            emit_object(entries, output, depth)?;
        }
    }
    Ok(())
}

fn check_depth(depth: usize) -> LedgerResult<()> {
    if depth >= MAX_DEPTH {
        return Err(LedgerError::InvalidInput {
            reason: format!("value nests deeper than {} levels", MAX_DEPTH),
        });
    }
    Ok(())
}

fn emit_number(n: f64, output: &mut String) {
    if !n.is_finite() {
        output.push_str("null");
    } else if n == 0.0 {
        // Folds -0 into 0.
        output.push('0');
    } else {
        // f64 Display is the shortest round-trip decimal and never uses an
        // exponent; integral values print without a fraction.
        let _ = write!(output, "{}", n);
    }
}

/// Quote `s` after NFC normalization.
///
/// Only `"`, `\` and U+0000..=U+001F are escaped.  The short escapes are used
/// where JSON defines them, `\u00xx` otherwise.
fn emit_string(s: &str, output: &mut String) {
    output.push('"');
    for c in s.nfc() {
        match c {
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\u{0008}' => output.push_str("\\b"),
            '\u{000C}' => output.push_str("\\f"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            c if c <= '\u{001F}' => {
                let _ = write!(output, "\\u{:04x}", c as u32);
            }
            c => output.push(c),
        }
    }
    output.push('"');
}

fn emit_object(
    entries: &[(String, CanonicalValue)],
    output: &mut String,
    depth: usize,
) -> LedgerResult<()> {
    let mut quoted: Vec<(String, &CanonicalValue)> = entries
        .iter()
        .map(|(key, value)| {
            let mut encoded = String::with_capacity(key.len() + 2);
            emit_string(key, &mut encoded);
            (encoded, value)
        })
        .collect();
    // String ordering is byte-wise over UTF-8.
    quoted.sort_by(|a, b| a.0.cmp(&b.0));

    if let Some(pair) = quoted.windows(2).find(|pair| pair[0].0 == pair[1].0) {
        return Err(LedgerError::InvalidInput {
            reason: format!("duplicate object key {} after normalization", pair[0].0),
        });
    }

    output.push('{');
    for (i, (key, value)) in quoted.iter().enumerate() {
        if i > 0 {
            output.push(',');
        }
        output.push_str(key);
        output.push(':');
        emit_value(value, output, depth + 1)?;
    }
    output.push('}');
    Ok(())
}
