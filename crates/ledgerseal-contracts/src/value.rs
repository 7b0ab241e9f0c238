//! The structured value type that audit snapshots are expressed in.
//!
//! `CanonicalValue` is a closed tagged union over the JSON data model.
//! Snapshots (`old_data` / `new_data`) arrive from business code as arbitrary
//! serde values and are converted into this type once, at the boundary, so
//! the canonicalizer can match on every variant exhaustively.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{LedgerError, LedgerResult};

/// A structured value that can be canonicalized and hashed.
///
/// `Object` keeps entries in the order they were supplied.  Ordering is
/// irrelevant to the canonical form (keys are sorted at canonicalization
/// time) but keeping it lets callers round-trip snapshots untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum CanonicalValue {
    Null,
    Bool(bool),
    /// Any IEEE-754 double.  Non-finite values canonicalize to `null`.
    Number(f64),
    String(String),
    Array(Vec<CanonicalValue>),
    Object(Vec<(String, CanonicalValue)>),
}

impl CanonicalValue {
    /// Build an `Object` from `(key, value)` pairs, preserving their order.
    pub fn object<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<CanonicalValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        CanonicalValue::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Convert any serializable host value into a `CanonicalValue`.
    ///
    /// Returns `LedgerError::InvalidInput` when serde cannot represent the
    /// value as JSON (for example a map with non-string keys).
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> LedgerResult<Self> {
        let json = serde_json::to_value(value).map_err(|e| LedgerError::InvalidInput {
            reason: format!("value is not serializable: {}", e),
        })?;
        Self::try_from(json)
    }

    /// Look up a key in an `Object`.  Returns `None` for every other variant.
    pub fn get(&self, key: &str) -> Option<&CanonicalValue> {
        match self {
            CanonicalValue::Object(entries) => {
                entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
            }
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CanonicalValue::Null)
    }
}

/// Every JSON number becomes a double.  Integers beyond 2^53 round to the
/// nearest representable value, so `9007199254740993` and `9007199254740992`
/// canonicalize (and hash) identically; carry such ids as strings.
impl TryFrom<Value> for CanonicalValue {
    type Error = LedgerError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Ok(match value {
            Value::Null => CanonicalValue::Null,
            Value::Bool(b) => CanonicalValue::Bool(b),
            Value::Number(n) => match n.as_f64() {
                Some(f) => CanonicalValue::Number(f),
                None => {
                    return Err(LedgerError::InvalidInput {
                        reason: format!("number '{}' is not representable as a double", n),
                    })
                }
            },
            Value::String(s) => CanonicalValue::String(s),
            Value::Array(items) => CanonicalValue::Array(
                items
                    .into_iter()
                    .map(CanonicalValue::try_from)
                    .collect::<LedgerResult<Vec<_>>>()?,
            ),
            Value::Object(map) => CanonicalValue::Object(
                map.into_iter()
                    .map(|(k, v)| CanonicalValue::try_from(v).map(|v| (k, v)))
                    .collect::<LedgerResult<Vec<_>>>()?,
            ),
        })
    }
}

impl From<CanonicalValue> for Value {
    fn from(value: CanonicalValue) -> Self {
        match value {
            CanonicalValue::Null => Value::Null,
            CanonicalValue::Bool(b) => Value::Bool(b),
            CanonicalValue::Number(n) => {
                // Emit integral doubles as JSON integers so exports stay readable.
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
                    Value::from(n as i64)
                } else {
                    serde_json::Number::from_f64(n)
                        .map(Value::Number)
                        .unwrap_or(Value::Null)
                }
            }
            CanonicalValue::String(s) => Value::String(s),
            CanonicalValue::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            CanonicalValue::Object(entries) => {
                let mut map = Map::new();
                for (k, v) in entries {
                    map.insert(k, Value::from(v));
                }
                Value::Object(map)
            }
        }
    }
}

impl From<bool> for CanonicalValue {
    fn from(b: bool) -> Self {
        CanonicalValue::Bool(b)
    }
}

impl From<f64> for CanonicalValue {
    fn from(n: f64) -> Self {
        CanonicalValue::Number(n)
    }
}

impl From<i64> for CanonicalValue {
    fn from(n: i64) -> Self {
        CanonicalValue::Number(n as f64)
    }
}

impl From<&str> for CanonicalValue {
    fn from(s: &str) -> Self {
        CanonicalValue::String(s.to_string())
    }
}

impl From<String> for CanonicalValue {
    fn from(s: String) -> Self {
        CanonicalValue::String(s)
    }
}

impl From<Vec<CanonicalValue>> for CanonicalValue {
    fn from(items: Vec<CanonicalValue>) -> Self {
        CanonicalValue::Array(items)
    }
}

impl<T: Into<CanonicalValue>> From<Option<T>> for CanonicalValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CanonicalValue::Null)
    }
}
