//! # ledgerseal-contracts
//!
//! Shared types, schemas, and contracts for the ledgerseal audit ledger.
//!
//! All crates in the workspace import from here. No hashing or storage logic
//! lives in this crate; only data definitions and error types.

pub mod error;
pub mod event;
pub mod value;
pub mod verify;

#[cfg(test)]
mod tests {
    use super::*;
    use error::LedgerError;
    use event::{AuditEvent, ChainHead, PartitionKey, RawEvent, GENESIS_HASH};
    use serde_json::json;
    use value::CanonicalValue;
    use verify::{DivergenceKind, VerificationResult};

    // ── CanonicalValue conversions ───────────────────────────────────────────

    #[test]
    fn canonical_value_from_json_keeps_structure() {
        let value = CanonicalValue::try_from(json!({
            "unit": "4B",
            "rent": 1250.5,
            "tags": ["late", null, true]
        }))
        .unwrap();

        assert_eq!(value.get("unit"), Some(&CanonicalValue::from("4B")));
        assert_eq!(value.get("rent"), Some(&CanonicalValue::Number(1250.5)));
        assert_eq!(
            value.get("tags"),
            Some(&CanonicalValue::Array(vec![
                CanonicalValue::from("late"),
                CanonicalValue::Null,
                CanonicalValue::Bool(true),
            ]))
        );
        assert_eq!(value.get("missing"), None);
    }

    #[test]
    fn canonical_value_integral_numbers_export_as_integers() {
        let json: serde_json::Value = CanonicalValue::Number(42.0).into();
        assert_eq!(json, json!(42));

        let json: serde_json::Value = CanonicalValue::Number(f64::NAN).into();
        assert_eq!(json, serde_json::Value::Null);
    }

    #[test]
    fn canonical_value_from_serialize_rejects_non_string_keys() {
        let mut map = std::collections::HashMap::new();
        map.insert((1, 2), "pair-key");

        let err = CanonicalValue::from_serialize(&map).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput { .. }));
    }

    #[test]
    fn canonical_value_large_integers_collapse_to_doubles() {
        let above = CanonicalValue::try_from(json!(9007199254740993u64)).unwrap();
        let below = CanonicalValue::try_from(json!(9007199254740992u64)).unwrap();
        assert_eq!(above, below);
    }

    #[test]
    fn canonical_value_option_none_is_null() {
        let value: CanonicalValue = Option::<&str>::None.into();
        assert!(value.is_null());
    }

    // ── Events ───────────────────────────────────────────────────────────────

    #[test]
    fn raw_event_builder_sets_fields() {
        let raw = RawEvent::new("u1", "financial", "invoice", "create")
            .with_entity_id("inv-7")
            .with_run_id("run-1");

        assert_eq!(raw.actor.as_deref(), Some("u1"));
        assert_eq!(raw.event_type.as_deref(), Some("financial"));
        assert_eq!(raw.entity_id.as_deref(), Some("inv-7"));
        assert_eq!(raw.run_id.as_deref(), Some("run-1"));
        assert!(raw.old_data.is_none());
    }

    #[test]
    fn raw_event_deserializes_from_camel_case() {
        let raw: RawEvent = serde_json::from_value(json!({
            "actor": "system",
            "eventType": "admin",
            "entity": "role",
            "operation": "grant",
            "newData": {"role": "owner"}
        }))
        .unwrap();

        assert_eq!(raw.event_type.as_deref(), Some("admin"));
        assert!(raw.entity_id.is_none());
        assert_eq!(
            raw.new_data,
            Some(CanonicalValue::object([("role", "owner")]))
        );
    }

    #[test]
    fn audit_event_json_round_trips() {
        let event = AuditEvent {
            id: uuid::Uuid::new_v4(),
            run_id: None,
            partition: PartitionKey::new("org-1"),
            actor: "u1".to_string(),
            event_type: "financial".to_string(),
            entity: "invoice".to_string(),
            entity_id: Some("inv-1".to_string()),
            operation: "create".to_string(),
            old_data: None,
            new_data: Some(CanonicalValue::object([("amount", 100i64)])),
            payload_hash: "a".repeat(64),
            chain_hash: "b".repeat(64),
            created_at: chrono::Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["partition"], json!("org-1"));
        assert!(json.get("runId").is_none());

        let decoded: AuditEvent = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn chain_head_starts_at_genesis() {
        let head = ChainHead::genesis();
        assert!(head.is_genesis());
        assert_eq!(head.chain_hash, GENESIS_HASH);
        assert_eq!(GENESIS_HASH.len(), 64);
    }

    // ── Verification results ─────────────────────────────────────────────────

    #[test]
    fn verification_result_display() {
        assert_eq!(VerificationResult::Valid.to_string(), "Valid");
        let invalid = VerificationResult::Invalid {
            index: 3,
            kind: DivergenceKind::ChainBroken,
        };
        assert_eq!(invalid.to_string(), "Invalid(3, ChainBroken)");
        assert!(!invalid.is_valid());
    }

    #[test]
    fn verification_result_serializes_tagged() {
        let invalid = VerificationResult::Invalid {
            index: 1,
            kind: DivergenceKind::PayloadTampered,
        };
        let json = serde_json::to_value(invalid).unwrap();
        assert_eq!(
            json,
            json!({"status": "invalid", "index": 1, "kind": "payload_tampered"})
        );
    }

    // ── LedgerError display messages ─────────────────────────────────────────

    #[test]
    fn error_validation_display() {
        let err = LedgerError::ValidationError {
            field: "actor".to_string(),
            reason: "required field is missing".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("actor"));
        assert!(msg.contains("required field is missing"));
    }

    #[test]
    fn error_invalid_input_display() {
        let err = LedgerError::InvalidInput {
            reason: "nesting exceeds 128 levels".to_string(),
        };
        assert!(err.to_string().contains("invalid input"));
    }

    #[test]
    fn error_store_display() {
        let err = LedgerError::StoreError {
            reason: "partition lock poisoned".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("event store error"));
        assert!(msg.contains("partition lock poisoned"));
    }
}
