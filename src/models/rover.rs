// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rover state update model.
//!
//! Callers send an arbitrary JSON object. Only `id` is required; every other
//! field is stored as-is. After merging, the system always overwrites the two
//! reserved keys:
//! - `id` with the trimmed rover ID
//! - `timestamp` with the server write time

use super::Fields;
use crate::error::AppError;
use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Reserved key holding the rover ID (also the state document ID).
pub const ID_FIELD: &str = "id";
/// Reserved key holding the server write time.
pub const TIMESTAMP_FIELD: &str = "timestamp";
/// Key under which a rover log entry's own document ID is returned.
pub const LOG_ID_FIELD: &str = "log_id";

/// Firestore rejects document IDs longer than this many bytes.
const MAX_DOCUMENT_ID_BYTES: usize = 1500;

const MISSING_ID: &str = "JSON with 'id' field required";

/// A validated rover update, ready to be written to both collections.
#[derive(Debug, Clone, PartialEq)]
pub struct RoverUpdate {
    /// Trimmed rover ID
    pub id: String,
    /// Server write time, shared by the state document and the log entry
    pub timestamp: DateTime<Utc>,
    /// Caller-supplied fields with the reserved keys removed
    pub fields: Fields,
}

impl RoverUpdate {
    /// Parse a raw request body.
    pub fn from_slice(body: &[u8], timestamp: DateTime<Utc>) -> Result<Self, AppError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(AppError::BadRequest(MISSING_ID.to_string()));
        }

        let value: Value = serde_json::from_slice(body)
            .map_err(|e| AppError::BadRequest(format!("Malformed JSON body: {}", e)))?;

        Self::from_value(value, timestamp)
    }

    /// Validate a decoded body and split off the reserved keys.
    pub fn from_value(body: Value, timestamp: DateTime<Utc>) -> Result<Self, AppError> {
        let Value::Object(object) = body else {
            return Err(AppError::BadRequest(
                "Request body must be a JSON object".to_string(),
            ));
        };

        let id = match object.get(ID_FIELD) {
            Some(Value::String(raw)) => raw.trim().to_string(),
            Some(Value::Null) | None => String::new(),
            Some(_) => {
                return Err(AppError::BadRequest(
                    "Field 'id' must be a string".to_string(),
                ))
            }
        };

        if id.is_empty() {
            return Err(AppError::BadRequest(MISSING_ID.to_string()));
        }
        validate_document_id(&id)?;

        let fields = object
            .into_iter()
            .filter(|(key, _)| key != ID_FIELD && key != TIMESTAMP_FIELD)
            .collect();

        Ok(Self {
            id,
            timestamp,
            fields,
        })
    }

    /// The full document: caller fields, then the reserved keys.
    ///
    /// The timestamp is rendered as an RFC3339 string; stores with a native
    /// timestamp type write [`RoverUpdate::timestamp`] directly instead.
    pub fn to_document(&self) -> Fields {
        let mut doc = self.fields.clone();
        doc.insert(ID_FIELD.to_string(), Value::String(self.id.clone()));
        doc.insert(
            TIMESTAMP_FIELD.to_string(),
            Value::String(format_utc_rfc3339(self.timestamp)),
        );
        doc
    }
}

/// Reject IDs Firestore cannot use as a document key.
fn validate_document_id(id: &str) -> Result<(), AppError> {
    let invalid = |reason: &str| AppError::BadRequest(format!("Invalid rover id: {}", reason));

    if id.contains('/') {
        return Err(invalid("must not contain '/'"));
    }
    if id == "." || id == ".." {
        return Err(invalid("must not be '.' or '..'"));
    }
    if id.len() >= 4 && id.starts_with("__") && id.ends_with("__") {
        return Err(invalid("names of the form __*__ are reserved"));
    }
    if id.len() > MAX_DOCUMENT_ID_BYTES {
        return Err(invalid("too long"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_704_103_200, 0).unwrap()
    }

    fn bad_request(result: Result<RoverUpdate, AppError>) -> String {
        match result {
            Err(AppError::BadRequest(msg)) => msg,
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }

    #[test]
    fn test_id_is_trimmed() {
        let update =
            RoverUpdate::from_value(json!({"id": "  rover1  ", "battery": 42}), now()).unwrap();

        assert_eq!(update.id, "rover1");
        assert_eq!(update.fields.get("battery"), Some(&json!(42)));
        assert!(!update.fields.contains_key(ID_FIELD));
    }

    #[test]
    fn test_reserved_keys_are_overwritten() {
        let update = RoverUpdate::from_value(
            json!({"id": " r2 ", "timestamp": "1999-01-01T00:00:00Z", "status": "idle"}),
            now(),
        )
        .unwrap();
        let doc = update.to_document();

        assert_eq!(doc["id"], "r2");
        assert_eq!(doc["timestamp"], "2024-01-01T10:00:00.000000Z");
        assert_eq!(doc["status"], "idle");
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn test_nested_fields_kept_as_is() {
        let body = json!({
            "id": "r3",
            "position": {"lat": 37.42, "lon": -122.08},
            "sensors": [1, 2, 3]
        });
        let update = RoverUpdate::from_value(body, now()).unwrap();

        assert_eq!(update.fields["position"]["lat"], 37.42);
        assert_eq!(update.fields["sensors"], json!([1, 2, 3]));
    }

    #[test]
    fn test_rejects_missing_or_blank_id() {
        for body in [
            json!({}),
            json!({"id": ""}),
            json!({"id": "   "}),
            json!({"id": null}),
            json!({"battery": 42}),
        ] {
            assert_eq!(bad_request(RoverUpdate::from_value(body, now())), MISSING_ID);
        }
    }

    #[test]
    fn test_rejects_non_object_bodies() {
        for body in [json!([]), json!("rover1"), json!(5), Value::Null] {
            bad_request(RoverUpdate::from_value(body, now()));
        }
    }

    #[test]
    fn test_rejects_non_string_id() {
        let msg = bad_request(RoverUpdate::from_value(json!({"id": 7}), now()));
        assert!(msg.contains("string"));
    }

    #[test]
    fn test_rejects_unusable_document_ids() {
        let long = "x".repeat(1501);
        for id in ["a/b", ".", "..", "__reserved__", long.as_str()] {
            let msg = bad_request(RoverUpdate::from_value(json!({ "id": id }), now()));
            assert!(msg.starts_with("Invalid rover id"), "{}", msg);
        }
    }

    #[test]
    fn test_from_slice() {
        assert!(RoverUpdate::from_slice(br#"{"id":"r1"}"#, now()).is_ok());
        bad_request(RoverUpdate::from_slice(b"", now()));
        bad_request(RoverUpdate::from_slice(b"  \n", now()));
        bad_request(RoverUpdate::from_slice(b"{not json", now()));
    }
}
