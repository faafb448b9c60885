//! Decoding of event-stream payloads.
//!
//! Servers send either a bare detection record or an envelope
//! `{"type": ..., "timestamp": ..., "data": {...}}`. Only image envelopes
//! carry a [`DetectionEvent`]; group and delete envelopes are reported as
//! skipped so the caller can log them.

use crate::types::DetectionEvent;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WireError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload is not a JSON object")]
    NotAnObject,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Event(DetectionEvent),
    /// Envelope of a type that does not describe a single image.
    Skipped(String),
}

const IMAGE_ENVELOPES: [&str; 2] = ["new_image", "update_image"];

pub fn decode(payload: &str) -> Result<Payload, WireError> {
    let value: Value = serde_json::from_str(payload)?;
    let Value::Object(map) = &value else {
        return Err(WireError::NotAnObject);
    };

    let envelope_type = match (map.get("type"), map.get("data"), map.get("id")) {
        (Some(Value::String(kind)), Some(_), None) => Some(kind.as_str()),
        _ => None,
    };

    match envelope_type {
        Some(kind) if IMAGE_ENVELOPES.contains(&kind) => {
            let data = map.get("data").cloned().unwrap_or(Value::Null);
            Ok(Payload::Event(serde_json::from_value(data)?))
        }
        Some(kind) => Ok(Payload::Skipped(kind.to_string())),
        None => Ok(Payload::Event(serde_json::from_value(value)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EventKind, Source};

    #[test]
    fn test_bare_record() {
        let payload = r#"{"id": 4, "source": "upload", "faces_count": 1,
            "matches": [{"identity": "Alice", "confidence": 0.91}]}"#;
        let Payload::Event(event) = decode(payload).unwrap() else {
            panic!("expected event");
        };
        assert_eq!(event.id, 4);
        assert_eq!(event.source, Source::ManualUpload);
        assert_eq!(event.matches[0].identity, "Alice");
    }

    #[test]
    fn test_matches_as_bare_names() {
        let payload = r#"{"id": 1, "snapshot_url": "/snapshots/a.jpg",
            "timestamp": "2024-05-01T10:00:00Z", "matches": ["Alice", "Bob"]}"#;
        let Payload::Event(event) = decode(payload).unwrap() else {
            panic!("expected event");
        };
        assert_eq!(event.id, 1);
        assert!(event.is_recognized());
        assert_eq!(event.matches[0].identity, "Alice");
        assert_eq!(event.matches[0].confidence, 0.0);
        assert_eq!(event.matches[1].identity, "Bob");

        let mixed = r#"{"id": 2, "matches": ["Alice", {"identity": "Bob", "confidence": 0.8}]}"#;
        let Payload::Event(event) = decode(mixed).unwrap() else {
            panic!("expected event");
        };
        assert_eq!(event.matches[1].confidence, 0.8);
    }

    #[test]
    fn test_image_envelope() {
        let payload = r#"{"type": "update_image", "timestamp": "2024-05-01T10:00:00Z",
            "data": {"id": 9, "source": "frigate", "event_type": "update", "camera": "front"}}"#;
        let Payload::Event(event) = decode(payload).unwrap() else {
            panic!("expected event");
        };
        assert_eq!(event.id, 9);
        assert_eq!(event.event_kind, Some(EventKind::Update));
        assert_eq!(event.camera.as_deref(), Some("front"));
    }

    #[test]
    fn test_group_envelope_is_skipped() {
        let payload = r#"{"type": "new_group", "data": {"event_id": "abc", "count": 3}}"#;
        assert_eq!(decode(payload).unwrap(), Payload::Skipped("new_group".into()));
    }

    #[test]
    fn test_malformed_payloads() {
        assert!(matches!(decode("{not json"), Err(WireError::Json(_))));
        assert!(matches!(decode("[1, 2]"), Err(WireError::NotAnObject)));
        assert!(matches!(decode(r#"{"source": "upload"}"#), Err(WireError::Json(_))));
        assert!(matches!(
            decode(r#"{"type": "new_image", "data": null}"#),
            Err(WireError::Json(_))
        ));
    }
}
