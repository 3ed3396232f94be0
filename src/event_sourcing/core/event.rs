use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use anyhow::Result;

// ============================================================================
// Event Envelope - Event Metadata for the Journal
// ============================================================================
//
// Wraps domain events with metadata before they are journaled.
// Generic over the event type.
//
// ============================================================================

/// Generic Event Envelope - wraps any domain event with metadata
///
/// Type Parameter:
/// - `E`: The domain event type
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EventEnvelope<E> {
    // Event Identity
    pub event_id: Uuid,
    pub aggregate_id: Uuid,
    pub sequence_number: i64,

    // Event Type Information
    pub event_type: String,
    pub event_version: i32,

    // Event Payload
    pub event_data: E,

    // Causation & Correlation
    pub causation_id: Option<Uuid>,
    pub correlation_id: Uuid,            // Groups events written by one request

    // Actor Information
    pub user_id: Option<Uuid>,           // Who triggered this event

    // Timing
    pub timestamp: DateTime<Utc>,

    // Additional Metadata
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        aggregate_id: Uuid,
        sequence_number: i64,
        event_type: String,
        event_data: E,
        correlation_id: Uuid,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            aggregate_id,
            sequence_number,
            event_type,
            event_version: 1,
            event_data,
            causation_id: None,
            correlation_id,
            user_id: None,
            timestamp,
            metadata: HashMap::new(),
        }
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

// ============================================================================
// Domain Event Trait
// ============================================================================

/// Domain events name themselves so the journal can be read without
/// deserializing the payload.
pub trait DomainEvent: Serialize + for<'de> Deserialize<'de> + Clone + Send + Sync {
    fn event_type(&self) -> &'static str;
}

// ============================================================================
// Event Serialization Helpers
// ============================================================================

pub fn serialize_event<E: Serialize>(event: &E) -> Result<String> {
    Ok(serde_json::to_string(event)?)
}

pub fn deserialize_event<E: for<'de> Deserialize<'de>>(json: &str) -> Result<E> {
    Ok(serde_json::from_str(json)?)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    struct TestEvent {
        data: String,
    }

    impl DomainEvent for TestEvent {
        fn event_type(&self) -> &'static str { "TestEvent" }
    }

    #[test]
    fn test_event_envelope_creation() {
        let aggregate_id = Uuid::new_v4();
        let correlation_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        let event = TestEvent {
            data: "test".to_string(),
        };

        let envelope = EventEnvelope::new(
            aggregate_id,
            1,
            event.event_type().to_string(),
            event,
            correlation_id,
            now,
        )
        .with_user(user_id)
        .with_metadata("store_id", "42");

        assert_eq!(envelope.aggregate_id, aggregate_id);
        assert_eq!(envelope.sequence_number, 1);
        assert_eq!(envelope.event_type, "TestEvent");
        assert_eq!(envelope.correlation_id, correlation_id);
        assert_eq!(envelope.user_id, Some(user_id));
        assert_eq!(envelope.timestamp, now);
        assert_eq!(envelope.metadata.get("store_id").map(String::as_str), Some("42"));
    }

    #[test]
    fn test_envelope_survives_journal_encoding() {
        let envelope = EventEnvelope::new(
            Uuid::new_v4(),
            3,
            "TestEvent".to_string(),
            TestEvent { data: "test data".to_string() },
            Uuid::new_v4(),
            Utc::now(),
        );

        let json = serialize_event(&envelope).unwrap();
        let decoded: EventEnvelope<TestEvent> = deserialize_event(&json).unwrap();

        assert_eq!(decoded, envelope);
    }
}
