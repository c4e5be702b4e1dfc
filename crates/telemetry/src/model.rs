use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sessionstitch_core_types::SessionId;

/// One telemetry record as captured by the instrumented client.
///
/// Immutable once parsed; everything downstream works on borrowed views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "eventType")]
    pub event_type: EventType,
    #[serde(rename = "eventDetails")]
    pub event_details: EventDetails,
    pub timestamps: EventTimestamps,
    #[serde(rename = "sessionID")]
    pub session_id: SessionId,
}

impl RawEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamps.event_timestamp
    }

    pub fn category(&self) -> InteractionCategory {
        InteractionCategory::of(&self.event_details.name)
    }

    /// Raw detail field by name, whatever its JSON type.
    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.event_details.fields.get(key)
    }

    /// Detail field that is expected to be a plain string.
    pub fn detail_str(&self, key: &str) -> Option<&str> {
        self.detail(key).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "interactionEvent")]
    InteractionEvent,
    #[serde(rename = "customEvent")]
    CustomEvent,
}

/// The `eventDetails` object: a well-known `name` plus a bag of
/// category-specific fields, several of which are themselves JSON-encoded
/// strings (see [`crate::payload`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDetails {
    pub name: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventTimestamps {
    #[serde(rename = "eventTimestamp")]
    pub event_timestamp: DateTime<Utc>,
}

/// Closed classification of raw events by `eventDetails.name`.
///
/// Unrecognized names are not an error: the stream carries plenty of
/// instrumentation noise that the engine simply ignores.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum InteractionCategory {
    Click,
    Input,
    DomEffect,
    NetworkCall,
    Unrecognized,
}

impl InteractionCategory {
    pub fn of(event_name: &str) -> Self {
        match event_name {
            "click" | "dblclick" => Self::Click,
            "input" | "change" => Self::Input,
            "domMutation" => Self::DomEffect,
            "networkCall" | "webRequest" => Self::NetworkCall,
            _ => Self::Unrecognized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_known_event_names() {
        assert_eq!(InteractionCategory::of("click"), InteractionCategory::Click);
        assert_eq!(
            InteractionCategory::of("dblclick"),
            InteractionCategory::Click
        );
        assert_eq!(InteractionCategory::of("input"), InteractionCategory::Input);
        assert_eq!(
            InteractionCategory::of("change"),
            InteractionCategory::Input
        );
        assert_eq!(
            InteractionCategory::of("domMutation"),
            InteractionCategory::DomEffect
        );
        assert_eq!(
            InteractionCategory::of("webRequest"),
            InteractionCategory::NetworkCall
        );
        assert_eq!(
            InteractionCategory::of("scroll"),
            InteractionCategory::Unrecognized
        );
    }

    #[test]
    fn raw_event_round_trips_wire_shape() {
        let wire = json!({
            "eventType": "interactionEvent",
            "eventDetails": {
                "name": "click",
                "element": "{\"xpath\":\"/html/body\"}"
            },
            "timestamps": { "eventTimestamp": "2024-03-01T10:00:00Z" },
            "sessionID": "session-9"
        });
        let event: RawEvent = serde_json::from_value(wire).unwrap();
        assert_eq!(event.event_type, EventType::InteractionEvent);
        assert_eq!(event.session_id.0, "session-9");
        assert_eq!(event.category(), InteractionCategory::Click);
        assert!(event.detail_str("element").unwrap().contains("xpath"));
    }
}
