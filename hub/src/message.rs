use axum::extract::ws::Utf8Bytes;
use serde::Serialize;
use serde_json::Value;

/// Trait for getting the wire name of an event
pub trait EventType {
    fn event_type(&self) -> &'static str;
}

/// Events the server pushes to connected clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A post was created; the payload is the stored post record.
    PostCreated,
}

impl EventType for Event {
    fn event_type(&self) -> &'static str {
        match self {
            Event::PostCreated => "Post_Created",
        }
    }
}

/// The unit broadcast to every connection.
///
/// Serializes as exactly `{"type": ..., "payload": ...}` in that order.
/// An envelope is immutable once built; the hub encodes it once and shares the
/// encoded frame between all receivers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    event_type: String,
    payload: Value,
}

impl Envelope {
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }

    /// Builds an envelope from any serializable payload.
    pub fn from_serializable<T>(
        event_type: impl Into<String>,
        payload: &T,
    ) -> Result<Self, serde_json::Error>
    where
        T: Serialize + ?Sized,
    {
        Ok(Self::new(event_type, serde_json::to_value(payload)?))
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Encodes the envelope as a text frame body.
    pub fn encode(&self) -> Result<Utf8Bytes, serde_json::Error> {
        serde_json::to_string(self).map(Utf8Bytes::from)
    }
}
