//! Message envelopes
//!
//! The application-level payload carried by an inbound text frame: a JSON
//! object with two reserved keys, `toUserId` (recipient) and `fromUserId`
//! (stamped server-side). Everything else passes through verbatim.

use serde_json::{Map, Value};

/// Reserved key naming the recipient
pub const TO_USER_ID: &str = "toUserId";
/// Reserved key naming the sender; always overwritten by the router
pub const FROM_USER_ID: &str = "fromUserId";

/// A parsed inbound message
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    fields: Map<String, Value>,
}

impl Envelope {
    /// Parse raw frame text as an envelope
    pub fn parse(raw: &str) -> Result<Self, EnvelopeError> {
        let value: Value = serde_json::from_str(raw)?;
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(EnvelopeError::NotAnObject(json_type(&other))),
        }
    }

    /// Recipient identifier, if present and non-blank
    pub fn to_user_id(&self) -> Option<&str> {
        self.fields
            .get(TO_USER_ID)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Overwrite the sender field with the authenticated identity
    ///
    /// Called for every routed message so a client-supplied `fromUserId`
    /// can never be delivered.
    pub fn stamp_sender(&mut self, user_id: &str) {
        self.fields
            .insert(FROM_USER_ID.to_string(), Value::String(user_id.to_string()));
    }

    /// Field accessor for non-reserved keys
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

impl std::fmt::Display for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Map serialization cannot fail
        let text = serde_json::to_string(&self.fields).map_err(|_| std::fmt::Error)?;
        f.write_str(&text)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Envelope parsing errors
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}
