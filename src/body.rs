//! Response body shapes and classification

use bytes::Bytes;
use serde_json::Value;

/// A response body as the downstream handler intends to transmit it
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Already-structured value (only objects are eligible for masking)
    Json(Value),
    /// Text body
    Text(String),
    /// Raw bytes that are not valid UTF-8
    Bytes(Bytes),
}

/// How the pipeline treats a body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Structured mapping, ready for masking
    Structured,
    /// Text delimited by `{` and `}`; must be parsed first
    Candidate,
    /// Anything else; transmitted untouched
    Opaque,
}

impl Payload {
    /// Classify the body.
    ///
    /// The candidate test is purely lexical: leading `{` and trailing `}`.
    /// Top-level arrays are opaque, and bracket-matched non-JSON text is a
    /// candidate that will fail to parse.
    pub fn classify(&self) -> Classification {
        match self {
            Payload::Json(Value::Object(_)) => Classification::Structured,
            Payload::Text(text) if text.starts_with('{') && text.ends_with('}') => {
                Classification::Candidate
            }
            _ => Classification::Opaque,
        }
    }

    /// Build a payload from raw response bytes: UTF-8 becomes text
    pub fn from_bytes(bytes: Bytes) -> Self {
        match std::str::from_utf8(&bytes) {
            Ok(text) => Payload::Text(text.to_owned()),
            Err(_) => Payload::Bytes(bytes),
        }
    }

    /// Wire bytes of this payload
    pub fn into_bytes(self) -> Bytes {
        match self {
            Payload::Json(value) => Bytes::from(value.to_string()),
            Payload::Text(text) => Bytes::from(text),
            Payload::Bytes(bytes) => bytes,
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<Bytes> for Payload {
    fn from(bytes: Bytes) -> Self {
        Payload::Bytes(bytes)
    }
}
