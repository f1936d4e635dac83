//! Responses captured by scenario steps.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::assertion::Expect;
use crate::request::Headers;

/// Response payload, parsed as JSON when possible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResponseBody {
    /// Payload that parsed as JSON.
    Json(serde_json::Value),
    /// Anything else (HTML pages, empty bodies, plain text).
    Text(String),
}

impl ResponseBody {
    /// Parses raw bytes, preferring JSON.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match serde_json::from_slice(bytes) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    /// Returns the JSON value, if the payload was JSON.
    #[must_use]
    pub const fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// Returns the JSON value, or the text wrapped as a JSON string.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Json(value) => value.clone(),
            Self::Text(text) => serde_json::Value::String(text.clone()),
        }
    }

    /// Returns a short preview of the payload for failure messages.
    #[must_use]
    pub fn preview(&self) -> String {
        let full = match self {
            Self::Json(value) => value.to_string(),
            Self::Text(text) => text.clone(),
        };
        if full.chars().count() > 100 {
            format!("{}...", full.chars().take(100).collect::<String>())
        } else {
            full
        }
    }
}

impl Default for ResponseBody {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

/// HTTP response captured by one scenario step.
///
/// The step that issued the request owns the response; assertions borrow it
/// through [`ResponseSpec::expect`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSpec {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    #[serde(default)]
    pub headers: Headers,
    /// Parsed response body.
    pub body: ResponseBody,
    /// Response time.
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl ResponseSpec {
    /// Creates a new `ResponseSpec` from raw response data.
    #[must_use]
    pub fn new(status: u16, headers: Headers, body: &[u8], duration: Duration) -> Self {
        Self {
            status,
            headers,
            body: ResponseBody::from_bytes(body),
            duration,
        }
    }

    /// Creates a response carrying a JSON body.
    #[must_use]
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            headers: Headers::new().with("Content-Type", "application/json"),
            body: ResponseBody::Json(body),
            duration: Duration::ZERO,
        }
    }

    /// Creates a response carrying a text body.
    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: ResponseBody::Text(body.into()),
            duration: Duration::ZERO,
        }
    }

    /// Gets a header value by name (case-insensitive).
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Starts a chain of assertions against this response.
    #[must_use]
    pub const fn expect(&self) -> Expect<'_> {
        Expect::new(self)
    }
}

/// Serializes `Duration` as whole milliseconds.
mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::cast_possible_truncation)]
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
