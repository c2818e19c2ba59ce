//! ==============================================================================
//! normalize.rs - envelope unwrapping and error-body mapping
//! ==============================================================================
//!
//! purpose:
//!     the aqms api wraps every payload as `{success, data, message?, ...}`.
//!     simple resources and paginated/aggregated resources share that shape and
//!     differ only by which extra top-level keys are present.
//!
//! ```text
//!     this module turns raw bodies into the value the caller asked for and
//!     turns failed responses into `ApiError`. nothing here touches the network,
//!     so every rule is testable on plain bytes.
//! ```
//!
//! relationships:
//!     - used by: client.rs (every json request goes through `read_body`)
//!     - used by: service.rs (`decode` with the endpoint's known `Shape`)
//!
//! ==============================================================================

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::error::ApiError;

/// top-level keys that mark a paginated / aggregated envelope
pub const METADATA_KEYS: [&str; 6] = ["total", "limit", "offset", "range", "interval", "count"];

/// how an endpoint is known to respond
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `{success, data}`: the caller wants `data`
    Plain,
    /// `{success, data, <metadata>...}`: the caller wants everything but `success`
    WithMetadata,
}

fn is_envelope(obj: &Map<String, Value>) -> bool {
    obj.contains_key("success") && obj.contains_key("data")
}

fn has_metadata(obj: &Map<String, Value>) -> bool {
    METADATA_KEYS.iter().any(|key| obj.contains_key(*key))
}

/// Unwraps an envelope by inspecting its keys.
///
/// - not an object, or missing `success`/`data`: returned unchanged
/// - envelope without metadata keys: the bare `data` value
/// - envelope with any metadata key: the body minus `success`
pub fn normalize(body: Value) -> Value {
    match body {
        Value::Object(mut obj) if is_envelope(&obj) => {
            if has_metadata(&obj) {
                obj.remove("success");
                Value::Object(obj)
            } else {
                obj.remove("data").unwrap_or(Value::Null)
            }
        }
        other => other,
    }
}

/// Unwraps an envelope using the endpoint's known shape, then deserializes.
///
/// Shape sniffing alone would misread a plain resource whose envelope happens
/// to carry a stray `count`; the declared shape wins and the mismatch is logged.
pub fn decode<T: DeserializeOwned>(body: Value, shape: Shape) -> Result<T, ApiError> {
    let value = match (shape, body) {
        (Shape::Plain, Value::Object(mut obj)) if is_envelope(&obj) => {
            if has_metadata(&obj) {
                tracing::warn!(
                    keys = ?obj.keys().collect::<Vec<_>>(),
                    "plain endpoint returned metadata keys; using data field"
                );
            }
            obj.remove("data").unwrap_or(Value::Null)
        }
        (Shape::WithMetadata, Value::Object(mut obj)) if is_envelope(&obj) => {
            if !has_metadata(&obj) {
                tracing::debug!("metadata endpoint returned no metadata keys");
            }
            obj.remove("success");
            Value::Object(obj)
        }
        (_, other) => other,
    };

    serde_json::from_value(value).map_err(|e| ApiError::decode(e.to_string()))
}

/// Parses a successful response body.
///
/// Bodies that are not declared as json, or that fail to parse, become `{}`.
pub fn read_body(content_type: Option<&str>, bytes: &[u8]) -> Value {
    let is_json = content_type
        .map(|ct| ct.contains("application/json"))
        .unwrap_or(false);
    if !is_json {
        return Value::Object(Map::new());
    }

    match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "response declared json but did not parse");
            Value::Object(Map::new())
        }
    }
}

/// Builds the error for a non-2xx response. Never fails.
///
/// `message` and `code` come from the json error body when present,
/// otherwise `HTTP <status>: <status text>` and `HTTP_<status>`.
pub fn error_from_response(status: u16, status_text: &str, bytes: &[u8]) -> ApiError {
    let mut message = format!("HTTP {}: {}", status, status_text);
    let mut code = format!("HTTP_{}", status);

    if let Ok(Value::Object(body)) = serde_json::from_slice::<Value>(bytes) {
        if let Some(m) = body.get("message").and_then(Value::as_str).filter(|m| !m.is_empty()) {
            message = m.to_string();
        }
        if let Some(c) = body.get("code").and_then(Value::as_str).filter(|c| !c.is_empty()) {
            code = c.to_string();
        }
    }

    ApiError::http(message, status, code)
}
