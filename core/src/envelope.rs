//! Unwrapping of the API's `{Success, Message, Response}` envelope.

use serde_json::Value;
use tracing::warn;

/// What a completed call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The envelope's `Response` (or the whole decoded body when envelope
    /// parsing was skipped).
    Data(Value),
    /// The API answered with `Success` other than `true`.
    ApiError { message: String },
    /// Replay mode found no fixture for this request.
    NotRecorded,
}

impl Reply {
    pub fn data(&self) -> Option<&Value> {
        match self {
            Reply::Data(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_data(self) -> Option<Value> {
        match self {
            Reply::Data(value) => Some(value),
            _ => None,
        }
    }

    /// The `{"Error": message}` shape API errors take on the wire.
    pub fn error_object(&self) -> Option<Value> {
        match self {
            Reply::ApiError { message } => Some(serde_json::json!({ "Error": message })),
            _ => None,
        }
    }
}

/// Unwrap a decoded response body.
///
/// Anything but a literal JSON `true` in `Success` counts as failure; a
/// missing `Response` on success unwraps to `Null`.
pub fn parse(body: Value) -> Reply {
    parse_with(body, false)
}

/// [`parse`], logging API errors when `debug` is set.
pub fn parse_with(body: Value, debug: bool) -> Reply {
    let mut envelope = match body {
        Value::Object(envelope) => envelope,
        other => {
            if debug {
                warn!(body = %other, "API response is not an envelope object");
            }
            return Reply::ApiError {
                message: String::new(),
            };
        }
    };

    if envelope.get("Success") != Some(&Value::Bool(true)) {
        let message = match envelope.remove("Message") {
            Some(Value::String(message)) => message,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        if debug {
            match envelope.get("Response").filter(|r| !r.is_null()) {
                Some(response) => warn!(%message, %response, "API error"),
                None => warn!(%message, "API error"),
            }
        }
        return Reply::ApiError { message };
    }

    Reply::Data(envelope.remove("Response").unwrap_or(Value::Null))
}
