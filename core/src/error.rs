//! Error types for the REST client core.
//!
//! # Design
//! API-level failures (`Success: false` envelopes) are not errors: they come
//! back as `Reply::ApiError`. The variants here cover the cases where the
//! client could not obtain a usable answer at all: no body after a transport
//! failure, undecodable JSON, a bad request shape, or a broken fixture.

use std::path::PathBuf;

use thiserror::Error;

use crate::http::HttpResponse;

/// Errors returned by `RestClient::send` and friends.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The call finished without a body to decode. `status` is the HTTP
    /// status when one was received.
    #[error("could not complete request: the response body is empty")]
    EmptyResponse { status: Option<u16> },

    /// The response body could not be decoded as JSON.
    #[error("deserialization failed (HTTP {status}): {message}")]
    DeserializationError { status: u16, message: String },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// GET and DELETE payloads must be JSON objects (or null).
    #[error("query payload must be a JSON object, got {0}")]
    InvalidQuery(&'static str),

    /// The resolved host + postfix + endpoint is not a valid URL.
    #[error("invalid request url {url}: {message}")]
    InvalidUrl { url: String, message: String },

    /// The configured proxy could not be parsed.
    #[error("invalid proxy {proxy}: {message}")]
    InvalidProxy { proxy: String, message: String },

    /// An environment variable held a value of the wrong shape.
    #[error("configuration error: {0}")]
    Config(String),

    /// The daily log file could not be opened or the subscriber installed.
    #[error("log file setup failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Mock(#[from] MockError),
}

/// Failures reading or writing fixture files.
///
/// A missing fixture is not an error; `MockStore::lookup` answers it with a
/// synthetic 404.
#[derive(Debug, Error)]
pub enum MockError {
    #[error("fixture i/o failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The fixture exists but its content cannot be decoded.
    #[error("fixture {} is corrupt: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },
}

/// A failed HTTP round-trip.
///
/// Non-2xx answers keep the response so the dispatcher can log and record
/// it; connection errors and timeouts have none.
#[derive(Debug, Error)]
#[error("transport failure: {message}")]
pub struct TransportError {
    pub message: String,
    pub response: Option<HttpResponse>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            response: None,
        }
    }

    pub fn with_response(message: impl Into<String>, response: HttpResponse) -> Self {
        Self {
            message: message.into(),
            response: Some(response),
        }
    }

    /// HTTP status of the attached response, if any.
    pub fn status(&self) -> Option<u16> {
        self.response.as_ref().map(|r| r.status)
    }
}
