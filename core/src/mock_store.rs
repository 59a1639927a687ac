//! File-backed store of recorded HTTP exchanges.
//!
//! # Design
//! Each exchange lives in `<fingerprint>.fixture` inside the configured
//! directory, as a small JSON record. The header map and the response text
//! are entity-escaped before they are written and decoded again on lookup.
//! The stored response text may be a full raw HTTP message (status line and
//! headers, a blank line, then the body); only the part after the last
//! `\r\n\r\n` is replayed.
//!
//! In debug mode a second `<fingerprint>_req.fixture` file records what was
//! sent. It exists for people reading the directory and is never loaded.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::MockError;
use crate::escape::{escape, unescape};
use crate::fingerprint::{fingerprint, payload_text};
use crate::http::HttpResponse;

const FIXTURE_EXTENSION: &str = "fixture";
const HEADER_BODY_SEPARATOR: &str = "\r\n\r\n";

/// On-disk form of a recorded response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    /// Escaped JSON object of header name to value.
    pub headers_json: String,
    pub http_code: u16,
    /// Escaped raw response text.
    pub response: String,
}

/// Debug-only record of the outbound request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestCapture {
    pub url: String,
    pub http_code: u16,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct MockStore {
    dir: PathBuf,
    debug: bool,
}

impl MockStore {
    pub fn new(dir: impl Into<PathBuf>, debug: bool) -> Self {
        Self {
            dir: dir.into(),
            debug,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn fixture_path(&self, url: &str, payload: &Value) -> PathBuf {
        self.dir
            .join(format!("{}.{FIXTURE_EXTENSION}", fingerprint(url, payload)))
    }

    fn capture_path(&self, url: &str, payload: &Value) -> PathBuf {
        self.dir
            .join(format!("{}_req.{FIXTURE_EXTENSION}", fingerprint(url, payload)))
    }

    /// Replay the recorded response for `(url, payload)`.
    ///
    /// A missing fixture yields an empty-bodied 404 rather than an error.
    pub fn lookup(&self, url: &str, payload: &Value) -> Result<HttpResponse, MockError> {
        Ok(self
            .find(url, payload)?
            .unwrap_or_else(HttpResponse::not_found))
    }

    /// Like [`MockStore::lookup`], but reports a missing fixture as `None`
    /// so it cannot be confused with a recorded 404.
    pub fn find(&self, url: &str, payload: &Value) -> Result<Option<HttpResponse>, MockError> {
        let path = self.fixture_path(url, payload);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if self.debug {
                    debug!(path = %path.display(), "no fixture recorded");
                }
                return Ok(None);
            }
            Err(source) => return Err(MockError::Io { path, source }),
        };

        let fixture: Fixture = serde_json::from_str(&raw).map_err(|e| MockError::Corrupt {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let headers = decode_headers(&fixture.headers_json).map_err(|reason| MockError::Corrupt {
            path: path.clone(),
            reason,
        })?;

        if self.debug {
            debug!(path = %path.display(), status = fixture.http_code, "replaying fixture");
        }
        Ok(Some(HttpResponse {
            status: fixture.http_code,
            headers,
            body: replay_body(&unescape(&fixture.response)),
        }))
    }

    /// Persist an exchange, overwriting any earlier recording of the same
    /// request.
    pub fn record(
        &self,
        url: &str,
        payload: &Value,
        status: u16,
        headers: &[(String, String)],
        body: &str,
    ) -> Result<(), MockError> {
        fs::create_dir_all(&self.dir).map_err(|source| MockError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let fixture = Fixture {
            headers_json: escape(&Value::Object(first_header_values(headers)).to_string()),
            http_code: status,
            response: escape(body),
        };
        let path = self.fixture_path(url, payload);
        write_json(&path, &fixture)?;
        if self.debug {
            debug!(path = %path.display(), status, "recorded fixture");
            let capture = RequestCapture {
                url: url.to_string(),
                http_code: status,
                body: payload_text(payload),
            };
            write_json(&self.capture_path(url, payload), &capture)?;
        }
        Ok(())
    }
}

/// Collapse repeated header names, keeping the first value seen.
fn first_header_values(headers: &[(String, String)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (name, value) in headers {
        map.entry(name.clone())
            .or_insert_with(|| Value::String(value.clone()));
    }
    map
}

fn decode_headers(escaped: &str) -> Result<Vec<(String, String)>, String> {
    let text = unescape(escaped);
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let value: Value = serde_json::from_str(&text).map_err(|e| format!("headers: {e}"))?;
    match value {
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(name, value)| match value {
                Value::String(s) => (name, s),
                other => (name, other.to_string()),
            })
            .collect()),
        // An empty header list encodes as `[]`.
        Value::Array(items) if items.is_empty() => Ok(Vec::new()),
        other => Err(format!("headers: expected an object, got {other}")),
    }
}

fn replay_body(raw: &str) -> String {
    raw.rsplit(HEADER_BODY_SEPARATOR)
        .next()
        .unwrap_or(raw)
        .to_string()
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), MockError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| MockError::Corrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    fs::write(path, text).map_err(|source| MockError::Io {
        path: path.to_path_buf(),
        source,
    })
}
