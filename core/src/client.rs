//! Request dispatch for the payment API.
//!
//! # Design
//! `RestClient` owns its `Settings`, a `Transport` and a `MockStore`. A call
//! goes through three steps:
//!
//! 1. `build_request` resolves the URL (host, postfix, endpoint) and places
//!    the payload: query string for GET/DELETE, JSON body for POST/PUT.
//! 2. The mock mode picks where the response comes from: a fixture (replay),
//!    the network (live), or the network followed by a fixture write
//!    (record).
//! 3. The body is decoded and, unless disabled, unwrapped from the API
//!    envelope.
//!
//! Fixtures are keyed on the URL *before* the query string is appended plus
//! the payload, so GET and POST fixtures are named the same way.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::envelope::{self, Reply};
use crate::error::{ClientError, TransportError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::mock_store::MockStore;
use crate::settings::{MockMode, Settings};
use crate::transport::{Transport, UreqTransport};

/// Hard ceiling for a single live call, independent of `rest_timeout`.
pub const CALL_TIMEOUT: Duration = Duration::from_secs(2);

pub const USER_AGENT: &str = concat!("payrest/", env!("CARGO_PKG_VERSION"));

/// Per-call overrides for [`RestClient::send_with`].
#[derive(Debug, Clone)]
pub struct SendOptions {
    /// Replaces `Settings::default_postfix` for this call.
    pub postfix: Option<String>,
    /// When false the decoded body is returned as-is.
    pub parse_envelope: bool,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            postfix: None,
            parse_envelope: true,
        }
    }
}

impl SendOptions {
    pub fn raw() -> Self {
        Self {
            parse_envelope: false,
            ..Self::default()
        }
    }

    pub fn with_postfix(postfix: impl Into<String>) -> Self {
        Self {
            postfix: Some(postfix.into()),
            ..Self::default()
        }
    }
}

pub struct RestClient {
    settings: Settings,
    transport: Box<dyn Transport>,
    mocks: MockStore,
}

impl RestClient {
    /// Client backed by a `ureq` agent built from `settings`.
    pub fn new(settings: Settings) -> Result<Self, ClientError> {
        let transport = UreqTransport::new(&settings)?;
        Ok(Self::with_transport(settings, transport))
    }

    pub fn with_transport(settings: Settings, transport: impl Transport + 'static) -> Self {
        let mocks = MockStore::new(settings.mock_responses_dir.clone(), settings.debug);
        Self {
            settings,
            transport: Box::new(transport),
            mocks,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn mock_store(&self) -> &MockStore {
        &self.mocks
    }

    /// Host + postfix + endpoint, without any query string.
    pub fn endpoint_url(&self, endpoint: &str, postfix: Option<&str>) -> String {
        let postfix = postfix.unwrap_or(&self.settings.default_postfix);
        format!("{}{postfix}{endpoint}", self.settings.host())
    }

    pub fn build_request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        payload: &Value,
        postfix: Option<&str>,
    ) -> Result<HttpRequest, ClientError> {
        let base = self.endpoint_url(endpoint, postfix);
        let headers = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), USER_AGENT.to_string()),
        ];

        if method.uses_query() {
            return Ok(HttpRequest {
                method,
                url: with_query(&base, payload)?,
                headers,
                body: None,
            });
        }

        let body = serde_json::to_string(payload)
            .map_err(|e| ClientError::SerializationError(e.to_string()))?;
        Ok(HttpRequest {
            method,
            url: base,
            headers,
            body: Some(body),
        })
    }

    pub fn get(&self, endpoint: &str, query: &Value) -> Result<Reply, ClientError> {
        self.send(HttpMethod::Get, endpoint, query)
    }

    pub fn post(&self, endpoint: &str, body: &Value) -> Result<Reply, ClientError> {
        self.send(HttpMethod::Post, endpoint, body)
    }

    pub fn put(&self, endpoint: &str, body: &Value) -> Result<Reply, ClientError> {
        self.send(HttpMethod::Put, endpoint, body)
    }

    pub fn delete(&self, endpoint: &str, query: &Value) -> Result<Reply, ClientError> {
        self.send(HttpMethod::Delete, endpoint, query)
    }

    pub fn send(
        &self,
        method: HttpMethod,
        endpoint: &str,
        payload: &Value,
    ) -> Result<Reply, ClientError> {
        self.send_with(method, endpoint, payload, &SendOptions::default())
    }

    /// Dispatch one call.
    ///
    /// API-level failures come back as `Reply::ApiError`; a missing fixture
    /// in replay mode as `Reply::NotRecorded`. `Err` means no usable body
    /// could be obtained.
    pub fn send_with(
        &self,
        method: HttpMethod,
        endpoint: &str,
        payload: &Value,
        options: &SendOptions,
    ) -> Result<Reply, ClientError> {
        let url = self.endpoint_url(endpoint, options.postfix.as_deref());
        let request = self.build_request(method, endpoint, payload, options.postfix.as_deref())?;

        let response = match self.settings.mock_mode() {
            MockMode::Replay => match self.mocks.find(&url, payload)? {
                Some(response) => response,
                None => {
                    if self.settings.debug {
                        debug!(%method, endpoint, "no fixture recorded for request");
                    }
                    return Ok(Reply::NotRecorded);
                }
            },
            MockMode::Record => {
                let response = self.call(&request, endpoint, payload);
                // The live answer stands even when the fixture cannot be written.
                if let Err(err) = self.mocks.record(
                    &url,
                    payload,
                    response.status,
                    &response.headers,
                    &response.body,
                ) {
                    if self.settings.debug {
                        warn!(%method, endpoint, error = %err, "failed to record fixture");
                    }
                }
                response
            }
            MockMode::Live => self.call(&request, endpoint, payload),
        };

        if response.body.is_empty() {
            if self.settings.debug {
                debug!(%method, endpoint, status = response.status, "the response body is empty");
            }
            let status = (response.status != 0).then_some(response.status);
            return Err(ClientError::EmptyResponse { status });
        }

        let body: Value = serde_json::from_str(&response.body).map_err(|e| {
            ClientError::DeserializationError {
                status: response.status,
                message: e.to_string(),
            }
        })?;

        if options.parse_envelope {
            Ok(envelope::parse_with(body, self.settings.debug))
        } else {
            Ok(Reply::Data(body))
        }
    }

    /// Live round-trip. A failure is folded into a response: the one the
    /// server sent, or status 0 with an empty body when there was none.
    fn call(&self, request: &HttpRequest, endpoint: &str, payload: &Value) -> HttpResponse {
        match self.transport.execute(request, CALL_TIMEOUT) {
            Ok(response) => {
                if self.settings.debug {
                    debug!(method = %request.method, endpoint, %payload, "request sent");
                }
                response
            }
            Err(err) => {
                self.log_failure(request, &err);
                err.response.unwrap_or(HttpResponse {
                    status: 0,
                    headers: Vec::new(),
                    body: String::new(),
                })
            }
        }
    }

    fn log_failure(&self, request: &HttpRequest, err: &TransportError) {
        if !self.settings.debug {
            return;
        }
        debug!(
            method = %request.method,
            url = %request.url,
            body = request.body.as_deref().unwrap_or(""),
            error = %err,
            "an error occurred while sending the request"
        );
        if let Some(response) = &err.response {
            debug!(status = response.status, body = %response.body, "server response");
        }
    }
}

/// Append `payload` to `base` as a form-encoded query string.
fn with_query(base: &str, payload: &Value) -> Result<String, ClientError> {
    let fields = match payload {
        Value::Null => return Ok(base.to_string()),
        Value::Object(fields) => fields,
        Value::Bool(_) => return Err(ClientError::InvalidQuery("a boolean")),
        Value::Number(_) => return Err(ClientError::InvalidQuery("a number")),
        Value::String(_) => return Err(ClientError::InvalidQuery("a string")),
        Value::Array(_) => return Err(ClientError::InvalidQuery("an array")),
    };

    let mut url = Url::parse(base).map_err(|e| ClientError::InvalidUrl {
        url: base.to_string(),
        message: e.to_string(),
    })?;
    if !fields.is_empty() {
        let mut pairs = Vec::new();
        for (key, value) in fields {
            flatten_query(key.clone(), value, &mut pairs);
        }
        url.query_pairs_mut().extend_pairs(pairs);
    }
    Ok(url.into())
}

/// Nested objects and arrays become bracketed keys: `a[0]=1&a[1]=2`,
/// `owner[name]=x`. Objects contribute their keys in sorted order.
fn flatten_query(key: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(fields) => {
            for (sub, nested) in fields {
                flatten_query(format!("{key}[{sub}]"), nested, out);
            }
        }
        Value::Array(items) => {
            for (index, nested) in items.iter().enumerate() {
                flatten_query(format!("{key}[{index}]"), nested, out);
            }
        }
        Value::String(s) => out.push((key, s.clone())),
        Value::Null => out.push((key, String::new())),
        other => out.push((key, other.to_string())),
    }
}
