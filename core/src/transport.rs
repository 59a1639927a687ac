//! Blocking HTTP transport.
//!
//! # Design
//! `Transport` is the single point where a request leaves the process. The
//! default implementation wraps a `ureq::Agent` configured from `Settings`
//! (agent-wide timeout, optional proxy). Status codes are never turned into
//! `ureq` errors; instead any non-2xx answer comes back as a `TransportError`
//! that still carries the response, so the caller can log and record it.
//! The same goes for a body that cannot be read: the error keeps status and
//! headers with an empty body.

use std::time::Duration;

use crate::error::{ClientError, TransportError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::settings::Settings;

/// Executes one HTTP round-trip.
pub trait Transport: Send + Sync {
    /// Send `request`, giving up after `timeout`.
    ///
    /// Returns `Err` for connection failures, timeouts and non-2xx statuses.
    fn execute(&self, request: &HttpRequest, timeout: Duration) -> Result<HttpResponse, TransportError>;
}

#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(settings: &Settings) -> Result<Self, ClientError> {
        let mut config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(settings.rest_timeout));

        if let Some(proxy) = &settings.proxy {
            let parsed = ureq::Proxy::new(proxy).map_err(|e| ClientError::InvalidProxy {
                proxy: proxy.clone(),
                message: e.to_string(),
            })?;
            config = config.proxy(Some(parsed));
        }

        Ok(Self {
            agent: config.build().new_agent(),
        })
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest, timeout: Duration) -> Result<HttpResponse, TransportError> {
        let url = request.url.as_str();
        let body = request.body.as_deref().unwrap_or_default().as_bytes();

        let result = match request.method {
            HttpMethod::Get => prepare(self.agent.get(url), request, timeout).call(),
            HttpMethod::Delete => prepare(self.agent.delete(url), request, timeout).call(),
            HttpMethod::Post => prepare(self.agent.post(url), request, timeout).send(body),
            HttpMethod::Put => prepare(self.agent.put(url), request, timeout).send(body),
        };

        let mut response = result.map_err(|e| TransportError::new(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = match response.body_mut().read_to_string() {
            Ok(body) => body,
            Err(e) => {
                // Status and headers arrived; only the body is lost.
                let response = HttpResponse {
                    status,
                    headers,
                    body: String::new(),
                };
                return Err(TransportError::with_response(
                    format!("failed to read response body: {e}"),
                    response,
                ));
            }
        };

        let response = HttpResponse {
            status,
            headers,
            body,
        };
        if response.is_success() {
            Ok(response)
        } else {
            Err(TransportError::with_response(format!("HTTP {status}"), response))
        }
    }
}

fn prepare<B>(
    mut builder: ureq::RequestBuilder<B>,
    request: &HttpRequest,
    timeout: Duration,
) -> ureq::RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder.config().timeout_global(Some(timeout)).build()
}
