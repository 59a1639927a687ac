//! Blocking client core for an envelope-style payment REST API.
//!
//! # Overview
//! `RestClient` resolves endpoint URLs, places payloads (query string for
//! GET/DELETE, JSON body for POST/PUT), performs the call through a
//! `Transport`, and unwraps the API's `{Success, Message, Response}`
//! envelope into a [`Reply`].
//!
//! # Fixtures
//! With `save_mock_response` set, every live exchange is written to the
//! mock directory as a fixture keyed by a fingerprint of URL and payload.
//! With only `use_mock_response` set, calls are answered from those
//! fixtures and never reach the network, which makes tests against the
//! API reproducible offline.
//!
//! # Logging
//! Events go through `tracing` and are emitted only with `debug` set. Set
//! `log_file_path` and call [`logging::init_file_logging`] to have them
//! written to one `YYYY-MM-DD.log` file per day.
//!
//! # Design
//! - `Settings` is a plain struct handed to the client once; nothing is
//!   global.
//! - Requests and responses are owned data (`HttpRequest`, `HttpResponse`),
//!   so the transport can be swapped out in tests.
//! - Failures are values: `Reply::ApiError` for API-level errors,
//!   `Reply::NotRecorded` for missing fixtures, `ClientError` when no usable
//!   body could be obtained.

pub mod client;
pub mod envelope;
pub mod error;
pub mod escape;
pub mod fingerprint;
pub mod http;
pub mod logging;
pub mod mock_store;
pub mod settings;
pub mod transport;

pub use client::{RestClient, SendOptions, CALL_TIMEOUT, USER_AGENT};
pub use envelope::Reply;
pub use error::{ClientError, MockError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use mock_store::MockStore;
pub use settings::{MockMode, Settings};
pub use transport::{Transport, UreqTransport};
