//! Transport primitives for config-server requests.
//!
//! The module exposes [`Transport`], the client's only dependency on an HTTP stack,
//! alongside [`RequestOptions`] (pass-through timeout, TLS verification, and header
//! settings) and [`ResponseMetadataSlot`], which the token exchange uses to remember the
//! status of the last response so failures can be classified with it. Requests and
//! responses are the `http` types re-exported by `oauth2`, so the same transport serves
//! configuration fetches and token exchanges alike.

// std
use std::time::Duration as StdDuration;
// crates.io
pub use oauth2::{
	HttpRequest, HttpResponse,
	http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header},
};
#[cfg(feature = "reqwest")]
use reqwest::blocking::{Client as BlockingClient, Request as BlockingRequest};
// self
use crate::{_prelude::*, error::TransportError};

/// Blocking HTTP transport used for every outbound request.
///
/// Implementations receive a fully built request (URL, method, headers, body) and the
/// caller's [`RequestOptions`]. They must honor `timeout` and `verify` when present and
/// must not retry: one failed attempt is conclusive. Any HTTP status, successful or not,
/// is a valid response; only failures to obtain a response are errors.
pub trait Transport
where
	Self: 'static + Send + Sync,
{
	/// Executes `request` and returns the raw response.
	fn execute(
		&self,
		request: HttpRequest,
		options: &RequestOptions,
	) -> Result<HttpResponse, TransportError>;
}

/// Per-call transport options forwarded verbatim to the [`Transport`].
///
/// No defaults are enforced: an unset timeout means the transport's own behavior.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
	/// Request timeout.
	pub timeout: Option<StdDuration>,
	/// TLS certificate verification toggle; `Some(false)` accepts invalid certificates.
	pub verify: Option<bool>,
	/// Extra headers merged into the outgoing request.
	pub headers: HeaderMap,
}
impl RequestOptions {
	/// Sets the request timeout.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Sets the TLS verification toggle.
	pub fn with_verify(mut self, verify: bool) -> Self {
		self.verify = Some(verify);

		self
	}

	/// Adds or replaces a single header.
	pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Replaces every caller-supplied header.
	pub fn with_headers(mut self, headers: HeaderMap) -> Self {
		self.headers = headers;

		self
	}
}

/// Captures metadata from the most recent HTTP response for downstream error mapping.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code, if a response arrived.
	pub status: Option<u16>,
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Builds a request with an exact header set.
pub(crate) fn build_request(
	method: Method,
	url: &str,
	headers: HeaderMap,
	body: Vec<u8>,
) -> Result<HttpRequest, oauth2::http::Error> {
	let mut request = oauth2::http::Request::builder().method(method).uri(url).body(body)?;

	*request.headers_mut() = headers;

	Ok(request)
}

/// Blocking reqwest transport.
///
/// Requests honoring `verify = Some(false)` go through a second, certificate-lenient
/// client that is built on first use and reused afterwards.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestTransport {
	client: BlockingClient,
	insecure: Arc<Mutex<Option<BlockingClient>>>,
}
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing blocking reqwest client.
	pub fn with_client(client: BlockingClient) -> Self {
		Self { client, insecure: Default::default() }
	}

	fn client_for(&self, options: &RequestOptions) -> Result<BlockingClient, TransportError> {
		if options.verify != Some(false) {
			return Ok(self.client.clone());
		}

		let mut insecure = self.insecure.lock();

		if let Some(client) = insecure.as_ref() {
			return Ok(client.clone());
		}

		let client = BlockingClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?;

		*insecure = Some(client.clone());

		Ok(client)
	}
}
#[cfg(feature = "reqwest")]
impl Transport for ReqwestTransport {
	fn execute(
		&self,
		request: HttpRequest,
		options: &RequestOptions,
	) -> Result<HttpResponse, TransportError> {
		let client = self.client_for(options)?;
		let mut request = BlockingRequest::try_from(request)?;

		if let Some(timeout) = options.timeout {
			*request.timeout_mut() = Some(timeout);
		}

		let response = client.execute(request)?;
		let status = response.status();
		let headers = response.headers().to_owned();
		let mut response_new = HttpResponse::new(response.bytes()?.to_vec());

		*response_new.status_mut() = status;
		*response_new.headers_mut() = headers;

		Ok(response_new)
	}
}
