//! Config client orchestration: memoized configuration fetches, accessors, and proxies.
//!
//! [`ConfigClient`] owns the identity of one application (name, profile, branch, server
//! address), the URL resolved from its template, an optional bearer token, and the
//! configuration snapshot. The first successful [`ConfigClient::get_config`] stores the
//! parsed document; later calls return it without touching the network. Two threads
//! racing through the first fetch may both hit the server, but only one snapshot is kept.
//!
//! Fetch failures follow the fail-fast policy: with `fail_fast` on they come back as
//! [`Error::Fatal`], otherwise as [`Error::Connection`]. The client never terminates the
//! process itself; see [`exit_on_fatal`](crate::error::exit_on_fatal). File retrieval and
//! the encrypt/decrypt proxies always return [`Error::RequestFailed`] on failure.

mod builder;
mod settings;

pub use builder::*;
pub use settings::*;

// std
use std::sync::OnceLock;
// crates.io
use serde::de::DeserializeOwned;
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::BearerToken,
	error::{ConfigError, FetchError},
	http::{self, HeaderMap, HeaderValue, Method, RequestOptions, Transport, header},
	lookup::{self, ConfigMap},
	oauth::TokenProvider,
	obs::{self, RequestKind, RequestOutcome, RequestSpan},
};

/// Default path of the encrypt endpoint.
pub const ENCRYPT_PATH: &str = "/encrypt";
/// Default path of the decrypt endpoint.
pub const DECRYPT_PATH: &str = "/decrypt";

/// Client for one application's externalized configuration.
pub struct ConfigClient {
	settings: ClientSettings,
	url: String,
	transport: Arc<dyn Transport>,
	token_provider: Option<TokenProvider>,
	token: RwLock<Option<BearerToken>>,
	token_options: RequestOptions,
	config: OnceLock<ConfigMap>,
}
impl ConfigClient {
	/// Returns a builder seeded with default settings for `app_name`.
	pub fn builder(app_name: impl Into<String>) -> ConfigClientBuilder {
		ConfigClientBuilder::new(app_name)
	}

	/// Builds a client with default settings for `app_name`.
	pub fn new(app_name: impl Into<String>) -> Result<Self> {
		Self::builder(app_name).build()
	}

	/// Builds a client from [`ClientSettings::from_env`].
	pub fn from_env() -> Result<Self> {
		ConfigClientBuilder::from_settings(ClientSettings::from_env()?).build()
	}

	pub(crate) fn from_parts(
		settings: ClientSettings,
		url: String,
		transport: Arc<dyn Transport>,
		token_provider: Option<TokenProvider>,
		token: Option<BearerToken>,
		token_options: RequestOptions,
	) -> Self {
		Self {
			settings,
			url,
			transport,
			token_provider,
			token: RwLock::new(token),
			token_options,
			config: OnceLock::new(),
		}
	}

	/// Settings the client was built from.
	pub fn settings(&self) -> &ClientSettings {
		&self.settings
	}

	/// Application name.
	pub fn app_name(&self) -> &str {
		&self.settings.app_name
	}

	/// Active profile.
	pub fn profile(&self) -> &str {
		&self.settings.profile
	}

	/// Repository branch.
	pub fn branch(&self) -> &str {
		&self.settings.branch
	}

	/// Config server base URL.
	pub fn address(&self) -> &str {
		&self.settings.address
	}

	/// Whether configuration fetch failures are fatal.
	pub fn fail_fast(&self) -> bool {
		self.settings.fail_fast
	}

	/// Configuration URL resolved from the template.
	pub fn url(&self) -> &str {
		&self.url
	}

	/// Returns `true` when the client carries a bearer token.
	pub fn is_authenticated(&self) -> bool {
		self.token.read().is_some()
	}

	/// Current bearer token, if OAuth2 is configured.
	pub fn token(&self) -> Option<BearerToken> {
		self.token.read().clone()
	}

	/// Returns `true` when the bearer token reported a lifetime that has elapsed.
	pub fn token_expired(&self) -> bool {
		self.token.read().as_ref().is_some_and(BearerToken::is_expired)
	}

	/// Performs a fresh token exchange and replaces the current bearer token.
	///
	/// Returns `Ok(false)` when OAuth2 is not configured.
	pub fn reauthenticate(&self) -> Result<bool> {
		let Some(provider) = &self.token_provider else {
			return Ok(false);
		};
		let token = provider.acquire_token(self.transport.as_ref(), &self.token_options)?;

		*self.token.write() = Some(token);

		Ok(true)
	}

	/// Fetches the configuration once and returns the memoized snapshot.
	///
	/// `options` apply to the network call only; once a snapshot exists it is returned
	/// as-is. Caller headers are sent verbatim, and the bearer token is added as
	/// `Authorization` unless the caller already set that header.
	pub fn get_config(&self, options: &RequestOptions) -> Result<&ConfigMap> {
		const KIND: RequestKind = RequestKind::Config;

		if let Some(config) = self.config.get() {
			return Ok(config);
		}

		let _span = RequestSpan::new(KIND, "get_config").entered();

		obs::record_request_outcome(KIND, RequestOutcome::Attempt);

		match self.fetch_config(options) {
			Ok(config) => {
				obs::record_request_outcome(KIND, RequestOutcome::Success);

				Ok(self.config.get_or_init(|| config))
			},
			Err(source) => {
				obs::record_request_outcome(KIND, RequestOutcome::Failure);
				obs::log_request_failure(KIND, &self.url, &source);

				let url = self.url.clone();

				if self.settings.fail_fast {
					Err(Error::Fatal { url, source })
				} else {
					Err(Error::Connection { url, source })
				}
			},
		}
	}

	/// Returns the configuration, fetching it with default options on first access.
	pub fn config(&self) -> Result<&ConfigMap> {
		self.get_config(&RequestOptions::default())
	}

	/// Returns the snapshot if it has already been fetched.
	pub fn cached_config(&self) -> Option<&ConfigMap> {
		self.config.get()
	}

	/// Top-level configuration keys.
	pub fn keys(&self) -> Result<Vec<&str>> {
		Ok(self.config()?.keys().map(String::as_str).collect())
	}

	/// Alias of [`keys`](Self::keys).
	pub fn get_keys(&self) -> Result<Vec<&str>> {
		self.keys()
	}

	/// Resolves a dotted path such as `"spring.cloud.consul.host"`.
	///
	/// Missing segments yield `Ok(None)`; only a failed first fetch is an error.
	pub fn get_attribute(&self, path: &str) -> Result<Option<&Value>> {
		Ok(lookup::lookup(self.config()?, path))
	}

	/// Alias of [`get_attribute`](Self::get_attribute).
	pub fn get(&self, path: &str) -> Result<Option<&Value>> {
		self.get_attribute(path)
	}

	/// Resolves a dotted path and decodes the value into `T`.
	pub fn get_as<T>(&self, path: &str) -> Result<Option<T>>
	where
		T: DeserializeOwned,
	{
		self.get_attribute(path)?
			.map(|value| {
				T::deserialize(value)
					.map_err(|source| Error::Decode { path: path.to_owned(), source })
			})
			.transpose()
	}

	/// Fetches `{address}/{app_name}/{profile}/{branch}/{filename}` as text.
	pub fn get_file(&self, filename: &str) -> Result<String> {
		self.get_file_with(filename, &RequestOptions::default())
	}

	/// Like [`get_file`](Self::get_file) with explicit request options.
	pub fn get_file_with(&self, filename: &str, options: &RequestOptions) -> Result<String> {
		let url = format!(
			"{}/{}/{}/{}/{filename}",
			self.settings.address,
			self.settings.app_name,
			self.settings.profile,
			self.settings.branch,
		);
		let headers = self.headers_for(&options.headers);

		self.send_text(RequestKind::File, Method::GET, url, headers, Vec::new(), options)
	}

	/// Encrypts `value` through `{address}/encrypt`.
	pub fn encrypt(&self, value: &str) -> Result<String> {
		self.encrypt_at(value, ENCRYPT_PATH)
	}

	/// Encrypts `value` through `{address}{path}`.
	pub fn encrypt_at(&self, value: &str, path: &str) -> Result<String> {
		self.encrypt_with(value, path, &RequestOptions::default())
	}

	/// Like [`encrypt_at`](Self::encrypt_at) with explicit request options.
	pub fn encrypt_with(
		&self,
		value: &str,
		path: &str,
		options: &RequestOptions,
	) -> Result<String> {
		self.proxy_text(RequestKind::Encrypt, value, path, options)
	}

	/// Decrypts `value` through `{address}/decrypt`.
	pub fn decrypt(&self, value: &str) -> Result<String> {
		self.decrypt_at(value, DECRYPT_PATH)
	}

	/// Decrypts `value` through `{address}{path}`.
	pub fn decrypt_at(&self, value: &str, path: &str) -> Result<String> {
		self.decrypt_with(value, path, &RequestOptions::default())
	}

	/// Like [`decrypt_at`](Self::decrypt_at) with explicit request options.
	pub fn decrypt_with(
		&self,
		value: &str,
		path: &str,
		options: &RequestOptions,
	) -> Result<String> {
		self.proxy_text(RequestKind::Decrypt, value, path, options)
	}

	fn fetch_config(&self, options: &RequestOptions) -> Result<ConfigMap, FetchError> {
		let headers = self.headers_for(&options.headers);
		let request = http::build_request(Method::GET, &self.url, headers, Vec::new())?;
		let response = self.transport.execute(request, options)?;
		let status = response.status();

		if !status.is_success() {
			return Err(FetchError::Status { status: status.as_u16() });
		}

		let mut deserializer = serde_json::Deserializer::from_slice(response.body());
		let config: ConfigMap = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| FetchError::Parse { source })?;

		deserializer.end().map_err(|source| FetchError::TrailingData { source })?;

		Ok(config)
	}

	fn proxy_text(
		&self,
		kind: RequestKind,
		value: &str,
		path: &str,
		options: &RequestOptions,
	) -> Result<String> {
		let url = format!("{}{path}", self.settings.address);
		let mut headers = self.headers_for(&options.headers);

		headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));

		self.send_text(kind, Method::POST, url, headers, value.as_bytes().to_vec(), options)
	}

	fn send_text(
		&self,
		kind: RequestKind,
		method: Method,
		url: String,
		headers: HeaderMap,
		body: Vec<u8>,
		options: &RequestOptions,
	) -> Result<String> {
		let _span = RequestSpan::new(kind, "send_text").entered();

		obs::record_request_outcome(kind, RequestOutcome::Attempt);

		let result = self.execute_text(method, url, headers, body, options);

		match &result {
			Ok(_) => obs::record_request_outcome(kind, RequestOutcome::Success),
			Err(e) => {
				obs::record_request_outcome(kind, RequestOutcome::Failure);

				if let Error::RequestFailed { url, .. } = e {
					obs::log_request_failure(kind, url, e);
				}
			},
		}

		result
	}

	fn execute_text(
		&self,
		method: Method,
		url: String,
		headers: HeaderMap,
		body: Vec<u8>,
		options: &RequestOptions,
	) -> Result<String> {
		let request =
			http::build_request(method.clone(), &url, headers, body).map_err(ConfigError::from)?;
		let response = match self.transport.execute(request, options) {
			Ok(response) => response,
			Err(source) =>
				return Err(Error::RequestFailed {
					method,
					url,
					status: None,
					source: Some(source),
				}),
		};
		let status = response.status();

		if !status.is_success() {
			return Err(Error::RequestFailed {
				method,
				url,
				status: Some(status.as_u16()),
				source: None,
			});
		}

		Ok(String::from_utf8_lossy(response.body()).into_owned())
	}

	fn headers_for(&self, caller: &HeaderMap) -> HeaderMap {
		let mut headers = caller.clone();

		if let Some(token) = self.token.read().as_ref() {
			if let Some(expires_at) = token.expires_at().filter(|_| token.is_expired()) {
				obs::warn_expired_token(expires_at);
			}
			if !headers.contains_key(header::AUTHORIZATION) {
				headers.insert(header::AUTHORIZATION, token.authorization().clone());
			}
		}

		headers
	}
}
impl Debug for ConfigClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ConfigClient")
			.field("settings", &self.settings)
			.field("url", &self.url)
			.field("authenticated", &self.is_authenticated())
			.field("loaded", &self.config.get().is_some())
			.finish()
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// std
	use std::time::Duration as StdDuration;
	// crates.io
	use httpmock::prelude::*;
	use serde_json::json;
	// self
	use super::*;
	use crate::{
		_preludet::*,
		auth::OAuth2Credentials,
		error::TransportError,
		http::HeaderName,
	};

	const CONFIG_BODY: &str = r#"{
		"spring": { "cloud": { "consul": { "host": "discovery", "port": 8500 } } },
		"server": { "port": 8080 },
		"features": ["billing", "search"]
	}"#;
	const TOKEN_BODY: &str =
		r#"{"access_token":"eyJz93a...k4laUWw","token_type":"bearer","expires_in":43199}"#;

	fn config_path() -> &'static str {
		"/master/development-test_app.json"
	}

	#[test]
	fn default_url_follows_template() {
		let client = ConfigClient::new("test_app").expect("Client should build with defaults.");

		assert_eq!(client.url(), "http://localhost:8888/master/development-test_app.json");
		assert!(client.fail_fast());
		assert!(!client.is_authenticated());
		assert!(client.cached_config().is_none());
	}

	#[test]
	fn empty_app_name_is_rejected() {
		let err = ConfigClient::new("  ").expect_err("Blank app names should be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::MissingAppName)));
	}

	#[test]
	fn get_config_memoizes_first_success() {
		let server = MockServer::start();
		let mock = server.mock(|when, then| {
			when.method(GET).path(config_path());
			then.status(200).header("content-type", "application/json").body(CONFIG_BODY);
		});
		let client = test_client_builder(&server.base_url(), "test_app")
			.build()
			.expect("Client should build.");
		let first = client
			.get_config(&RequestOptions::default())
			.expect("First fetch should succeed.")
			.clone();
		let second = client.config().expect("Memoized fetch should succeed.");

		assert_eq!(&first, second);
		assert_eq!(client.cached_config(), Some(second));

		mock.assert_calls(1);
	}

	#[test]
	fn get_config_forwards_caller_headers() {
		let server = MockServer::start();
		let mock = server.mock(|when, then| {
			when.method(GET).path(config_path()).header("accept", "application/json");
			then.status(200).body(CONFIG_BODY);
		});
		let client = test_client_builder(&server.base_url(), "test_app")
			.build()
			.expect("Client should build.");
		let options = RequestOptions::default()
			.with_timeout(StdDuration::from_secs(5))
			.with_header(header::ACCEPT, HeaderValue::from_static("application/json"));

		client.get_config(&options).expect("Fetch with caller headers should succeed.");

		mock.assert();
	}

	#[test]
	fn failed_fetch_is_fatal_with_fail_fast() {
		let server = MockServer::start();
		let mock = server.mock(|when, then| {
			when.method(GET).path(config_path());
			then.status(500);
		});
		let client = test_client_builder(&server.base_url(), "test_app")
			.build()
			.expect("Client should build.");
		let err = client.config().expect_err("HTTP 500 should fail the fetch.");

		assert!(err.is_fatal());
		assert_eq!(err.status(), Some(500));
		assert!(client.cached_config().is_none());

		mock.assert();
	}

	#[test]
	fn failed_fetch_is_recoverable_without_fail_fast() {
		let client = ConfigClient::builder("test_app")
			.address("http://127.0.0.1:1")
			.fail_fast(false)
			.build()
			.expect("Client should build.");
		let err = client.config().expect_err("Refused connections should fail the fetch.");

		match err {
			Error::Connection { url, source: FetchError::Transport(_) } =>
				assert_eq!(url, "http://127.0.0.1:1/master/development-test_app.json"),
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn non_object_body_is_a_fetch_failure() {
		let server = MockServer::start();

		server.mock(|when, then| {
			when.method(GET).path(config_path());
			then.status(200).body("[1, 2, 3]");
		});

		let client = test_client_builder(&server.base_url(), "test_app")
			.fail_fast(false)
			.build()
			.expect("Client should build.");
		let err = client.config().expect_err("Arrays are not configuration documents.");

		assert!(matches!(err, Error::Connection { source: FetchError::Parse { .. }, .. }));
	}

	#[test]
	fn trailing_bytes_after_the_document_fail_the_fetch() {
		let server = MockServer::start();

		server.mock(|when, then| {
			when.method(GET).path(config_path());
			then.status(200).body(r#"{"a":1} <html>oops</html>"#);
		});

		let client = test_client_builder(&server.base_url(), "test_app")
			.fail_fast(false)
			.build()
			.expect("Client should build.");
		let err = client.config().expect_err("Trailing markup should fail the fetch.");

		assert!(matches!(err, Error::Connection { source: FetchError::TrailingData { .. }, .. }));
		assert!(client.cached_config().is_none());
	}

	#[test]
	fn accessors_walk_the_snapshot() {
		let server = MockServer::start();

		server.mock(|when, then| {
			when.method(GET).path(config_path());
			then.status(200).body(CONFIG_BODY);
		});

		let client = test_client_builder(&server.base_url(), "test_app")
			.build()
			.expect("Client should build.");
		let mut keys = client.keys().expect("Keys should load the configuration.");

		keys.sort_unstable();

		assert_eq!(keys, ["features", "server", "spring"]);
		assert_eq!(client.get_keys().expect("Alias should match."), client.keys().expect("Keys."));
		assert_eq!(
			client.get_attribute("spring.cloud.consul.host").expect("Lookup should succeed."),
			Some(&json!("discovery"))
		);
		assert_eq!(
			client.get("spring.cloud.consul.host").expect("Alias lookup should succeed."),
			Some(&json!("discovery"))
		);
		assert_eq!(client.get("spring.cloud.vault.host").expect("Lookup should succeed."), None);
		assert_eq!(
			client.get_as::<u16>("server.port").expect("Decode should succeed."),
			Some(8080)
		);
		assert_eq!(
			client.get_as::<Vec<String>>("features").expect("Decode should succeed."),
			Some(vec!["billing".to_owned(), "search".to_owned()])
		);
		assert!(matches!(
			client.get_as::<u16>("spring.cloud.consul.host"),
			Err(Error::Decode { .. })
		));
	}

	#[test]
	fn oauth2_token_is_attached_to_requests() {
		let server = MockServer::start();
		let token_mock = server.mock(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		});
		let config_mock = server.mock(|when, then| {
			when.method(GET)
				.path(config_path())
				.header("authorization", "Bearer eyJz93a...k4laUWw")
				.header("x-client-id", "test-client");
			then.status(200).body(CONFIG_BODY);
		});
		let client = test_client_builder(&server.base_url(), "test_app")
			.oauth2(OAuth2Credentials::new(
				server.url("/oauth/token"),
				"p-config-server-example-client-id",
				"EXAMPLE_SECRET",
			))
			.build()
			.expect("Client should build after the token exchange.");

		assert!(client.is_authenticated());
		assert!(!client.token_expired());

		let options = RequestOptions::default()
			.with_verify(false)
			.with_header(
				HeaderName::from_static("x-client-id"),
				HeaderValue::from_static("test-client"),
			);

		client.get_config(&options).expect("Authenticated fetch should succeed.");

		token_mock.assert_calls(1);
		config_mock.assert();
	}

	#[test]
	fn caller_authorization_header_wins() {
		let server = MockServer::start();

		server.mock(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		});

		let config_mock = server.mock(|when, then| {
			when.method(GET).path(config_path()).header("authorization", "Bearer caller-token");
			then.status(200).body(CONFIG_BODY);
		});
		let client = test_client_builder(&server.base_url(), "test_app")
			.oauth2(OAuth2Credentials::new(server.url("/oauth/token"), "client", "secret"))
			.build()
			.expect("Client should build after the token exchange.");
		let options = RequestOptions::default()
			.with_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer caller-token"));

		client.get_config(&options).expect("Fetch with caller Authorization should succeed.");

		config_mock.assert();
	}

	#[test]
	fn reauthenticate_replaces_token() {
		let server = MockServer::start();
		let token_mock = server.mock(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		});
		let client = test_client_builder(&server.base_url(), "test_app")
			.oauth2(OAuth2Credentials::new(server.url("/oauth/token"), "client", "secret"))
			.build()
			.expect("Client should build after the token exchange.");

		assert!(client.reauthenticate().expect("Second exchange should succeed."));

		token_mock.assert_calls(2);

		let anonymous = test_client_builder(&server.base_url(), "test_app")
			.build()
			.expect("Client should build without OAuth2.");

		assert!(!anonymous.reauthenticate().expect("No-op without OAuth2."));
	}

	#[test]
	fn failed_token_exchange_fails_construction() {
		let server = MockServer::start();

		server.mock(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(401)
				.header("content-type", "application/json")
				.body(r#"{"error":"invalid_client"}"#);
		});

		let err = test_client_builder(&server.base_url(), "test_app")
			.oauth2(OAuth2Credentials::new(server.url("/oauth/token"), "client", "wrong"))
			.build()
			.expect_err("Rejected credentials should fail construction.");

		assert_eq!(err.status(), Some(401));
		assert!(!err.is_fatal());
	}

	#[test]
	fn get_file_and_proxies_map_http_errors() {
		let server = MockServer::start();

		server.mock(|when, then| {
			when.method(GET).path("/test_app/development/master/nginx.conf");
			then.status(404);
		});
		server.mock(|when, then| {
			when.method(POST).path("/encrypt");
			then.status(500);
		});

		let client = test_client_builder(&server.base_url(), "test_app")
			.build()
			.expect("Client should build.");
		let err = client.get_file("nginx.conf").expect_err("HTTP 404 should surface.");

		assert!(matches!(err, Error::RequestFailed { status: Some(404), .. }));
		assert!(!err.is_fatal());

		let err = client.encrypt("my-secret").expect_err("HTTP 500 should surface.");

		assert!(matches!(err, Error::RequestFailed { status: Some(500), .. }));
	}

	#[test]
	fn proxies_surface_transport_failures_as_request_failed() {
		let client = ConfigClient::builder("test_app")
			.address("http://127.0.0.1:1")
			.build()
			.expect("Client should build.");
		let err = client.decrypt("cipher").expect_err("Refused connections should surface.");

		match err {
			Error::RequestFailed { method, url, status: None, source: Some(source) } => {
				assert_eq!(method, crate::http::Method::POST);
				assert_eq!(url, "http://127.0.0.1:1/decrypt");
				assert!(matches!(source, TransportError::Network { .. }));
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}
}
