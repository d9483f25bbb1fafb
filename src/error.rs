//! Client-level error types shared across configuration fetches, proxies, and token exchanges.

// self
use crate::{_prelude::*, http::Method, obs};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Process exit code used by [`exit_on_fatal`].
pub const FATAL_EXIT_CODE: i32 = 1;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Configuration fetch failed while fail-fast is enabled.
	///
	/// The client cannot start without its configuration; hand the error to
	/// [`exit_on_fatal`] (or an equivalent top-level handler) to terminate.
	#[error("Configuration fetch from {url} failed and fail-fast is enabled.")]
	Fatal {
		/// Resolved configuration URL.
		url: String,
		/// Underlying fetch failure.
		#[source]
		source: FetchError,
	},
	/// Configuration fetch failed while fail-fast is disabled.
	#[error("Could not retrieve configuration from {url}.")]
	Connection {
		/// Resolved configuration URL.
		url: String,
		/// Underlying fetch failure.
		#[source]
		source: FetchError,
	},
	/// A caller-initiated request (file, encrypt, decrypt) failed.
	#[error("{method} request to {url} failed: {}.", status_label(.status))]
	RequestFailed {
		/// HTTP method of the failed request.
		method: Method,
		/// Target URL.
		url: String,
		/// HTTP status code, when the server answered.
		status: Option<u16>,
		/// Transport failure, when the server could not be reached.
		#[source]
		source: Option<TransportError>,
	},
	/// A configuration value could not be decoded into the requested type.
	#[error("Configuration value at `{path}` has an unexpected shape.")]
	Decode {
		/// Dotted path that was looked up.
		path: String,
		/// Structured decoding failure.
		#[source]
		source: serde_json::Error,
	},
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token exchange failure.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
}
impl Error {
	/// Returns `true` when the error must terminate the process under the fail-fast policy.
	pub fn is_fatal(&self) -> bool {
		matches!(self, Self::Fatal { .. })
	}

	/// HTTP status code attached to the failure, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Fatal { source, .. } | Self::Connection { source, .. } => source.status(),
			Self::RequestFailed { status, .. } => *status,
			Self::Auth(e) => e.status(),
			_ => None,
		}
	}
}

/// Reasons a configuration fetch can fail.
#[derive(Debug, ThisError)]
pub enum FetchError {
	/// Config server answered with a non-success status.
	#[error("Config server responded with HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
	},
	/// Config server could not be reached.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body is not a JSON object.
	#[error("Config server returned a malformed JSON document.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Response body continues past the JSON document.
	#[error("Config server returned trailing data after the JSON document.")]
	TrailingData {
		/// Parser failure reported at the first trailing byte.
		#[source]
		source: serde_json::Error,
	},
	/// The resolved URL could not be turned into a request.
	#[error("Configuration request could not be built.")]
	InvalidRequest(#[from] oauth2::http::Error),
}
impl FetchError {
	/// HTTP status code attached to the failure, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status } => Some(*status),
			_ => None,
		}
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Application name is empty.
	#[error("Application name must not be empty.")]
	MissingAppName,
	/// No transport is available.
	#[error("No transport configured; enable the `reqwest` feature or supply one explicitly.")]
	MissingTransport,
	/// OAuth2 access token URI cannot be parsed.
	#[error("Access token URI is invalid.")]
	InvalidTokenUri {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Environment variable holds a value that cannot be interpreted.
	#[error("Environment variable `{name}` has an invalid value: {value}.")]
	InvalidEnv {
		/// Variable name.
		name: &'static str,
		/// Raw value.
		value: String,
	},
}

/// OAuth2 client-credentials exchange failures.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// Token endpoint rejected the credentials with an OAuth error response.
	#[error("Token endpoint rejected the client credentials: {reason}.")]
	Rejected {
		/// Provider-supplied reason string.
		reason: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint returned an unexpected response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint responded with malformed JSON.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Access token contains bytes that cannot travel in an HTTP header.
	#[error("Access token cannot be used as an Authorization header value.")]
	MalformedToken,
}
impl AuthError {
	/// HTTP status code attached to the failure, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Rejected { status, .. }
			| Self::TokenEndpoint { status, .. }
			| Self::TokenResponseParse { status, .. } => *status,
			Self::MalformedToken => None,
		}
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the config server.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request exceeded the caller-supplied timeout.
	#[error("Request to the config server timed out.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the config server.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}

/// Top-level fail-fast handler.
///
/// Terminates the process with [`FATAL_EXIT_CODE`] when `result` carries a fatal
/// configuration failure and returns every other outcome untouched. Library code never
/// calls this on its own.
pub fn exit_on_fatal<T>(result: Result<T>) -> Result<T> {
	match result {
		Err(e) if e.is_fatal() => {
			obs::log_fatal(&e);

			std::process::exit(FATAL_EXIT_CODE)
		},
		other => other,
	}
}

fn status_label(status: &Option<u16>) -> String {
	match status {
		Some(code) => format!("HTTP {code}"),
		None => "no response".into(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn fatal_and_connection_expose_fetch_status() {
		let fatal = Error::Fatal {
			url: "http://localhost:8888/master/development-demo.json".into(),
			source: FetchError::Status { status: 503 },
		};
		let connection = Error::Connection {
			url: "http://localhost:8888/master/development-demo.json".into(),
			source: FetchError::Status { status: 404 },
		};

		assert!(fatal.is_fatal());
		assert!(!connection.is_fatal());
		assert_eq!(fatal.status(), Some(503));
		assert_eq!(connection.status(), Some(404));

		let source =
			StdError::source(&fatal).expect("Fatal errors should expose the fetch failure.");

		assert_eq!(source.to_string(), "Config server responded with HTTP 503.");
	}

	#[test]
	fn request_failed_message_mentions_status() {
		let err = Error::RequestFailed {
			method: Method::POST,
			url: "http://localhost:8888/encrypt".into(),
			status: Some(500),
			source: None,
		};

		assert_eq!(
			err.to_string(),
			"POST request to http://localhost:8888/encrypt failed: HTTP 500."
		);

		let err = Error::RequestFailed {
			method: Method::GET,
			url: "http://localhost:8888/demo/development/master/nginx.conf".into(),
			status: None,
			source: Some(TransportError::Io(std::io::Error::other("connection reset"))),
		};

		assert!(err.to_string().ends_with("failed: no response."));
		assert!(StdError::source(&err).is_some());
	}

	#[test]
	fn exit_on_fatal_passes_recoverable_errors_through() {
		let result: Result<()> = Err(ConfigError::MissingAppName.into());
		let handled = exit_on_fatal(result);

		assert!(matches!(handled, Err(Error::Config(ConfigError::MissingAppName))));
		assert_eq!(exit_on_fatal(Ok(7)).expect("Ok values should pass through."), 7);
	}
}
