//! Optional observability helpers for config-server requests.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `spring_config_client.request` with the
//!   `kind` (request family) and `stage` (call site) fields, plus `warn!` events for failed
//!   requests and `error!` events for fatal configuration failures.
//! - Enable `metrics` to increment the `spring_config_client_request_total` counter for every
//!   attempt/success/failure, labeled by `kind` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Request families issued by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestKind {
	/// OAuth2 client-credentials token exchange.
	Token,
	/// Configuration document fetch.
	Config,
	/// Raw file fetch.
	File,
	/// Encrypt proxy call.
	Encrypt,
	/// Decrypt proxy call.
	Decrypt,
}
impl RequestKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestKind::Token => "token",
			RequestKind::Config => "config",
			RequestKind::File => "file",
			RequestKind::Encrypt => "encrypt",
			RequestKind::Decrypt => "decrypt",
		}
	}
}
impl Display for RequestKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
	/// Request about to be sent.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl RequestOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestOutcome::Attempt => "attempt",
			RequestOutcome::Success => "success",
			RequestOutcome::Failure => "failure",
		}
	}
}
impl Display for RequestOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
