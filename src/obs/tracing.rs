// self
use crate::{_prelude::*, obs::RequestKind};

/// A span builder used around outbound requests.
#[derive(Clone, Debug)]
pub struct RequestSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RequestSpan {
	/// Creates a new span tagged with the provided request kind + stage.
	pub fn new(kind: RequestKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("spring_config_client.request", kind = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Enters the span for the duration of the returned guard.
	pub fn entered(self) -> RequestSpanGuard {
		#[cfg(feature = "tracing")]
		{
			RequestSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			RequestSpanGuard {}
		}
	}
}

/// RAII guard returned by [`RequestSpan::entered`].
pub struct RequestSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for RequestSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("RequestSpanGuard(..)")
	}
}

/// Emits a warning for a failed request (when tracing is enabled).
pub fn log_request_failure(kind: RequestKind, url: &str, error: &dyn StdError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(kind = kind.as_str(), url, error = %error, "Config server request failed.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, url, error);
	}
}

/// Emits an error event for a fatal configuration failure (when tracing is enabled).
pub fn log_fatal(error: &dyn StdError) {
	#[cfg(feature = "tracing")]
	{
		tracing::error!(error = %error, "Configuration is unavailable; terminating.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = error;
	}
}

/// Emits a warning when a request is about to carry an expired bearer token.
pub fn warn_expired_token(expires_at: OffsetDateTime) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(%expires_at, "Bearer token has expired; call `reauthenticate` to renew it.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = expires_at;
	}
}
