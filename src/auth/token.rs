//! Bearer token issued by the client-credentials exchange.

// self
use crate::{
	_prelude::*,
	auth::Secret,
	error::AuthError,
	http::HeaderValue,
};

/// Access token plus the ready-to-send `Authorization` header value.
///
/// The token is acquired once per client; `expires_at` is only tracked when the token
/// endpoint reports `expires_in`, and nothing refreshes it automatically.
#[derive(Clone)]
pub struct BearerToken {
	access_token: Secret,
	authorization: HeaderValue,
	issued_at: OffsetDateTime,
	expires_at: Option<OffsetDateTime>,
}
impl BearerToken {
	/// Wraps an access token issued at `issued_at`.
	pub fn new(access_token: impl Into<String>, issued_at: OffsetDateTime) -> Result<Self> {
		let access_token = Secret::new(access_token);
		let mut authorization = HeaderValue::try_from(format!("Bearer {}", access_token.expose()))
			.map_err(|_| AuthError::MalformedToken)?;

		authorization.set_sensitive(true);

		Ok(Self { access_token, authorization, issued_at, expires_at: None })
	}

	/// Records the lifetime reported by the token endpoint.
	///
	/// Lifetimes that overflow the calendar are treated as non-expiring.
	pub fn with_expires_in(mut self, expires_in: Duration) -> Self {
		self.expires_at = self.issued_at.checked_add(expires_in);

		self
	}

	/// Raw access token.
	pub fn access_token(&self) -> &Secret {
		&self.access_token
	}

	/// `Authorization` header value (`Bearer <token>`), flagged as sensitive.
	pub fn authorization(&self) -> &HeaderValue {
		&self.authorization
	}

	/// Instant the token was received.
	pub fn issued_at(&self) -> OffsetDateTime {
		self.issued_at
	}

	/// Expiry instant, when the token endpoint reported one.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.expires_at
	}

	/// Returns `true` if the token has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| instant >= expires_at)
	}

	/// Returns `true` if the token is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}
}
impl Debug for BearerToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BearerToken")
			.field("access_token", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
