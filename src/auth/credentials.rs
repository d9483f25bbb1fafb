//! OAuth2 client credentials attached to a config client.

// self
use crate::{_prelude::*, auth::Secret};

/// How the client authenticates itself at the token endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	#[default]
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}

/// Client-credentials grant settings for a protected config server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth2Credentials {
	/// Token endpoint URI.
	pub access_token_uri: String,
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// OAuth 2.0 client secret.
	pub client_secret: Secret,
	/// Client authentication method used at the token endpoint.
	#[serde(default)]
	pub auth_method: ClientAuthMethod,
}
impl OAuth2Credentials {
	/// Creates credentials that authenticate with HTTP Basic.
	pub fn new(
		access_token_uri: impl Into<String>,
		client_id: impl Into<String>,
		client_secret: impl Into<Secret>,
	) -> Self {
		Self {
			access_token_uri: access_token_uri.into(),
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			auth_method: ClientAuthMethod::default(),
		}
	}

	/// Overrides the client authentication method.
	pub fn with_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.auth_method = method;

		self
	}
}
