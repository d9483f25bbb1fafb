//! Client-credentials token exchange built on the `oauth2` crate.
//!
//! [`TokenProvider`] drives `oauth2`'s synchronous request path through the client's own
//! [`Transport`], so token requests honor the same pass-through options as every other
//! call and share one HTTP stack.

pub use oauth2;

// std
use std::time::Duration as StdDuration;
// crates.io
use oauth2::{
	AccessToken, AuthType, Client, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, RefreshToken, RequestTokenError, Scope, StandardRevocableToken,
	SyncHttpClient, TokenResponse, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRequestTokenError, BasicRevocationErrorResponse,
		BasicTokenIntrospectionResponse, BasicTokenType,
	},
};
use serde::de::IgnoredAny;
// self
use crate::{
	_prelude::*,
	auth::{BearerToken, ClientAuthMethod, OAuth2Credentials},
	error::{AuthError, ConfigError, TransportError},
	http::{
		HeaderValue, HttpRequest, HttpResponse, RequestOptions, ResponseMetadata,
		ResponseMetadataSlot, Transport, header,
	},
	obs::{self, RequestKind, RequestOutcome, RequestSpan},
};

const JSON_MEDIA_TYPE: &str = "application/json";

type TokenClient<HasTokenUrl> = Client<
	BasicErrorResponse,
	ClientCredentialsTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	HasTokenUrl,
>;

/// Acquires bearer tokens with the client-credentials grant.
#[derive(Clone)]
pub struct TokenProvider {
	oauth_client: TokenClient<EndpointSet>,
	access_token_uri: String,
}
impl TokenProvider {
	/// Validates `credentials` and prepares the token request.
	pub fn new(credentials: &OAuth2Credentials) -> Result<Self> {
		let token_url = TokenUrl::new(credentials.access_token_uri.clone())
			.map_err(|source| ConfigError::InvalidTokenUri { source })?;
		let client_secret = ClientSecret::new(credentials.client_secret.expose().to_owned());
		let mut oauth_client =
			TokenClient::<EndpointNotSet>::new(ClientId::new(credentials.client_id.clone()))
				.set_client_secret(client_secret)
				.set_token_uri(token_url);

		if matches!(credentials.auth_method, ClientAuthMethod::ClientSecretPost) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		Ok(Self { oauth_client, access_token_uri: credentials.access_token_uri.clone() })
	}

	/// Token endpoint URI.
	pub fn access_token_uri(&self) -> &str {
		&self.access_token_uri
	}

	/// Performs one token exchange and returns the resulting bearer token.
	pub fn acquire_token(
		&self,
		transport: &dyn Transport,
		options: &RequestOptions,
	) -> Result<BearerToken> {
		const KIND: RequestKind = RequestKind::Token;

		let _span = RequestSpan::new(KIND, "acquire_token").entered();

		obs::record_request_outcome(KIND, RequestOutcome::Attempt);

		let result = self.exchange(transport, options);

		match &result {
			Ok(_) => obs::record_request_outcome(KIND, RequestOutcome::Success),
			Err(e) => {
				obs::record_request_outcome(KIND, RequestOutcome::Failure);
				obs::log_request_failure(KIND, &self.access_token_uri, e);
			},
		}

		result
	}

	fn exchange(&self, transport: &dyn Transport, options: &RequestOptions) -> Result<BearerToken> {
		let meta = ResponseMetadataSlot::default();
		let handle = TransportHandle { transport, options, slot: meta.clone() };
		let issued_at = OffsetDateTime::now_utc();
		let response = self
			.oauth_client
			.exchange_client_credentials()
			.request(&handle)
			.map_err(|err| map_request_error(meta.take(), err))?;
		let token = BearerToken::new(response.access_token().secret().to_owned(), issued_at)?;

		match response.expires_in() {
			Some(expires_in) => {
				let secs = i64::try_from(expires_in.as_secs()).unwrap_or(i64::MAX);

				Ok(token.with_expires_in(Duration::seconds(secs)))
			},
			None => Ok(token),
		}
	}
}
impl Debug for TokenProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenProvider").field("access_token_uri", &self.access_token_uri).finish()
	}
}

/// Client-credentials token response that only requires `access_token`.
///
/// A missing `token_type` is read as `bearer`; refresh tokens and scopes are not used.
#[derive(Clone, Debug, Deserialize, Serialize)]
struct ClientCredentialsTokenResponse {
	access_token: AccessToken,
	#[serde(default = "bearer_token_type")]
	token_type: BasicTokenType,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	expires_in: Option<u64>,
}
impl TokenResponse for ClientCredentialsTokenResponse {
	type TokenType = BasicTokenType;

	fn access_token(&self) -> &AccessToken {
		&self.access_token
	}

	fn token_type(&self) -> &BasicTokenType {
		&self.token_type
	}

	fn expires_in(&self) -> Option<StdDuration> {
		self.expires_in.map(StdDuration::from_secs)
	}

	fn refresh_token(&self) -> Option<&RefreshToken> {
		None
	}

	fn scopes(&self) -> Option<&Vec<Scope>> {
		None
	}
}

fn bearer_token_type() -> BasicTokenType {
	BasicTokenType::Bearer
}

/// Adapter that lets `oauth2` issue its request through a [`Transport`].
struct TransportHandle<'a> {
	transport: &'a dyn Transport,
	options: &'a RequestOptions,
	slot: ResponseMetadataSlot,
}
impl SyncHttpClient for TransportHandle<'_> {
	type Error = HttpClientError<TransportError>;

	fn call(&self, request: HttpRequest) -> Result<HttpResponse, Self::Error> {
		self.slot.take();

		let mut response = self.transport.execute(request, self.options).map_err(Box::new)?;

		self.slot.store(ResponseMetadata { status: Some(response.status().as_u16()) });
		normalize_json_content_type(&mut response);

		Ok(response)
	}
}

/// Relabels a JSON body served under another media type (often `text/plain`).
///
/// `oauth2` refuses token responses whose `Content-Type` is present and not JSON.
fn normalize_json_content_type(response: &mut HttpResponse) {
	let declared_json = match response.headers().get(header::CONTENT_TYPE) {
		Some(value) => value
			.to_str()
			.is_ok_and(|media_type| media_type.to_ascii_lowercase().starts_with(JSON_MEDIA_TYPE)),
		None => true,
	};

	if declared_json || serde_json::from_slice::<IgnoredAny>(response.body()).is_err() {
		return;
	}

	response
		.headers_mut()
		.insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_MEDIA_TYPE));
}

fn map_request_error(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<TransportError>>,
) -> Error {
	let status = meta.and_then(|value| value.status);

	match err {
		RequestTokenError::ServerResponse(response) => {
			let reason = match response.error_description() {
				Some(description) => description.clone(),
				None => response.error().as_ref().to_owned(),
			};

			AuthError::Rejected { reason, status }.into()
		},
		RequestTokenError::Request(error) => map_transport_error(status, error),
		RequestTokenError::Parse(source, _body) =>
			AuthError::TokenResponseParse { source, status }.into(),
		RequestTokenError::Other(message) => AuthError::TokenEndpoint { message, status }.into(),
	}
}

fn map_transport_error(status: Option<u16>, err: HttpClientError<TransportError>) -> Error {
	match err {
		HttpClientError::Reqwest(inner) => (*inner).into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => AuthError::TokenEndpoint { message, status }.into(),
		_ => AuthError::TokenEndpoint {
			message: "HTTP client error occurred while calling the token endpoint".into(),
			status,
		}
		.into(),
	}
}
