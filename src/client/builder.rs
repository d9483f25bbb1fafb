// self
use crate::{
	_prelude::*,
	auth::OAuth2Credentials,
	client::{ClientSettings, ConfigClient},
	error::ConfigError,
	http::{RequestOptions, Transport},
	oauth::TokenProvider,
	template::{Identity, UrlTemplate},
};

/// Builder for [`ConfigClient`] values.
#[derive(Clone)]
pub struct ConfigClientBuilder {
	/// Settings the client will be constructed from.
	pub settings: ClientSettings,
	/// Options applied to the token exchange performed by [`build`](Self::build).
	pub token_options: RequestOptions,
	transport: Option<Arc<dyn Transport>>,
}
impl ConfigClientBuilder {
	/// Creates a builder seeded with default settings for `app_name`.
	pub fn new(app_name: impl Into<String>) -> Self {
		Self::from_settings(ClientSettings::new(app_name))
	}

	/// Creates a builder from existing settings.
	pub fn from_settings(settings: ClientSettings) -> Self {
		Self { settings, token_options: RequestOptions::default(), transport: None }
	}

	/// Sets the active profile.
	pub fn profile(mut self, profile: impl Into<String>) -> Self {
		self.settings.profile = profile.into();

		self
	}

	/// Sets the repository branch.
	pub fn branch(mut self, branch: impl Into<String>) -> Self {
		self.settings.branch = branch.into();

		self
	}

	/// Sets the config server base URL.
	pub fn address(mut self, address: impl Into<String>) -> Self {
		self.settings.address = address.into();

		self
	}

	/// Overrides the configuration URL template.
	pub fn url(mut self, template: impl Into<UrlTemplate>) -> Self {
		self.settings.url = template.into();

		self
	}

	/// Sets the fail-fast policy.
	pub fn fail_fast(mut self, fail_fast: bool) -> Self {
		self.settings.fail_fast = fail_fast;

		self
	}

	/// Enables OAuth2 client-credentials authentication.
	pub fn oauth2(mut self, credentials: OAuth2Credentials) -> Self {
		self.settings.oauth2 = Some(credentials);

		self
	}

	/// Sets the options used for the token exchange.
	pub fn token_options(mut self, options: RequestOptions) -> Self {
		self.token_options = options;

		self
	}

	/// Uses a caller-provided transport instead of the default one.
	pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
		self.transport = Some(transport);

		self
	}

	/// Builds the client, performing the token exchange when OAuth2 is configured.
	///
	/// Token exchange failures are returned to the caller regardless of the fail-fast
	/// policy. No configuration is fetched here.
	pub fn build(self) -> Result<ConfigClient> {
		let Self { settings, token_options, transport } = self;

		if settings.app_name.trim().is_empty() {
			return Err(ConfigError::MissingAppName.into());
		}

		let transport = match transport {
			Some(transport) => transport,
			None => default_transport()?,
		};
		let url = settings.url.resolve(&Identity {
			address: &settings.address,
			branch: &settings.branch,
			profile: &settings.profile,
			app_name: &settings.app_name,
		});
		let (token_provider, token) = match &settings.oauth2 {
			Some(credentials) => {
				let provider = TokenProvider::new(credentials)?;
				let token = provider.acquire_token(transport.as_ref(), &token_options)?;

				(Some(provider), Some(token))
			},
			None => (None, None),
		};

		Ok(ConfigClient::from_parts(settings, url, transport, token_provider, token, token_options))
	}
}
impl Debug for ConfigClientBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ConfigClientBuilder")
			.field("settings", &self.settings)
			.field("token_options", &self.token_options)
			.field("custom_transport", &self.transport.is_some())
			.finish()
	}
}

#[cfg(feature = "reqwest")]
fn default_transport() -> Result<Arc<dyn Transport>> {
	Ok(Arc::new(crate::http::ReqwestTransport::default()))
}

#[cfg(not(feature = "reqwest"))]
fn default_transport() -> Result<Arc<dyn Transport>> {
	Err(ConfigError::MissingTransport.into())
}
