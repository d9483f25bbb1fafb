//! Construction parameters for [`ConfigClient`](crate::client::ConfigClient).

// self
use crate::{_prelude::*, auth::OAuth2Credentials, error::ConfigError, template::UrlTemplate};

/// Environment variable holding the application name.
pub const ENV_APP_NAME: &str = "APP_NAME";
/// Environment variable holding the active profile.
pub const ENV_PROFILE: &str = "PROFILE";
/// Environment variable holding the repository branch.
pub const ENV_BRANCH: &str = "BRANCH";
/// Environment variable holding the config server address.
pub const ENV_ADDRESS: &str = "CONFIGSERVER_ADDRESS";
/// Environment variable holding a custom URL template.
pub const ENV_CUSTOM_URL: &str = "CONFIGSERVER_CUSTOM_URL";
/// Environment variable holding the fail-fast toggle.
pub const ENV_FAIL_FAST: &str = "CONFIG_FAIL_FAST";

/// Identity, endpoint, and policy settings of a config client.
///
/// Deserializes with every field optional, so the struct can be embedded in a service's
/// own configuration file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
	/// Application name (required, must be non-empty at build time).
	pub app_name: String,
	/// Active profile.
	pub profile: String,
	/// Repository branch or label.
	pub branch: String,
	/// Config server base URL.
	pub address: String,
	/// Configuration URL template.
	pub url: UrlTemplate,
	/// Whether a failed configuration fetch is fatal.
	pub fail_fast: bool,
	/// OAuth2 credentials; `None` sends unauthenticated requests.
	pub oauth2: Option<OAuth2Credentials>,
}
impl ClientSettings {
	/// Default active profile.
	pub const DEFAULT_PROFILE: &'static str = "development";
	/// Default repository branch.
	pub const DEFAULT_BRANCH: &'static str = "master";
	/// Default config server address.
	pub const DEFAULT_ADDRESS: &'static str = "http://localhost:8888";

	/// Creates default settings for `app_name`.
	pub fn new(app_name: impl Into<String>) -> Self {
		Self { app_name: app_name.into(), ..Default::default() }
	}

	/// Reads settings from the process environment, falling back to defaults.
	pub fn from_env() -> Result<Self> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Reads settings through `lookup`, falling back to defaults for absent names.
	pub fn from_lookup<F>(lookup: F) -> Result<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let mut settings = Self::default();

		if let Some(app_name) = lookup(ENV_APP_NAME) {
			settings.app_name = app_name;
		}
		if let Some(profile) = lookup(ENV_PROFILE) {
			settings.profile = profile;
		}
		if let Some(branch) = lookup(ENV_BRANCH) {
			settings.branch = branch;
		}
		if let Some(address) = lookup(ENV_ADDRESS) {
			settings.address = address;
		}
		if let Some(url) = lookup(ENV_CUSTOM_URL) {
			settings.url = UrlTemplate::new(url);
		}
		if let Some(raw) = lookup(ENV_FAIL_FAST) {
			settings.fail_fast = parse_flag(&raw)
				.ok_or(ConfigError::InvalidEnv { name: ENV_FAIL_FAST, value: raw })?;
		}

		Ok(settings)
	}
}
impl Default for ClientSettings {
	fn default() -> Self {
		Self {
			app_name: String::new(),
			profile: Self::DEFAULT_PROFILE.into(),
			branch: Self::DEFAULT_BRANCH.into(),
			address: Self::DEFAULT_ADDRESS.into(),
			url: UrlTemplate::default(),
			fail_fast: true,
			oauth2: None,
		}
	}
}

fn parse_flag(raw: &str) -> Option<bool> {
	match raw.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "t" | "yes" | "y" | "on" => Some(true),
		"0" | "false" | "f" | "no" | "n" | "off" => Some(false),
		_ => None,
	}
}
